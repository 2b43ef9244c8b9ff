//! CPU render surface over an `image::RgbaImage`.
//!
//! Rasterization is deliberately simple and deterministic: no antialiasing,
//! pixel centers decide coverage, and every shape is first collected into a
//! coverage mask and then blended once. Overlapping segments of a
//! translucent stroke therefore do not darken each other. A mask holds only
//! the pixels a shape touches, so drawing costs scale with the shape.

use crate::renderer::{RenderResult, RenderSurface, RendererError};
use image::RgbaImage;
use kurbo::{Affine, Point, Rect};
use std::path::Path;
use streamink_core::document::PageImage;
use streamink_core::shapes::{Rgba, Shape, TextFont, point_to_segment_dist};

/// Ellipse outlines are flattened to this many segments.
const ELLIPSE_SEGMENTS: usize = 64;

/// Thinnest stroke that still covers a pixel, in device pixels.
const MIN_HALF_WIDTH: f64 = 0.5;

/// Software surface used for snapshots, tests and headless export.
#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    transform: Affine,
}

impl RasterSurface {
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        if width == 0 || height == 0 {
            return Err(RendererError::InvalidSize { width, height });
        }
        Ok(Self {
            image: RgbaImage::new(width, height),
            transform: Affine::IDENTITY,
        })
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    /// RGBA of the device pixel at (`x`, `y`).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Export the surface as a PNG file.
    pub fn save_png(&self, path: &Path) -> RenderResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        log::debug!("Saved {}x{} frame to {}", self.image.width(), self.image.height(), path.display());
        Ok(())
    }

    /// Device pixels per page unit.
    fn scale(&self) -> f64 {
        self.transform.determinant().abs().sqrt()
    }

    fn to_device(&self, point: Point) -> Point {
        self.transform * point
    }

    fn blend_pixel(&mut self, x: u32, y: u32, color: [u8; 4]) {
        let pixel = self.image.get_pixel_mut(x, y);
        pixel.0 = blend(color, pixel.0);
    }

    fn apply_mask(&mut self, mask: Mask, color: Rgba) {
        if color.a == 0 {
            return;
        }
        let rgba = [color.r, color.g, color.b, color.a];
        let width = mask.width as usize;
        for index in mask.into_covered() {
            self.blend_pixel((index % width) as u32, (index / width) as u32, rgba);
        }
    }

    /// Mark a polyline; `half_widths` gives the device half width at each vertex.
    fn mark_polyline(&self, mask: &mut Mask, points: &[Point], half_widths: impl Fn(usize) -> f64, closed: bool) {
        let device: Vec<Point> = points.iter().map(|p| self.to_device(*p)).collect();
        match device.as_slice() {
            [] => {}
            [only] => mask.mark_segment(*only, *only, half_widths(0)),
            _ => {
                for (i, pair) in device.windows(2).enumerate() {
                    let hw = (half_widths(i) + half_widths(i + 1)) / 2.0;
                    mask.mark_segment(pair[0], pair[1], hw);
                }
                if closed {
                    mask.mark_segment(device[device.len() - 1], device[0], half_widths(0));
                }
            }
        }
    }

    /// Greeked glyph blocks, one per visible character.
    fn mark_text(&self, mask: &mut Mask, position: Point, content: &str, font: &TextFont) {
        let advance = font.size * font.char_width_factor();
        for (row, line) in content.lines().enumerate() {
            let y0 = position.y + row as f64 * font.size * 1.2 + font.size * 0.2;
            for (col, ch) in line.chars().enumerate() {
                if ch.is_whitespace() {
                    continue;
                }
                let x0 = position.x + col as f64 * advance;
                let glyph = Rect::new(x0, y0, x0 + advance * 0.8, y0 + font.size * 0.8);
                mask.mark_rect(self.transform.transform_rect_bbox(glyph));
            }
        }
    }

    fn shape_mask(&self, shape: &Shape) -> Mask {
        let (width, height) = self.size();
        let mut mask = Mask::new(width, height);
        let half = |w: f64| (w * self.scale() / 2.0).max(MIN_HALF_WIDTH);
        let brush_hw = half(shape.brush().width);

        match shape {
            Shape::Stroke(stroke) => {
                let pressure = |i: usize| match stroke.pressures.get(i) {
                    Some(p) if *p > 0.0 => *p,
                    _ => 1.0,
                };
                self.mark_polyline(&mut mask, &stroke.points, |i| half(stroke.brush.width * pressure(i)), false);
            }
            Shape::Line(line) => {
                self.mark_polyline(&mut mask, &[line.start, line.end], |_| brush_hw, false);
            }
            Shape::Arrow(arrow) => {
                let (left, right) = arrow.head_points();
                self.mark_polyline(&mut mask, &[arrow.start, arrow.end], |_| brush_hw, false);
                self.mark_polyline(&mut mask, &[left, arrow.end, right], |_| brush_hw, false);
            }
            Shape::Rectangle(rect) => {
                self.mark_polyline(&mut mask, &corners(rect.rect), |_| brush_hw, true);
            }
            Shape::ZoomPreview(zoom) => {
                self.mark_polyline(&mut mask, &corners(zoom.rect), |_| brush_hw, true);
            }
            Shape::Ellipse(ellipse) => {
                self.mark_polyline(&mut mask, &ellipse.outline(ELLIPSE_SEGMENTS), |_| brush_hw, true);
            }
            Shape::Text(text) => self.mark_text(&mut mask, text.position, &text.content, &text.font),
            Shape::Latex(latex) => self.mark_text(&mut mask, latex.position, &latex.source, &latex.font),
            Shape::TextHighlight(highlight) => {
                for rect in &highlight.rects {
                    mask.mark_rect(self.transform.transform_rect_bbox(*rect));
                }
            }
        }
        mask
    }
}

impl RenderSurface for RasterSurface {
    fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            pixel.0 = [0, 0, 0, 0];
        }
    }

    fn fill(&mut self, rect: Rect, color: Rgba) {
        let (width, height) = self.size();
        let mut mask = Mask::new(width, height);
        mask.mark_rect(self.transform.transform_rect_bbox(rect));
        self.apply_mask(mask, color);
    }

    fn draw_image(&mut self, image: &PageImage, dest: Rect) -> RenderResult<()> {
        let expected = image.width as usize * image.height as usize * 4;
        if image.width == 0 || image.height == 0 || image.rgba.len() != expected {
            return Err(RendererError::InvalidImage {
                width: image.width,
                height: image.height,
            });
        }
        let device = self.transform.transform_rect_bbox(dest);
        if device.width() <= 0.0 || device.height() <= 0.0 {
            return Ok(());
        }
        let Some((x0, y0, x1, y1)) = pixel_span(device, self.size()) else {
            return Ok(());
        };
        for y in y0..y1 {
            let v = ((y as f64 + 0.5 - device.y0) / device.height() * image.height as f64) as u32;
            let v = v.min(image.height - 1);
            for x in x0..x1 {
                let u = ((x as f64 + 0.5 - device.x0) / device.width() * image.width as f64) as u32;
                let u = u.min(image.width - 1);
                let offset = (v as usize * image.width as usize + u as usize) * 4;
                let mut src = [0u8; 4];
                src.copy_from_slice(&image.rgba[offset..offset + 4]);
                self.blend_pixel(x, y, src);
            }
        }
        Ok(())
    }

    fn render_shape(&mut self, shape: &Shape) {
        let mask = self.shape_mask(shape);
        let color = shape.brush().color;
        self.apply_mask(mask, color);
    }

    fn render_surface(&mut self, other: &Self) -> RenderResult<()> {
        if self.size() != other.size() {
            return Err(RendererError::SizeMismatch {
                expected: self.size(),
                got: other.size(),
            });
        }
        for (dst, src) in self.image.pixels_mut().zip(other.image.pixels()) {
            dst.0 = blend(src.0, dst.0);
        }
        Ok(())
    }

    fn set_transform(&mut self, transform: Affine) {
        self.transform = transform;
    }

    fn transform(&self) -> Affine {
        self.transform
    }
}

/// Source-over compositing in straight alpha.
fn blend(src: [u8; 4], dst: [u8; 4]) -> [u8; 4] {
    let sa = src[3] as u32;
    let da = dst[3] as u32;
    if sa == 255 || da == 0 {
        return src;
    }
    if sa == 0 {
        return dst;
    }
    // Alpha scaled by 255 to stay in integers.
    let dst_weight = da * (255 - sa);
    let out_a = sa * 255 + dst_weight;
    let mut out = [0u8; 4];
    for c in 0..3 {
        let value = (src[c] as u32 * sa * 255 + dst[c] as u32 * dst_weight + out_a / 2) / out_a;
        out[c] = value.min(255) as u8;
    }
    out[3] = ((out_a + 127) / 255).min(255) as u8;
    out
}

fn corners(rect: Rect) -> [Point; 4] {
    [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ]
}

/// Pixel index range whose centers may fall inside `rect`, clipped to the surface.
fn pixel_span(rect: Rect, (width, height): (u32, u32)) -> Option<(u32, u32, u32, u32)> {
    let clip = |v: f64, max: u32| v.clamp(0.0, max as f64) as u32;
    let x0 = clip((rect.x0 - 0.5).ceil(), width);
    let y0 = clip((rect.y0 - 0.5).ceil(), height);
    let x1 = clip((rect.x1 - 0.5).ceil(), width);
    let y1 = clip((rect.y1 - 0.5).ceil(), height);
    (x0 < x1 && y0 < y1).then_some((x0, y0, x1, y1))
}

/// Per-pixel coverage of one shape: the row-major indices of covered pixels.
///
/// Overlapping marks may repeat an index; [`Mask::into_covered`] collapses
/// them so every pixel is blended at most once.
struct Mask {
    width: u32,
    height: u32,
    covered: Vec<usize>,
}

impl Mask {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            covered: Vec::new(),
        }
    }

    fn set(&mut self, x: u32, y: u32) {
        self.covered.push(y as usize * self.width as usize + x as usize);
    }

    /// Covered pixel indices in row-major order, each once.
    fn into_covered(mut self) -> Vec<usize> {
        self.covered.sort_unstable();
        self.covered.dedup();
        self.covered
    }

    /// Pixels whose centers lie in `rect` (device coordinates).
    fn mark_rect(&mut self, rect: Rect) {
        let Some((x0, y0, x1, y1)) = pixel_span(rect, (self.width, self.height)) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                self.set(x, y);
            }
        }
    }

    /// Pixels whose centers lie within `half_width` of the segment.
    fn mark_segment(&mut self, a: Point, b: Point, half_width: f64) {
        let bounds = Rect::from_points(a, b).inflate(half_width, half_width);
        let Some((x0, y0, x1, y1)) = pixel_span(bounds, (self.width, self.height)) else {
            return;
        };
        for y in y0..y1 {
            for x in x0..x1 {
                let center = Point::new(x as f64 + 0.5, y as f64 + 0.5);
                if point_to_segment_dist(center, a, b) <= half_width {
                    self.set(x, y);
                }
            }
        }
    }
}
