//! Shape definitions for annotated pages.
//!
//! Coordinates are page coordinates: the page is one unit wide and its height
//! follows the document's aspect ratio.

mod arrow;
mod ellipse;
mod line;
mod rectangle;
mod stroke;
mod text;
mod zoom;

pub use arrow::Arrow;
pub use ellipse::Ellipse;
pub use line::{Line, constrain_to_45};
pub use rectangle::Rectangle;
pub use stroke::{Stroke, StrokeKind};
pub use text::{Latex, Text, TextFont, TextHighlight};
pub use zoom::ZoomPreview;

use kurbo::{Affine, Point, Rect};
use peniko::Color;
use serde::{Deserialize, Serialize};

/// Producer-assigned shape identity, stable across the shape's lifetime.
pub type ShapeHandle = i32;

/// RGBA8 color as carried on the wire (`0xRRGGBBAA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }

    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Unpack from the wire representation.
    pub fn from_i32(value: i32) -> Self {
        let [r, g, b, a] = value.to_be_bytes();
        Self { r, g, b, a }
    }

    /// Pack into the wire representation.
    pub fn to_i32(self) -> i32 {
        i32::from_be_bytes([self.r, self.g, self.b, self.a])
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Paint properties of a shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub color: Rgba,
    /// Stroke width in page units.
    pub width: f64,
}

impl Brush {
    pub fn new(color: Rgba, width: f64) -> Self {
        Self { color, width }
    }

    /// Get the color as a peniko Color.
    pub fn color(&self) -> Color {
        self.color.into()
    }
}

impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Rgba::black(),
            width: 0.003,
        }
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = kurbo::Vec2::new(b.x - a.x, b.y - a.y);
    let pv = kurbo::Vec2::new(point.x - a.x, point.y - a.y);
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON * f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = Point::new(a.x + t * seg.x, a.y + t * seg.y);
    ((point.x - proj.x).powi(2) + (point.y - proj.y).powi(2)).sqrt()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => point.distance(*only),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Normalized rectangle spanned by two corner points.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Common trait for all shapes.
pub trait ShapeTrait {
    /// Get the shape handle.
    fn handle(&self) -> ShapeHandle;

    /// Get the geometric bounding box in page coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in page coordinates) hits this shape.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Get the brush.
    fn brush(&self) -> &Brush;

    /// Get mutable brush.
    fn brush_mut(&mut self) -> &mut Brush;

    /// Apply a transform to this shape.
    fn transform(&mut self, affine: Affine);
}

/// Enum wrapper for all shape types.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Stroke(Stroke),
    Line(Line),
    Arrow(Arrow),
    Rectangle(Rectangle),
    Ellipse(Ellipse),
    Text(Text),
    TextHighlight(TextHighlight),
    Latex(Latex),
    ZoomPreview(ZoomPreview),
}

impl Shape {
    fn as_trait(&self) -> &dyn ShapeTrait {
        match self {
            Shape::Stroke(s) => s,
            Shape::Line(s) => s,
            Shape::Arrow(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Text(s) => s,
            Shape::TextHighlight(s) => s,
            Shape::Latex(s) => s,
            Shape::ZoomPreview(s) => s,
        }
    }

    fn as_trait_mut(&mut self) -> &mut dyn ShapeTrait {
        match self {
            Shape::Stroke(s) => s,
            Shape::Line(s) => s,
            Shape::Arrow(s) => s,
            Shape::Rectangle(s) => s,
            Shape::Ellipse(s) => s,
            Shape::Text(s) => s,
            Shape::TextHighlight(s) => s,
            Shape::Latex(s) => s,
            Shape::ZoomPreview(s) => s,
        }
    }

    pub fn handle(&self) -> ShapeHandle {
        self.as_trait().handle()
    }

    pub fn bounds(&self) -> Rect {
        self.as_trait().bounds()
    }

    /// Bounds grown by half the stroke width: the area painting may touch.
    pub fn dirty_bounds(&self) -> Rect {
        let half = self.brush().width / 2.0;
        self.bounds().inflate(half, half)
    }

    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.as_trait().hit_test(point, tolerance)
    }

    pub fn brush(&self) -> &Brush {
        self.as_trait().brush()
    }

    pub fn brush_mut(&mut self) -> &mut Brush {
        self.as_trait_mut().brush_mut()
    }

    pub fn transform(&mut self, affine: Affine) {
        self.as_trait_mut().transform(affine)
    }

    /// Transient shapes live only for the duration of a gesture and are
    /// never part of the settled page state.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Shape::Stroke(Stroke {
                kind: StrokeKind::Pointer,
                ..
            }) | Shape::ZoomPreview(_)
        )
    }

    /// Short type name for logs and errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Shape::Stroke(s) => s.kind.name(),
            Shape::Line(_) => "line",
            Shape::Arrow(_) => "arrow",
            Shape::Rectangle(_) => "rectangle",
            Shape::Ellipse(_) => "ellipse",
            Shape::Text(_) => "text",
            Shape::TextHighlight(_) => "text-highlight",
            Shape::Latex(_) => "latex",
            Shape::ZoomPreview(_) => "zoom-preview",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_wire_roundtrip() {
        let color = Rgba::new(0x12, 0x34, 0x56, 0x78);
        assert_eq!(color.to_i32(), 0x1234_5678);
        assert_eq!(Rgba::from_i32(color.to_i32()), color);
        let red = Rgba::new(255, 0, 0, 255);
        assert_eq!(Rgba::from_i32(red.to_i32()), red);
    }

    #[test]
    fn test_peniko_conversion() {
        let color = Rgba::new(10, 20, 30, 255);
        let peniko: Color = color.into();
        assert_eq!(Rgba::from(peniko), color);
    }

    #[test]
    fn test_polyline_distance() {
        let points = [Point::new(0.0, 0.0), Point::new(1.0, 0.0)];
        assert!((point_to_polyline_dist(Point::new(0.5, 0.2), &points) - 0.2).abs() < 1e-12);
        assert!(point_to_polyline_dist(Point::new(0.5, 0.2), &[]).is_infinite());
        let single = [Point::new(0.0, 0.0)];
        assert!((point_to_polyline_dist(Point::new(0.3, 0.4), &single) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_transient_shapes() {
        let pointer = Shape::Stroke(Stroke::new(1, StrokeKind::Pointer, Brush::default()));
        let pen = Shape::Stroke(Stroke::new(2, StrokeKind::Pen, Brush::default()));
        assert!(pointer.is_transient());
        assert!(!pen.is_transient());
    }

    #[test]
    fn test_dirty_bounds_include_stroke() {
        let line = Shape::Line(Line::new(
            1,
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Brush::new(Rgba::black(), 0.2),
        ));
        let dirty = line.dirty_bounds();
        assert!((dirty.y0 + 0.1).abs() < 1e-12);
        assert!((dirty.x1 - 1.1).abs() < 1e-12);
    }
}
