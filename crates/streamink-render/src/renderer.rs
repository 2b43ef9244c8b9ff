//! Render surface abstraction.

use kurbo::{Affine, Rect, Vec2};
use peniko::Color;
use streamink_core::document::PageImage;
use streamink_core::shapes::{Rgba, Shape};
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("Surface size mismatch: expected {expected:?}, got {got:?}")]
    SizeMismatch { expected: (u32, u32), got: (u32, u32) },
    #[error("Image data does not match {width}x{height}")]
    InvalidImage { width: u32, height: u32 },
    #[error("Image export failed: {0}")]
    Export(#[from] image::ImageError),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Options shared by the surfaces of one controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Painted under the document page.
    pub background_color: Color,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            background_color: Color::from_rgba8(255, 255, 255, 255),
        }
    }
}

impl RenderOptions {
    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Device size of a surface with the given logical size.
    pub fn device_size(&self, width: u32, height: u32) -> (u32, u32) {
        let scale = if self.scale_factor > 0.0 { self.scale_factor } else { 1.0 };
        (
            (width as f64 * scale).round() as u32,
            (height as f64 * scale).round() as u32,
        )
    }
}

/// Transform mapping `view` (page coordinates) onto a `width`-pixel-wide
/// surface. Scaling is uniform and driven by the width.
pub fn view_transform(view: Rect, width: u32) -> Affine {
    if view.width() <= 0.0 {
        return Affine::IDENTITY;
    }
    Affine::scale(width as f64 / view.width()) * Affine::translate(Vec2::new(-view.x0, -view.y0))
}

/// A pixel surface that shapes, images and other surfaces are drawn onto.
///
/// Drawing calls take page coordinates and go through the current
/// transform; `size` and `clear` work in device pixels.
pub trait RenderSurface {
    /// Size in device pixels.
    fn size(&self) -> (u32, u32);

    /// Reset every pixel to transparent.
    fn clear(&mut self);

    /// Fill `rect` with `color`.
    fn fill(&mut self, rect: Rect, color: Rgba);

    /// Draw `image` scaled into `dest`.
    fn draw_image(&mut self, image: &PageImage, dest: Rect) -> RenderResult<()>;

    fn render_shape(&mut self, shape: &Shape);

    /// Composite `other` over this surface, pixel for pixel.
    fn render_surface(&mut self, other: &Self) -> RenderResult<()>;

    fn set_transform(&mut self, transform: Affine);

    fn transform(&self) -> Affine;
}
