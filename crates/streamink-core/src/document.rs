//! Document backend seam.
//!
//! A backend owns the parsed document (a PDF engine, a whiteboard, a screen
//! capture) and answers page queries; this crate never sees its format.

use kurbo::Rect;
use thiserror::Error;

/// Errors reported by a document backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Unsupported document: {0}")]
    Unsupported(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A straight-alpha RGBA8 raster of a page region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, four bytes per pixel.
    pub rgba: Vec<u8>,
}

impl PageImage {
    /// An image filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            rgba: rgba.repeat(pixels),
        }
    }
}

/// Page-level access to a loaded document.
pub trait DocumentBackend {
    fn page_count(&self) -> usize;

    /// Size of page `page` in backend units; only the aspect ratio is used.
    fn page_bounds(&self, page: usize) -> Option<Rect>;

    /// Extracted text of page `page`.
    fn page_text(&self, page: usize) -> Option<String>;

    /// Rasterize `view_rect` (page coordinates, page width 1) of page `page`
    /// into a `width` x `height` image. `dirty` is the sub-region that must
    /// be accurate; backends may ignore it.
    fn render_page(&self, page: usize, view_rect: Rect, dirty: Rect, width: u32, height: u32) -> Option<PageImage>;
}

/// A backend of empty pages in a single color, used for whiteboards.
#[derive(Debug, Clone)]
pub struct BlankDocument {
    pages: usize,
    size: Rect,
    color: [u8; 4],
}

impl BlankDocument {
    pub fn new(pages: usize, width: f64, height: f64) -> Self {
        Self {
            pages,
            size: Rect::new(0.0, 0.0, width, height),
            color: [255, 255, 255, 255],
        }
    }

    /// Paint pages in `rgba` instead of white.
    pub fn with_color(mut self, rgba: [u8; 4]) -> Self {
        self.color = rgba;
        self
    }
}

impl DocumentBackend for BlankDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_bounds(&self, page: usize) -> Option<Rect> {
        (page < self.pages).then_some(self.size)
    }

    fn page_text(&self, page: usize) -> Option<String> {
        (page < self.pages).then(String::new)
    }

    fn render_page(&self, page: usize, _view_rect: Rect, _dirty: Rect, width: u32, height: u32) -> Option<PageImage> {
        (page < self.pages).then(|| PageImage::filled(width, height, self.color))
    }
}
