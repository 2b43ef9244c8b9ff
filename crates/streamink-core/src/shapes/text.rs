//! Text, LaTeX and text-highlight shapes.

use super::{Brush, Rgba, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

/// Font settings of a text or LaTeX shape.
#[derive(Debug, Clone, PartialEq)]
pub struct TextFont {
    pub family: String,
    /// Font size in page units.
    pub size: f64,
    pub bold: bool,
    pub italic: bool,
}

impl TextFont {
    /// Default font size in page units.
    pub const DEFAULT_SIZE: f64 = 0.025;

    const BOLD: i8 = 0x1;
    const ITALIC: i8 = 0x2;

    /// Pack bold/italic into the wire flag byte.
    pub fn flags(&self) -> i8 {
        let mut flags = 0;
        if self.bold {
            flags |= Self::BOLD;
        }
        if self.italic {
            flags |= Self::ITALIC;
        }
        flags
    }

    pub fn set_flags(&mut self, flags: i8) {
        self.bold = flags & Self::BOLD != 0;
        self.italic = flags & Self::ITALIC != 0;
    }

    /// Average glyph advance relative to the font size.
    pub fn char_width_factor(&self) -> f64 {
        if self.bold { 0.6 } else { 0.55 }
    }
}

impl Default for TextFont {
    fn default() -> Self {
        Self {
            family: "Sans".to_string(),
            size: Self::DEFAULT_SIZE,
            bold: false,
            italic: false,
        }
    }
}

/// Approximate layout box of `content` set in `font` at `position`.
///
/// Exact metrics depend on the document backend's fonts; this estimate is
/// only used for hit testing and dirty regions.
fn approximate_bounds(position: Point, content: &str, font: &TextFont) -> Rect {
    let max_line_len = content.lines().map(|l| l.chars().count()).max().unwrap_or(0);
    let line_count = content.lines().count().max(1);
    let width = max_line_len as f64 * font.size * font.char_width_factor();
    let height = line_count as f64 * font.size * 1.2;
    Rect::new(position.x, position.y, position.x + width, position.y + height)
}

/// A plain text box.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    handle: ShapeHandle,
    /// Top-left corner.
    pub position: Point,
    pub content: String,
    pub font: TextFont,
    /// Text color lives in the brush; width is unused.
    pub brush: Brush,
}

impl Text {
    pub fn new(handle: ShapeHandle, position: Point) -> Self {
        Self {
            handle,
            position,
            content: String::new(),
            font: TextFont::default(),
            brush: Brush::new(Rgba::black(), 0.0),
        }
    }

    /// Set the text content.
    pub fn set_content(&mut self, content: String) {
        self.content = content;
    }
}

impl ShapeTrait for Text {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        approximate_bounds(self.position, &self.content, &self.font)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
    }
}

/// A LaTeX formula; typeset by the host, positioned like text.
#[derive(Debug, Clone, PartialEq)]
pub struct Latex {
    handle: ShapeHandle,
    pub position: Point,
    pub source: String,
    pub font: TextFont,
    pub brush: Brush,
}

impl Latex {
    pub fn new(handle: ShapeHandle, position: Point) -> Self {
        Self {
            handle,
            position,
            source: String::new(),
            font: TextFont::default(),
            brush: Brush::new(Rgba::black(), 0.0),
        }
    }
}

impl ShapeTrait for Latex {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        approximate_bounds(self.position, &self.source, &self.font)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        self.position = affine * self.position;
    }
}

/// Highlighted runs of document text, one rect per run.
#[derive(Debug, Clone, PartialEq)]
pub struct TextHighlight {
    handle: ShapeHandle,
    pub rects: Vec<Rect>,
    pub brush: Brush,
}

impl TextHighlight {
    pub fn new(handle: ShapeHandle, color: Rgba, rects: Vec<Rect>) -> Self {
        Self {
            handle,
            rects,
            brush: Brush::new(color, 0.0),
        }
    }
}

impl ShapeTrait for TextHighlight {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        self.rects
            .iter()
            .copied()
            .reduce(|a, b| a.union(b))
            .unwrap_or(Rect::ZERO)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.rects
            .iter()
            .any(|r| r.inflate(tolerance, tolerance).contains(point))
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        for rect in &mut self.rects {
            let p0 = affine * Point::new(rect.x0, rect.y0);
            let p1 = affine * Point::new(rect.x1, rect.y1);
            *rect = super::rect_from_corners(p0, p1);
        }
    }
}
