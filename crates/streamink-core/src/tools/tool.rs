//! Individual tools and their begin/execute/end behavior.

use super::{ToolError, ToolResult};
use crate::action::{BrushSpec, KeyEvent, PenPoint};
use crate::page::{Page, PageError};
use crate::shapes::{
    Arrow, Ellipse, Latex, Line, Rectangle, Rgba, Shape, ShapeHandle, Stroke, StrokeKind, Text, TextFont,
    TextHighlight, ZoomPreview, constrain_to_45,
};
use kurbo::{Point, Rect, Vec2};

/// Hit tolerance of the rubber in page units.
pub const RUBBER_TOLERANCE: f64 = 0.005;

/// Zoom gestures smaller than this in either direction are ignored.
const MIN_ZOOM_EXTENT: f64 = 1e-3;

/// Two-point shape tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    Line,
    Arrow,
    Rectangle,
    Ellipse,
}

/// Single-shot operations run as one begin/execute/end triple.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicOp {
    Undo,
    Redo,
    ClearShapes,
    ZoomOut,
    ExtendView(Rect),
    DeleteShape(ShapeHandle),
    Key(KeyEvent),
    TextMove {
        handle: ShapeHandle,
        position: Point,
    },
    TextRemove(ShapeHandle),
    TextChange {
        handle: ShapeHandle,
        text: String,
    },
    TextFontChange {
        handle: ShapeHandle,
        color: Rgba,
        font: TextFont,
    },
    TextHighlight {
        handle: ShapeHandle,
        color: Rgba,
        rects: Vec<Rect>,
    },
}

/// A selectable tool together with its per-gesture state.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Stroke {
        kind: StrokeKind,
        spec: BrushSpec,
    },
    Geometry {
        kind: GeometryKind,
        spec: BrushSpec,
        anchor: Point,
    },
    Zoom {
        spec: BrushSpec,
        anchor: Point,
    },
    Pan {
        last: Point,
    },
    Rubber {
        snapshotted: bool,
    },
    Text {
        handle: ShapeHandle,
        latex: bool,
    },
    Atomic(AtomicOp),
}

impl Tool {
    pub fn stroke(kind: StrokeKind, spec: BrushSpec) -> Self {
        Tool::Stroke { kind, spec }
    }

    pub fn geometry(kind: GeometryKind, spec: BrushSpec) -> Self {
        Tool::Geometry {
            kind,
            spec,
            anchor: Point::ZERO,
        }
    }

    pub fn zoom(spec: BrushSpec) -> Self {
        Tool::Zoom {
            spec,
            anchor: Point::ZERO,
        }
    }

    pub fn pan() -> Self {
        Tool::Pan { last: Point::ZERO }
    }

    pub fn rubber() -> Self {
        Tool::Rubber { snapshotted: false }
    }

    pub fn is_atomic(&self) -> bool {
        matches!(self, Tool::Atomic(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Stroke { kind, .. } => kind.name(),
            Tool::Geometry { kind, .. } => match kind {
                GeometryKind::Line => "line",
                GeometryKind::Arrow => "arrow",
                GeometryKind::Rectangle => "rectangle",
                GeometryKind::Ellipse => "ellipse",
            },
            Tool::Zoom { .. } => "zoom",
            Tool::Pan { .. } => "pan",
            Tool::Rubber { .. } => "rubber",
            Tool::Text { latex: false, .. } => "text",
            Tool::Text { latex: true, .. } => "latex",
            Tool::Atomic(_) => "atomic",
        }
    }

    pub(super) fn begin(&mut self, point: PenPoint, page: &mut Page, modifiers: &mut KeyEvent) -> ToolResult<()> {
        let p = point.to_point();
        match self {
            Tool::Stroke { kind, spec } => {
                if *kind != StrokeKind::Pointer {
                    page.push_undo();
                }
                let mut stroke = Stroke::new(spec.handle, *kind, spec.brush);
                stroke.add_point(p, point.pressure as f64);
                page.add_shape(Shape::Stroke(stroke))?;
            }
            Tool::Geometry { kind, spec, anchor } => {
                *anchor = p;
                page.push_undo();
                let shape = match kind {
                    GeometryKind::Line => Shape::Line(Line::new(spec.handle, p, p, spec.brush)),
                    GeometryKind::Arrow => Shape::Arrow(Arrow::new(spec.handle, p, p, spec.brush)),
                    GeometryKind::Rectangle => Shape::Rectangle(Rectangle::from_corners(spec.handle, p, p, spec.brush)),
                    GeometryKind::Ellipse => Shape::Ellipse(Ellipse::from_corners(spec.handle, p, p, spec.brush)),
                };
                page.add_shape(shape)?;
            }
            Tool::Zoom { spec, anchor } => {
                *anchor = p;
                page.add_shape(Shape::ZoomPreview(ZoomPreview::new(spec.handle, p, spec.brush)))?;
            }
            Tool::Pan { last } => *last = p,
            Tool::Rubber { snapshotted } => {
                *snapshotted = false;
                erase_at(page, p, snapshotted);
            }
            Tool::Text { handle, latex } => {
                page.push_undo();
                let shape = if *latex {
                    Shape::Latex(Latex::new(*handle, p))
                } else {
                    Shape::Text(Text::new(*handle, p))
                };
                page.add_shape(shape)?;
            }
            Tool::Atomic(op) => run_atomic(op, page, modifiers)?,
        }
        Ok(())
    }

    pub(super) fn execute(&mut self, point: PenPoint, page: &mut Page, modifiers: KeyEvent) -> ToolResult<()> {
        let p = point.to_point();
        match self {
            Tool::Stroke { spec, .. } => append_stroke_point(page, spec.handle, p, point.pressure as f64)?,
            Tool::Geometry { kind, spec, anchor } => update_geometry(page, *kind, spec.handle, *anchor, p, modifiers.shift)?,
            Tool::Zoom { spec, anchor } => {
                let anchor = *anchor;
                page.modify_shape(spec.handle, |shape| match shape {
                    Shape::ZoomPreview(preview) => {
                        preview.set_corners(anchor, p);
                        Ok(())
                    }
                    other => Err(unexpected(spec.handle, "zoom-preview", other)),
                })??;
            }
            Tool::Pan { last } => {
                pan_by(page, *last - p);
                *last = p;
            }
            Tool::Rubber { snapshotted } => erase_at(page, p, snapshotted),
            Tool::Text { .. } | Tool::Atomic(_) => {}
        }
        Ok(())
    }

    pub(super) fn end(&mut self, point: PenPoint, page: &mut Page, modifiers: KeyEvent) -> ToolResult<()> {
        match self {
            Tool::Stroke { kind, spec } => {
                append_stroke_point(page, spec.handle, point.to_point(), point.pressure as f64)?;
                if *kind == StrokeKind::Pointer {
                    page.remove_shape(spec.handle)?;
                }
            }
            Tool::Zoom { spec, anchor } => {
                page.remove_shape(spec.handle)?;
                let rect = fit_aspect(Rect::from_points(*anchor, point.to_point()), page.bounds());
                if rect.width() > MIN_ZOOM_EXTENT && rect.height() > MIN_ZOOM_EXTENT {
                    page.set_slide_rect(rect);
                }
            }
            _ => self.execute(point, page, modifiers)?,
        }
        Ok(())
    }
}

fn unexpected(handle: ShapeHandle, expected: &'static str, found: &Shape) -> ToolError {
    ToolError::Page(PageError::UnexpectedShape {
        handle,
        expected,
        found: found.type_name(),
    })
}

fn append_stroke_point(page: &mut Page, handle: ShapeHandle, point: Point, pressure: f64) -> ToolResult<()> {
    page.modify_shape(handle, |shape| match shape {
        Shape::Stroke(stroke) => {
            stroke.add_point(point, pressure);
            Ok(())
        }
        other => Err(unexpected(handle, "stroke", other)),
    })?
}

fn update_geometry(
    page: &mut Page,
    kind: GeometryKind,
    handle: ShapeHandle,
    anchor: Point,
    point: Point,
    constrain: bool,
) -> ToolResult<()> {
    page.modify_shape(handle, |shape| {
        match (kind, shape) {
            (GeometryKind::Line, Shape::Line(line)) => {
                line.end = if constrain { constrain_to_45(anchor, point) } else { point };
            }
            (GeometryKind::Arrow, Shape::Arrow(arrow)) => {
                arrow.end = if constrain { constrain_to_45(anchor, point) } else { point };
            }
            (GeometryKind::Rectangle, Shape::Rectangle(rect)) => {
                rect.set_corners(anchor, if constrain { square_corner(anchor, point) } else { point });
            }
            (GeometryKind::Ellipse, Shape::Ellipse(ellipse)) => {
                ellipse.set_corners(anchor, if constrain { square_corner(anchor, point) } else { point });
            }
            (_, other) => return Err(unexpected(handle, "geometry", other)),
        }
        Ok(())
    })?
}

/// Move `point` so that it spans a square with `anchor`.
fn square_corner(anchor: Point, point: Point) -> Point {
    let delta = point - anchor;
    let side = delta.x.abs().max(delta.y.abs());
    Point::new(anchor.x + side.copysign(delta.x), anchor.y + side.copysign(delta.y))
}

/// Grow `rect` around its center to the aspect ratio of `bounds`.
fn fit_aspect(rect: Rect, bounds: Rect) -> Rect {
    if rect.width() <= 0.0 || rect.height() <= 0.0 || bounds.width() <= 0.0 {
        return rect;
    }
    let aspect = bounds.height() / bounds.width();
    let (w, h) = if rect.height() / rect.width() < aspect {
        (rect.width(), rect.width() * aspect)
    } else {
        (rect.height() / aspect, rect.height())
    };
    Rect::from_center_size(rect.center(), (w, h))
}

/// Shift the slide rect by `delta`, keeping it inside the page.
fn pan_by(page: &mut Page, delta: Vec2) {
    if !page.is_zoomed() || delta == Vec2::ZERO {
        return;
    }
    let bounds = page.bounds();
    let moved = page.slide_rect() + delta;
    let dx = if moved.x0 < bounds.x0 {
        bounds.x0 - moved.x0
    } else if moved.x1 > bounds.x1 {
        bounds.x1 - moved.x1
    } else {
        0.0
    };
    let dy = if moved.y0 < bounds.y0 {
        bounds.y0 - moved.y0
    } else if moved.y1 > bounds.y1 {
        bounds.y1 - moved.y1
    } else {
        0.0
    };
    let clamped = moved + Vec2::new(dx, dy);
    if clamped != page.slide_rect() {
        page.set_slide_rect(clamped);
    }
}

/// Remove every settled shape under `point`. The first removal of a gesture
/// takes the undo snapshot, so a gesture that hits nothing leaves no undo step.
fn erase_at(page: &mut Page, point: Point, snapshotted: &mut bool) {
    let hits: Vec<ShapeHandle> = page
        .shapes_at_point(point, RUBBER_TOLERANCE)
        .into_iter()
        .filter(|h| page.get_shape(*h).is_some_and(|s| !s.is_transient()))
        .collect();
    if hits.is_empty() {
        return;
    }
    if !*snapshotted {
        page.push_undo();
        *snapshotted = true;
    }
    for handle in hits {
        // Every hit was just looked up, so removal cannot miss.
        let _ = page.remove_shape(handle);
    }
}

fn run_atomic(op: &AtomicOp, page: &mut Page, modifiers: &mut KeyEvent) -> ToolResult<()> {
    match op {
        AtomicOp::Undo => {
            if !page.undo() {
                log::debug!("Nothing to undo on page {}", page.number());
            }
        }
        AtomicOp::Redo => {
            if !page.redo() {
                log::debug!("Nothing to redo on page {}", page.number());
            }
        }
        AtomicOp::ClearShapes => {
            page.push_undo();
            page.clear_shapes();
        }
        AtomicOp::ZoomOut => page.reset_slide_rect(),
        AtomicOp::ExtendView(rect) => {
            if !page.set_slide_rect(*rect) {
                log::warn!("Ignoring view {rect:?} outside page {}", page.number());
            }
        }
        AtomicOp::DeleteShape(handle) | AtomicOp::TextRemove(handle) => {
            if !page.contains(*handle) {
                return Err(PageError::UnknownHandle(*handle).into());
            }
            page.push_undo();
            page.remove_shape(*handle)?;
        }
        AtomicOp::Key(event) => *modifiers = *event,
        AtomicOp::TextMove { handle, position } => {
            let handle = *handle;
            page.modify_shape(handle, |shape| match shape {
                Shape::Text(text) => {
                    text.position = *position;
                    Ok(())
                }
                Shape::Latex(latex) => {
                    latex.position = *position;
                    Ok(())
                }
                other => Err(unexpected(handle, "text", other)),
            })??;
        }
        AtomicOp::TextChange { handle, text } => {
            let handle = *handle;
            page.modify_shape(handle, |shape| match shape {
                Shape::Text(t) => {
                    t.set_content(text.clone());
                    Ok(())
                }
                Shape::Latex(latex) => {
                    latex.source = text.clone();
                    Ok(())
                }
                other => Err(unexpected(handle, "text", other)),
            })??;
        }
        AtomicOp::TextFontChange { handle, color, font } => {
            let handle = *handle;
            page.modify_shape(handle, |shape| match shape {
                Shape::Text(t) => {
                    t.font = font.clone();
                    t.brush.color = *color;
                    Ok(())
                }
                Shape::Latex(latex) => {
                    latex.font = font.clone();
                    latex.brush.color = *color;
                    Ok(())
                }
                other => Err(unexpected(handle, "text", other)),
            })??;
        }
        AtomicOp::TextHighlight { handle, color, rects } => {
            let handle = *handle;
            if page.contains(handle) {
                page.modify_shape(handle, |shape| match shape {
                    Shape::TextHighlight(hl) => {
                        hl.rects = rects.clone();
                        hl.brush.color = *color;
                        Ok(())
                    }
                    other => Err(unexpected(handle, "text-highlight", other)),
                })??;
            } else {
                page.push_undo();
                page.add_shape(Shape::TextHighlight(TextHighlight::new(handle, *color, rects.clone())))?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_corner_keeps_direction() {
        let corner = square_corner(Point::new(0.5, 0.5), Point::new(0.3, 0.6));
        assert!((corner.x - 0.3).abs() < 1e-12);
        assert!((corner.y - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_fit_aspect() {
        let bounds = Rect::new(0.0, 0.0, 1.0, 0.5);
        let fitted = fit_aspect(Rect::new(0.2, 0.2, 0.4, 0.3), bounds);
        assert!((fitted.height() / fitted.width() - 0.5).abs() < 1e-9);
        assert!(fitted.center().distance(Point::new(0.3, 0.25)) < 1e-9);
    }

    #[test]
    fn test_pan_clamped_to_page() {
        let mut page = Page::with_aspect(0, 1.0);
        page.set_slide_rect(Rect::new(0.5, 0.5, 1.0, 1.0));
        pan_by(&mut page, Vec2::new(0.3, -0.2));
        let slide = page.slide_rect();
        assert!((slide.x0 - 0.5).abs() < 1e-9 && (slide.x1 - 1.0).abs() < 1e-9);
        assert!((slide.y0 - 0.3).abs() < 1e-9 && (slide.y1 - 0.8).abs() < 1e-9);

        let mut full = Page::with_aspect(0, 1.0);
        pan_by(&mut full, Vec2::new(0.1, 0.1));
        assert!(!full.is_zoomed());
    }
}
