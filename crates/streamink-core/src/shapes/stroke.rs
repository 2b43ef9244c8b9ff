//! Freehand strokes: pen, highlighter and pointer trails.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

/// Which freehand tool produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrokeKind {
    Pen,
    /// Painted translucent and wide.
    Highlighter,
    /// Live cursor trail, removed when the gesture ends.
    Pointer,
}

impl StrokeKind {
    pub fn name(self) -> &'static str {
        match self {
            StrokeKind::Pen => "pen",
            StrokeKind::Highlighter => "highlighter",
            StrokeKind::Pointer => "pointer",
        }
    }
}

/// A freehand drawing (series of pressure-annotated points).
#[derive(Debug, Clone, PartialEq)]
pub struct Stroke {
    handle: ShapeHandle,
    pub kind: StrokeKind,
    /// Points in the path.
    pub points: Vec<Point>,
    /// Pressure per point, same length as `points`.
    pub pressures: Vec<f64>,
    pub brush: Brush,
}

impl Stroke {
    /// Create a new empty stroke.
    pub fn new(handle: ShapeHandle, kind: StrokeKind, brush: Brush) -> Self {
        Self {
            handle,
            kind,
            points: Vec::new(),
            pressures: Vec::new(),
            brush,
        }
    }

    /// Add a point to the path.
    pub fn add_point(&mut self, point: Point, pressure: f64) {
        self.points.push(point);
        self.pressures.push(pressure);
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }
}

impl ShapeTrait for Stroke {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        super::point_to_polyline_dist(point, &self.points) <= tolerance + self.brush.width / 2.0
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        for point in &mut self.points {
            *point = affine * *point;
        }
    }
}
