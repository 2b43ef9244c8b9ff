//! Line shape.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

/// A straight line segment.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    handle: ShapeHandle,
    /// Start point.
    pub start: Point,
    /// End point.
    pub end: Point,
    pub brush: Brush,
}

impl Line {
    /// Create a new line.
    pub fn new(handle: ShapeHandle, start: Point, end: Point, brush: Brush) -> Self {
        Self {
            handle,
            start,
            end,
            brush,
        }
    }

    /// Get the length of the line.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Get the midpoint of the line.
    pub fn midpoint(&self) -> Point {
        self.start.midpoint(self.end)
    }
}

/// Snap `end` so the segment from `start` lies on a multiple of 45°.
pub fn constrain_to_45(start: Point, end: Point) -> Point {
    let delta = end - start;
    let len = delta.hypot();
    if len < f64::EPSILON {
        return end;
    }
    let step = std::f64::consts::FRAC_PI_4;
    let angle = (delta.atan2() / step).round() * step;
    Point::new(start.x + len * angle.cos(), start.y + len * angle.sin())
}

impl ShapeTrait for Line {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        Rect::from_points(self.start, self.end)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        super::point_to_segment_dist(point, self.start, self.end) <= tolerance + self.brush.width / 2.0
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        self.start = affine * self.start;
        self.end = affine * self.end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(x0: f64, y0: f64, x1: f64, y1: f64) -> Line {
        Line::new(1, Point::new(x0, y0), Point::new(x1, y1), Brush::default())
    }

    #[test]
    fn test_line_creation() {
        let l = line(0.0, 0.0, 0.5, 0.0);
        assert!((l.length() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_midpoint() {
        let mid = line(0.0, 0.0, 0.5, 0.5).midpoint();
        assert!((mid.x - 0.25).abs() < f64::EPSILON);
        assert!((mid.y - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_on_line() {
        let l = line(0.0, 0.0, 1.0, 0.0);
        assert!(l.hit_test(Point::new(0.5, 0.0), 0.001));
        assert!(l.hit_test(Point::new(0.5, 0.02), 0.05));
        assert!(!l.hit_test(Point::new(0.5, 0.2), 0.05));
    }

    #[test]
    fn test_bounds() {
        let b = line(0.5, 0.8, 0.1, 0.2).bounds();
        assert_eq!(b, Rect::new(0.1, 0.2, 0.5, 0.8));
    }

    #[test]
    fn test_constrain_to_45() {
        let end = constrain_to_45(Point::ZERO, Point::new(1.0, 0.1));
        assert!(end.y.abs() < 1e-9);
        let end = constrain_to_45(Point::ZERO, Point::new(1.0, 0.9));
        assert!((end.x - end.y).abs() < 1e-9);
    }
}
