//! Arrow shape.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect, Vec2};

/// An arrow shape (line with arrowhead at `end`).
#[derive(Debug, Clone, PartialEq)]
pub struct Arrow {
    handle: ShapeHandle,
    /// Start point.
    pub start: Point,
    /// End point (where the arrowhead points).
    pub end: Point,
    pub brush: Brush,
}

impl Arrow {
    /// Arrowhead length relative to the stroke width.
    pub const HEAD_SCALE: f64 = 4.0;

    /// Create a new arrow.
    pub fn new(handle: ShapeHandle, start: Point, end: Point, brush: Brush) -> Self {
        Self {
            handle,
            start,
            end,
            brush,
        }
    }

    /// Get the direction vector (normalized).
    pub fn direction(&self) -> Vec2 {
        let delta = self.end - self.start;
        let len = delta.hypot();
        if len < f64::EPSILON {
            Vec2::new(1.0, 0.0)
        } else {
            delta / len
        }
    }

    /// Get the length of the arrow shaft.
    pub fn length(&self) -> f64 {
        self.start.distance(self.end)
    }

    /// Length of the arrowhead sides, never longer than the shaft.
    pub fn head_size(&self) -> f64 {
        (self.brush.width * Self::HEAD_SCALE).min(self.length())
    }

    /// The two back corners of the arrowhead.
    pub fn head_points(&self) -> (Point, Point) {
        let dir = self.direction();
        let size = self.head_size();
        let angle = std::f64::consts::PI / 6.0;
        let (sin, cos) = angle.sin_cos();
        let left = Vec2::new(dir.x * cos - dir.y * sin, dir.x * sin + dir.y * cos);
        let right = Vec2::new(dir.x * cos + dir.y * sin, -dir.x * sin + dir.y * cos);
        (self.end - left * size, self.end - right * size)
    }
}

impl ShapeTrait for Arrow {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        let (left, right) = self.head_points();
        Rect::from_points(self.start, self.end)
            .union_pt(left)
            .union_pt(right)
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

    #[test]
    fn test_direction() {
        let arrow = Arrow::new(1, Point::ZERO, Point::new(0.0, 0.5), Brush::default());
        let dir = arrow.direction();
        assert!(dir.x.abs() < f64::EPSILON);
        assert!((dir.y - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_degenerate_direction() {
        let arrow = Arrow::new(1, Point::ZERO, Point::ZERO, Brush::default());
        assert_eq!(arrow.direction(), Vec2::new(1.0, 0.0));
        assert_eq!(arrow.head_size(), 0.0);
    }

    #[test]
    fn test_head_behind_tip() {
        let arrow = Arrow::new(1, Point::ZERO, Point::new(1.0, 0.0), Brush::default());
        let (left, right) = arrow.head_points();
        assert!(left.x < 1.0 && right.x < 1.0);
        assert!((left.y + right.y).abs() < 1e-12);
        let bounds = arrow.bounds().inflate(1e-9, 1e-9);
        assert!(bounds.contains(left) && bounds.contains(right));
    }
}
