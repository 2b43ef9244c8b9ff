//! Rectangle shape.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

/// An outlined rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    handle: ShapeHandle,
    pub rect: Rect,
    pub brush: Brush,
}

impl Rectangle {
    /// Create a rectangle from two corner points.
    pub fn from_corners(handle: ShapeHandle, p1: Point, p2: Point, brush: Brush) -> Self {
        Self {
            handle,
            rect: super::rect_from_corners(p1, p2),
            brush,
        }
    }

    /// Replace the geometry with the rectangle spanned by two corners.
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        self.rect = super::rect_from_corners(p1, p2);
    }

    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }
}

impl ShapeTrait for Rectangle {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        // Outline only: hit on the border
        let reach = tolerance + self.brush.width / 2.0;
        let outer = self.rect.inflate(reach, reach);
        let inner = self.rect.inflate(-reach, -reach);
        outer.contains(point) && !(inner.width() > 0.0 && inner.height() > 0.0 && inner.contains(point))
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        let p0 = affine * Point::new(self.rect.x0, self.rect.y0);
        let p1 = affine * Point::new(self.rect.x1, self.rect.y1);
        self.rect = super::rect_from_corners(p0, p1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_from_corners() {
        let r = Rectangle::from_corners(1, Point::new(0.5, 0.5), Point::new(0.25, 0.1), Brush::default());
        assert_eq!(r.bounds(), Rect::new(0.25, 0.1, 0.5, 0.5));
        assert!((r.width() - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_hit_test_border_only() {
        let r = Rectangle::from_corners(1, Point::ZERO, Point::new(1.0, 1.0), Brush::default());
        assert!(r.hit_test(Point::new(0.0, 0.5), 0.01));
        assert!(r.hit_test(Point::new(1.005, 0.5), 0.01));
        assert!(!r.hit_test(Point::new(0.5, 0.5), 0.01));
        assert!(!r.hit_test(Point::new(1.5, 0.5), 0.01));
    }

    #[test]
    fn test_transform_scales() {
        let mut r = Rectangle::from_corners(1, Point::ZERO, Point::new(0.5, 0.5), Brush::default());
        r.transform(Affine::scale(2.0));
        assert_eq!(r.bounds(), Rect::new(0.0, 0.0, 1.0, 1.0));
    }
}
