//! Ellipse shape.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

/// An outlined, axis-aligned ellipse.
#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    handle: ShapeHandle,
    /// Center point.
    pub center: Point,
    /// Horizontal radius.
    pub radius_x: f64,
    /// Vertical radius.
    pub radius_y: f64,
    pub brush: Brush,
}

impl Ellipse {
    /// Create an ellipse inscribed in the rectangle spanned by two corners.
    pub fn from_corners(handle: ShapeHandle, p1: Point, p2: Point, brush: Brush) -> Self {
        let mut ellipse = Self {
            handle,
            center: p1,
            radius_x: 0.0,
            radius_y: 0.0,
            brush,
        };
        ellipse.set_corners(p1, p2);
        ellipse
    }

    /// Replace the geometry with the ellipse inscribed in two corners.
    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        let rect = super::rect_from_corners(p1, p2);
        self.center = rect.center();
        self.radius_x = rect.width() / 2.0;
        self.radius_y = rect.height() / 2.0;
    }

    /// Sample `segments` points around the outline, starting at angle 0.
    pub fn outline(&self, segments: usize) -> Vec<Point> {
        let segments = segments.max(4);
        (0..segments)
            .map(|i| {
                let t = i as f64 / segments as f64 * std::f64::consts::TAU;
                Point::new(
                    self.center.x + self.radius_x * t.cos(),
                    self.center.y + self.radius_y * t.sin(),
                )
            })
            .collect()
    }
}

impl ShapeTrait for Ellipse {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        Rect::new(
            self.center.x - self.radius_x,
            self.center.y - self.radius_y,
            self.center.x + self.radius_x,
            self.center.y + self.radius_y,
        )
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let reach = tolerance + self.brush.width / 2.0;
        let dx_outer = (point.x - self.center.x) / (self.radius_x + reach);
        let dy_outer = (point.y - self.center.y) / (self.radius_y + reach);
        if dx_outer * dx_outer + dy_outer * dy_outer > 1.0 {
            return false;
        }
        // Outline only: reject if inside inner ellipse
        let inner_rx = self.radius_x - reach;
        let inner_ry = self.radius_y - reach;
        if inner_rx <= 0.0 || inner_ry <= 0.0 {
            return true;
        }
        let dx_inner = (point.x - self.center.x) / inner_rx;
        let dy_inner = (point.y - self.center.y) / inner_ry;
        dx_inner * dx_inner + dy_inner * dy_inner > 1.0
    }

    fn brush(&self) -> &Brush {
        &self.brush
    }

    fn brush_mut(&mut self) -> &mut Brush {
        &mut self.brush
    }

    fn transform(&mut self, affine: Affine) {
        self.center = affine * self.center;
        let scale = affine.as_coeffs();
        self.radius_x *= scale[0].abs();
        self.radius_y *= scale[3].abs();
    }
}
