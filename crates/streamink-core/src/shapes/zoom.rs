//! Zoom preview rectangle shown while the zoom tool is dragged.

use super::{Brush, ShapeHandle, ShapeTrait};
use kurbo::{Affine, Point, Rect};

#[derive(Debug, Clone, PartialEq)]
pub struct ZoomPreview {
    handle: ShapeHandle,
    pub rect: Rect,
    pub brush: Brush,
}

impl ZoomPreview {
    pub fn new(handle: ShapeHandle, anchor: Point, brush: Brush) -> Self {
        Self {
            handle,
            rect: Rect::from_points(anchor, anchor),
            brush,
        }
    }

    pub fn set_corners(&mut self, p1: Point, p2: Point) {
        self.rect = super::rect_from_corners(p1, p2);
    }
}

impl ShapeTrait for ZoomPreview {
    fn handle(&self) -> ShapeHandle {
        self.handle
    }

    fn bounds(&self) -> Rect {
        self.rect
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.rect.inflate(tolerance, tolerance).contains(point)
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
        self.set_corners(p0, p1);
    }
}
