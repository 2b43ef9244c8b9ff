//! Annotated page: shapes, visible region and undo history.

use crate::shapes::{Shape, ShapeHandle};
use kurbo::{Point, Rect};
use std::collections::HashMap;
use thiserror::Error;

/// Maximum number of undo states to keep.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Errors raised by page mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    #[error("Shape handle {0} is already present on the page")]
    DuplicateHandle(ShapeHandle),
    #[error("No shape with handle {0} on the page")]
    UnknownHandle(ShapeHandle),
    #[error("Shape {handle} is a {found}, expected {expected}")]
    UnexpectedShape {
        handle: ShapeHandle,
        expected: &'static str,
        found: &'static str,
    },
}

pub type PageResult<T> = Result<T, PageError>;

/// What changed on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEventKind {
    ShapeAdded(ShapeHandle),
    ShapeRemoved(ShapeHandle),
    ShapeModified(ShapeHandle),
    /// The slide rect changed; everything must be re-rasterized.
    Transform,
    /// Arbitrary content change; the settled state must be recomputed.
    Clear,
}

/// A change notification with the page region it affects.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageEvent {
    pub kind: PageEventKind,
    pub dirty: Rect,
}

#[derive(Debug, Clone)]
struct PageSnapshot {
    shapes: HashMap<ShapeHandle, Shape>,
    z_order: Vec<ShapeHandle>,
}

/// One document page with its annotations.
#[derive(Debug, Clone)]
pub struct Page {
    number: i32,
    /// Full page area in page coordinates (width 1).
    bounds: Rect,
    /// Visible sub-region of the page.
    slide_rect: Rect,
    shapes: HashMap<ShapeHandle, Shape>,
    /// Back to front.
    z_order: Vec<ShapeHandle>,
    undo_stack: Vec<PageSnapshot>,
    redo_stack: Vec<PageSnapshot>,
    subscribed: bool,
    events: Vec<PageEvent>,
}

impl Page {
    /// Create an empty page with the given bounds.
    pub fn new(number: i32, bounds: Rect) -> Self {
        Self {
            number,
            bounds,
            slide_rect: bounds,
            shapes: HashMap::new(),
            z_order: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            subscribed: false,
            events: Vec::new(),
        }
    }

    /// A page of the given aspect ratio (height / width), one unit wide.
    pub fn with_aspect(number: i32, aspect: f64) -> Self {
        Self::new(number, Rect::new(0.0, 0.0, 1.0, aspect))
    }

    pub fn number(&self) -> i32 {
        self.number
    }

    pub(crate) fn set_number(&mut self, number: i32) {
        self.number = number;
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn slide_rect(&self) -> Rect {
        self.slide_rect
    }

    /// Whether a sub-region is shown instead of the whole page.
    pub fn is_zoomed(&self) -> bool {
        self.slide_rect != self.bounds
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    pub fn contains(&self, handle: ShapeHandle) -> bool {
        self.shapes.contains_key(&handle)
    }

    pub fn get_shape(&self, handle: ShapeHandle) -> Option<&Shape> {
        self.shapes.get(&handle)
    }

    /// Shapes back to front.
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|h| self.shapes.get(h))
    }

    /// Handles of shapes hit at `point`, front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeHandle> {
        self.z_order
            .iter()
            .rev()
            .filter(|h| self.shapes.get(h).is_some_and(|s| s.hit_test(point, tolerance)))
            .copied()
            .collect()
    }

    // --- change events ---

    /// Start recording change events.
    pub fn subscribe(&mut self) {
        self.subscribed = true;
    }

    /// Stop recording change events and drop any not yet taken.
    pub fn unsubscribe(&mut self) {
        self.subscribed = false;
        self.events.clear();
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Drain the recorded change events in emission order.
    pub fn take_events(&mut self) -> Vec<PageEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, kind: PageEventKind, dirty: Rect) {
        if self.subscribed {
            self.events.push(PageEvent { kind, dirty });
        }
    }

    // --- undo ---

    fn snapshot(&self) -> PageSnapshot {
        PageSnapshot {
            shapes: self.shapes.clone(),
            z_order: self.z_order.clone(),
        }
    }

    fn restore(&mut self, snapshot: PageSnapshot) {
        self.shapes = snapshot.shapes;
        self.z_order = snapshot.z_order;
        self.emit(PageEventKind::Clear, self.bounds);
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change. Returns false if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change. Returns false if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    // --- mutation ---

    /// Add a shape on top of all others.
    pub fn add_shape(&mut self, shape: Shape) -> PageResult<()> {
        let handle = shape.handle();
        if self.shapes.contains_key(&handle) {
            return Err(PageError::DuplicateHandle(handle));
        }
        let dirty = shape.dirty_bounds();
        self.z_order.push(handle);
        self.shapes.insert(handle, shape);
        self.emit(PageEventKind::ShapeAdded(handle), dirty);
        Ok(())
    }

    /// Remove a shape and return it.
    pub fn remove_shape(&mut self, handle: ShapeHandle) -> PageResult<Shape> {
        let shape = self.shapes.remove(&handle).ok_or(PageError::UnknownHandle(handle))?;
        self.z_order.retain(|h| *h != handle);
        self.emit(PageEventKind::ShapeRemoved(handle), shape.dirty_bounds());
        Ok(shape)
    }

    /// Mutate a shape in place; the event covers its area before and after.
    pub fn modify_shape<R>(&mut self, handle: ShapeHandle, f: impl FnOnce(&mut Shape) -> R) -> PageResult<R> {
        let shape = self.shapes.get_mut(&handle).ok_or(PageError::UnknownHandle(handle))?;
        let before = shape.dirty_bounds();
        let result = f(shape);
        let dirty = before.union(shape.dirty_bounds());
        self.emit(PageEventKind::ShapeModified(handle), dirty);
        Ok(result)
    }

    /// Remove every shape.
    pub fn clear_shapes(&mut self) {
        self.shapes.clear();
        self.z_order.clear();
        self.emit(PageEventKind::Clear, self.bounds);
    }

    /// Show a sub-region of the page, clipped to the page bounds.
    ///
    /// Returns false and leaves the view unchanged if the clipped region is
    /// empty.
    pub fn set_slide_rect(&mut self, rect: Rect) -> bool {
        let clipped = rect.abs().intersect(self.bounds);
        if clipped.width() <= 0.0 || clipped.height() <= 0.0 {
            return false;
        }
        self.slide_rect = clipped;
        self.emit(PageEventKind::Transform, self.bounds);
        true
    }

    /// Show the whole page again.
    pub fn reset_slide_rect(&mut self) {
        self.slide_rect = self.bounds;
        self.emit(PageEventKind::Transform, self.bounds);
    }
}
