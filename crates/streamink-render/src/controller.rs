//! Layered rendering of one page.
//!
//! Three surfaces are kept in sync with the page:
//!
//! - **slide**: the document page rasterized at the current view
//! - **action**: slide plus every settled shape
//! - **volatile**: action plus the most recently touched shape
//!
//! Touching the same shape repeatedly (a stroke growing under the pen) only
//! redraws the volatile surface. When another shape is added the previous
//! one is baked into the action surface once.

use crate::raster::RasterSurface;
use crate::renderer::{RenderOptions, RenderResult, RenderSurface, RendererError, view_transform};
use kurbo::Rect;
use streamink_core::document::DocumentBackend;
use streamink_core::page::{Page, PageEvent, PageEventKind};
use streamink_core::shapes::ShapeHandle;

/// Counters of the work done by a controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub slide_renders: usize,
    pub action_recomputes: usize,
    pub bakes: usize,
    pub volatile_redraws: usize,
    pub full_repaints: usize,
}

pub struct RenderController<S> {
    slide: S,
    action: S,
    volatile: S,
    options: RenderOptions,
    last_shape: Option<ShapeHandle>,
    seeking: bool,
    bulk_depth: usize,
    stats: RenderStats,
}

impl RenderController<RasterSurface> {
    /// Controller over CPU surfaces of the given logical size.
    pub fn raster(width: u32, height: u32, options: RenderOptions) -> RenderResult<Self> {
        let (width, height) = options.device_size(width, height);
        Self::new(
            RasterSurface::new(width, height)?,
            RasterSurface::new(width, height)?,
            RasterSurface::new(width, height)?,
            options,
        )
    }
}

impl<S: RenderSurface> RenderController<S> {
    /// The three surfaces must have the same size.
    pub fn new(slide: S, action: S, volatile: S, options: RenderOptions) -> RenderResult<Self> {
        for other in [action.size(), volatile.size()] {
            if other != slide.size() {
                return Err(RendererError::SizeMismatch {
                    expected: slide.size(),
                    got: other,
                });
            }
        }
        Ok(Self {
            slide,
            action,
            volatile,
            options,
            last_shape: None,
            seeking: false,
            bulk_depth: 0,
            stats: RenderStats::default(),
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Shape currently drawn on the volatile surface.
    pub fn last_shape(&self) -> Option<ShapeHandle> {
        self.last_shape
    }

    /// The composited frame to present.
    pub fn frame(&self) -> &S {
        &self.volatile
    }

    pub fn slide_surface(&self) -> &S {
        &self.slide
    }

    pub fn action_surface(&self) -> &S {
        &self.action
    }

    /// Whether page events are currently ignored (seeking or bulk loading).
    pub fn is_suspended(&self) -> bool {
        self.seeking || self.bulk_depth > 0
    }

    /// Start tracking `page` and paint it from scratch.
    pub fn attach(&mut self, page: &mut Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        if !self.is_suspended() {
            page.subscribe();
        }
        self.repaint(page, document)
    }

    /// Stop tracking `page`.
    pub fn detach(&mut self, page: &mut Page) {
        page.unsubscribe();
        self.last_shape = None;
    }

    /// Apply the change events recorded since the last call.
    pub fn update(&mut self, page: &mut Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        if self.is_suspended() {
            return Ok(());
        }
        let events = page.take_events();
        if events.is_empty() {
            return Ok(());
        }
        for event in &events {
            self.handle_event(event, page, document)?;
        }
        self.redraw_volatile(page)
    }

    /// Rebuild every surface from the page.
    pub fn repaint(&mut self, page: &Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        self.stats.full_repaints += 1;
        self.last_shape = page.shapes_ordered().last().map(|s| s.handle());
        self.render_slide(page, document)?;
        self.recompute_action(page)?;
        self.redraw_volatile(page)
    }

    /// Enter or leave seek mode. Leaving repaints once.
    pub fn set_seek(&mut self, seek: bool, page: &mut Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        if self.seeking == seek {
            return Ok(());
        }
        if seek {
            self.suspend(page);
            self.seeking = true;
            Ok(())
        } else {
            self.seeking = false;
            self.resume(page, document)
        }
    }

    /// Suspend event handling until the matching [`Self::end_bulk_render`].
    /// Calls nest.
    pub fn begin_bulk_render(&mut self, page: &mut Page) {
        self.suspend(page);
        self.bulk_depth += 1;
    }

    pub fn end_bulk_render(&mut self, page: &mut Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        if self.bulk_depth == 0 {
            log::warn!("end_bulk_render without matching begin");
            return Ok(());
        }
        self.bulk_depth -= 1;
        self.resume(page, document)
    }

    fn suspend(&mut self, page: &mut Page) {
        if !self.is_suspended() {
            log::debug!("Suspending rendering of page {}", page.number());
            page.unsubscribe();
        }
    }

    fn resume(&mut self, page: &mut Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        if self.is_suspended() {
            return Ok(());
        }
        log::debug!("Resuming rendering of page {}", page.number());
        page.subscribe();
        self.repaint(page, document)
    }

    fn handle_event(&mut self, event: &PageEvent, page: &Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        match event.kind {
            PageEventKind::ShapeAdded(handle) => {
                if let Some(previous) = self.last_shape.filter(|h| *h != handle) {
                    self.bake(previous, page);
                }
                self.last_shape = Some(handle);
            }
            PageEventKind::ShapeModified(handle) => {
                if self.last_shape != Some(handle) {
                    self.recompute_action(page)?;
                }
            }
            PageEventKind::ShapeRemoved(handle) => {
                if self.last_shape == Some(handle) {
                    self.last_shape = None;
                }
                self.recompute_action(page)?;
            }
            PageEventKind::Clear => {
                self.last_shape = None;
                self.recompute_action(page)?;
            }
            PageEventKind::Transform => {
                self.render_slide(page, document)?;
                self.recompute_action(page)?;
            }
        }
        Ok(())
    }

    fn render_slide(&mut self, page: &Page, document: &dyn DocumentBackend) -> RenderResult<()> {
        self.stats.slide_renders += 1;
        let view = page.slide_rect();
        let (width, _) = self.slide.size();
        let transform = view_transform(view, width);
        for surface in [&mut self.slide, &mut self.action, &mut self.volatile] {
            surface.set_transform(transform);
        }

        self.slide.clear();
        self.slide.fill(page.bounds(), self.options.background_color.into());

        let Ok(index) = usize::try_from(page.number()) else {
            log::warn!("Page {} has no document page to render", page.number());
            return Ok(());
        };
        let device = transform.transform_rect_bbox(view);
        let image_height = device.height().round().max(1.0) as u32;
        match document.render_page(index, view, view, width, image_height) {
            Some(image) => self.slide.draw_image(&image, view),
            None => {
                log::warn!("Backend could not render page {index}");
                Ok(())
            }
        }
    }

    /// Slide plus every shape except the volatile one and transient ones.
    fn recompute_action(&mut self, page: &Page) -> RenderResult<()> {
        self.stats.action_recomputes += 1;
        self.action.clear();
        self.action.render_surface(&self.slide)?;
        for shape in page.shapes_ordered() {
            if Some(shape.handle()) == self.last_shape || shape.is_transient() {
                continue;
            }
            self.action.render_shape(shape);
        }
        Ok(())
    }

    fn bake(&mut self, handle: ShapeHandle, page: &Page) {
        match page.get_shape(handle) {
            Some(shape) if !shape.is_transient() => {
                self.action.render_shape(shape);
                self.stats.bakes += 1;
            }
            _ => {}
        }
    }

    fn redraw_volatile(&mut self, page: &Page) -> RenderResult<()> {
        self.stats.volatile_redraws += 1;
        self.volatile.clear();
        self.volatile.render_surface(&self.action)?;
        if let Some(shape) = self.last_shape.and_then(|h| page.get_shape(h)) {
            self.volatile.render_shape(shape);
        }
        Ok(())
    }
}

/// Visible page region covered by a device-space rectangle of `controller`.
pub fn device_to_page<S: RenderSurface>(controller: &RenderController<S>, device: Rect) -> Rect {
    controller.frame().transform().inverse().transform_rect_bbox(device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;
    use streamink_core::document::BlankDocument;
    use streamink_core::shapes::{Brush, Line, Rgba, Shape, Stroke, StrokeKind};

    const RED: Rgba = Rgba::new(255, 0, 0, 255);

    fn setup() -> (RenderController<RasterSurface>, Page, BlankDocument) {
        let controller = RenderController::raster(100, 75, RenderOptions::default()).unwrap();
        (controller, Page::with_aspect(0, 0.75), BlankDocument::new(1, 4.0, 3.0))
    }

    fn line(handle: ShapeHandle, y: f64) -> Shape {
        Shape::Line(Line::new(handle, Point::new(0.1, y), Point::new(0.9, y), Brush::new(RED, 0.02)))
    }

    #[test]
    fn test_attach_paints_background() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        assert!(page.is_subscribed());
        assert_eq!(controller.frame().pixel(50, 50), Some([255, 255, 255, 255]));
        assert_eq!(controller.stats().full_repaints, 1);
    }

    #[test]
    fn test_modifying_last_shape_only_redraws_volatile() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        let mut stroke = Stroke::new(1, StrokeKind::Pen, Brush::new(RED, 0.02));
        stroke.add_point(Point::new(0.1, 0.1), 1.0);
        page.add_shape(Shape::Stroke(stroke)).unwrap();
        controller.update(&mut page, &doc).unwrap();
        let before = controller.stats();

        for i in 1..5 {
            page.modify_shape(1, |shape| {
                if let Shape::Stroke(s) = shape {
                    s.add_point(Point::new(0.1 + i as f64 * 0.1, 0.1), 1.0);
                }
            })
            .unwrap();
            controller.update(&mut page, &doc).unwrap();
        }
        let after = controller.stats();
        assert_eq!(after.action_recomputes, before.action_recomputes);
        assert_eq!(after.volatile_redraws, before.volatile_redraws + 4);
        assert_eq!(controller.frame().pixel(45, 10), Some([255, 0, 0, 255]));
        // not yet settled
        assert_eq!(controller.action_surface().pixel(45, 10), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_previous_shape_baked_on_add() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        page.add_shape(line(1, 0.2)).unwrap();
        controller.update(&mut page, &doc).unwrap();
        page.add_shape(line(2, 0.4)).unwrap();
        controller.update(&mut page, &doc).unwrap();

        assert_eq!(controller.stats().bakes, 1);
        assert_eq!(controller.last_shape(), Some(2));
        assert_eq!(controller.action_surface().pixel(50, 20), Some([255, 0, 0, 255]));
        assert_eq!(controller.action_surface().pixel(50, 40), Some([255, 255, 255, 255]));
        assert_eq!(controller.frame().pixel(50, 40), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_pointer_never_baked() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        let mut pointer = Stroke::new(1, StrokeKind::Pointer, Brush::new(RED, 0.02));
        pointer.add_point(Point::new(0.5, 0.2), 1.0);
        page.add_shape(Shape::Stroke(pointer)).unwrap();
        page.add_shape(line(2, 0.4)).unwrap();
        controller.update(&mut page, &doc).unwrap();
        assert_eq!(controller.stats().bakes, 0);
        assert_eq!(controller.frame().pixel(50, 20), Some([255, 255, 255, 255]));
    }

    #[test]
    fn test_remove_recomputes_action() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        page.add_shape(line(1, 0.2)).unwrap();
        page.add_shape(line(2, 0.4)).unwrap();
        controller.update(&mut page, &doc).unwrap();
        page.remove_shape(1).unwrap();
        controller.update(&mut page, &doc).unwrap();
        assert_eq!(controller.frame().pixel(50, 20), Some([255, 255, 255, 255]));
        assert_eq!(controller.frame().pixel(50, 40), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_transform_rerenders_slide() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        page.add_shape(line(1, 0.2)).unwrap();
        assert!(page.set_slide_rect(Rect::new(0.0, 0.0, 0.5, 0.375)));
        controller.update(&mut page, &doc).unwrap();
        assert_eq!(controller.stats().slide_renders, 2);
        // line at y = 0.2 now lands at device y = 40
        assert_eq!(controller.frame().pixel(50, 40), Some([255, 0, 0, 255]));
        let visible = device_to_page(&controller, Rect::new(0.0, 0.0, 100.0, 75.0));
        assert!((visible.width() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_seek_suppresses_and_repaints_once() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        controller.set_seek(true, &mut page, &doc).unwrap();
        assert!(!page.is_subscribed());
        for h in 0..10 {
            page.add_shape(line(h, 0.05 * (h + 1) as f64)).unwrap();
        }
        controller.update(&mut page, &doc).unwrap();
        assert_eq!(controller.stats().volatile_redraws, 1);

        controller.set_seek(false, &mut page, &doc).unwrap();
        assert!(page.is_subscribed());
        assert_eq!(controller.stats().full_repaints, 2);
        assert_eq!(controller.frame().pixel(50, 5), Some([255, 0, 0, 255]));
    }

    #[test]
    fn test_bulk_render_nests() {
        let (mut controller, mut page, doc) = setup();
        controller.attach(&mut page, &doc).unwrap();
        controller.begin_bulk_render(&mut page);
        controller.begin_bulk_render(&mut page);
        page.add_shape(line(1, 0.2)).unwrap();
        controller.end_bulk_render(&mut page, &doc).unwrap();
        assert!(controller.is_suspended());
        assert_eq!(controller.stats().full_repaints, 1);
        controller.end_bulk_render(&mut page, &doc).unwrap();
        assert!(!controller.is_suspended());
        assert_eq!(controller.stats().full_repaints, 2);
        // unbalanced end is ignored
        controller.end_bulk_render(&mut page, &doc).unwrap();
        assert_eq!(controller.stats().full_repaints, 2);
    }

    #[test]
    fn test_surface_sizes_must_match() {
        let result = RenderController::new(
            RasterSurface::new(4, 4).unwrap(),
            RasterSurface::new(4, 4).unwrap(),
            RasterSurface::new(5, 4).unwrap(),
            RenderOptions::default(),
        );
        assert!(matches!(result, Err(RendererError::SizeMismatch { .. })));
    }

    #[test]
    fn test_scale_factor_doubles_device_size() {
        let options = RenderOptions::default().with_scale_factor(2.0);
        let controller = RenderController::raster(50, 40, options).unwrap();
        assert_eq!(controller.frame().size(), (100, 80));
    }
}
