//! Passive viewer state driven by the processor and the player.

use crate::action::Action;
use crate::document::DocumentBackend;
use crate::page::Page;
use crate::player::ActionExecutor;
use crate::processor::{ExecutorError, ExecutorResult, StreamExecutor};
use crate::stream::{DocumentId, DocumentInfo, MediaKind, RecordedPage};
use crate::tools::ToolController;
use std::collections::HashMap;

/// Aspect ratio used when a backend cannot report page bounds.
const FALLBACK_ASPECT: f64 = 0.75;

/// A document whose backend finished loading.
pub struct LoadedDocument {
    info: DocumentInfo,
    backend: Box<dyn DocumentBackend>,
    pages: Vec<Page>,
    selected_page: usize,
}

impl LoadedDocument {
    fn new(info: DocumentInfo, backend: Box<dyn DocumentBackend>) -> Self {
        let pages = (0..backend.page_count())
            .map(|n| Page::with_aspect(n as i32, page_aspect(backend.as_ref(), n)))
            .collect();
        Self {
            info,
            backend,
            pages,
            selected_page: 0,
        }
    }

    pub fn info(&self) -> &DocumentInfo {
        &self.info
    }

    pub fn backend(&self) -> &dyn DocumentBackend {
        self.backend.as_ref()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page(&self, number: i32) -> Option<&Page> {
        usize::try_from(number).ok().and_then(|n| self.pages.get(n))
    }

    pub fn page_mut(&mut self, number: i32) -> Option<&mut Page> {
        usize::try_from(number).ok().and_then(|n| self.pages.get_mut(n))
    }

    pub fn selected_page(&self) -> usize {
        self.selected_page
    }

    fn renumber(&mut self) {
        for (n, page) in self.pages.iter_mut().enumerate() {
            page.set_number(n as i32);
        }
    }
}

fn page_aspect(backend: &dyn DocumentBackend, page: usize) -> f64 {
    match backend.page_bounds(page) {
        Some(bounds) if bounds.width() > 0.0 && bounds.height() > 0.0 => bounds.height() / bounds.width(),
        _ => {
            log::warn!("No usable bounds for page {page}; assuming 4:3");
            FALLBACK_ASPECT
        }
    }
}

/// Viewer-side document, page and media state.
#[derive(Default)]
pub struct Viewer {
    documents: HashMap<DocumentId, LoadedDocument>,
    selected: Option<DocumentId>,
    tools: ToolController,
    pending_loads: Vec<DocumentInfo>,
    speakers: Vec<(i64, String)>,
    media: HashMap<MediaKind, bool>,
}

impl Viewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads requested since the last call, oldest first.
    pub fn take_pending_loads(&mut self) -> Vec<DocumentInfo> {
        std::mem::take(&mut self.pending_loads)
    }

    pub fn document(&self, id: DocumentId) -> Option<&LoadedDocument> {
        self.documents.get(&id)
    }

    pub fn selected_document(&self) -> Option<&LoadedDocument> {
        self.selected.and_then(|id| self.documents.get(&id))
    }

    pub fn selected_page(&self) -> Option<&Page> {
        let doc = self.selected_document()?;
        doc.pages.get(doc.selected_page)
    }

    pub fn selected_page_mut(&mut self) -> Option<&mut Page> {
        let doc = self.documents.get_mut(&self.selected?)?;
        doc.pages.get_mut(doc.selected_page)
    }

    /// The selected page together with the backend that rasterizes it.
    pub fn selected_page_with_backend(&mut self) -> Option<(&mut Page, &dyn DocumentBackend)> {
        let doc = self.documents.get_mut(&self.selected?)?;
        let page = doc.pages.get_mut(doc.selected_page)?;
        Some((page, doc.backend.as_ref()))
    }

    pub fn selected_page_number(&self) -> Option<i32> {
        self.selected_page().map(Page::number)
    }

    pub fn tools(&self) -> &ToolController {
        &self.tools
    }

    /// Publishers heard so far, in order of first appearance.
    pub fn speakers(&self) -> &[(i64, String)] {
        &self.speakers
    }

    pub fn media_enabled(&self, kind: MediaKind) -> bool {
        self.media.get(&kind).copied().unwrap_or(false)
    }

    fn document_mut(&mut self, id: DocumentId) -> ExecutorResult<&mut LoadedDocument> {
        self.documents.get_mut(&id).ok_or(ExecutorError::UnknownDocument(id))
    }
}

/// Clear `page` and replay a recording onto it with a dedicated tool controller.
///
/// Failing actions are logged and skipped. Returns the number applied.
pub fn replay_recorded_page(page: &mut Page, recorded: &RecordedPage) -> usize {
    page.clear_shapes();
    page.reset_slide_rect();
    let mut tools = ToolController::new();
    let mut applied = 0;
    for action in recorded.actions() {
        match tools.execute(action, page) {
            Ok(()) => applied += 1,
            Err(err) => log::error!(
                "Skipping {:?} (t={}) while replaying page {}: {err}",
                action.action_type(),
                action.timestamp,
                recorded.page_number
            ),
        }
    }
    applied
}

impl StreamExecutor for Viewer {
    fn load_document(&mut self, info: &DocumentInfo) {
        log::debug!("Requesting load of document {} ({})", info.id, info.name);
        self.pending_loads.push(info.clone());
    }

    fn add_document(&mut self, info: DocumentInfo, backend: Box<dyn DocumentBackend>) -> ExecutorResult<()> {
        let id = info.id;
        let doc = LoadedDocument::new(info, backend);
        log::debug!("Added document {id} with {} pages", doc.pages.len());
        if self.documents.insert(id, doc).is_some() {
            log::warn!("Document {id} replaced an already loaded document");
        }
        self.selected = Some(id);
        Ok(())
    }

    fn remove_document(&mut self, info: &DocumentInfo) -> ExecutorResult<()> {
        self.documents
            .remove(&info.id)
            .ok_or(ExecutorError::UnknownDocument(info.id))?;
        if self.selected == Some(info.id) {
            self.selected = None;
        }
        Ok(())
    }

    fn select_document(&mut self, info: &DocumentInfo) -> ExecutorResult<()> {
        if !self.documents.contains_key(&info.id) {
            return Err(ExecutorError::UnknownDocument(info.id));
        }
        self.selected = Some(info.id);
        Ok(())
    }

    fn create_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()> {
        let doc = self.document_mut(document_id)?;
        let index = usize::try_from(page_number)
            .ok()
            .filter(|n| *n <= doc.pages.len())
            .ok_or(ExecutorError::UnknownPage {
                document: document_id,
                page: page_number,
            })?;
        let aspect = doc
            .pages
            .first()
            .map(|p| p.bounds().height())
            .unwrap_or(FALLBACK_ASPECT);
        doc.pages.insert(index, Page::with_aspect(page_number, aspect));
        doc.renumber();
        if index <= doc.selected_page && doc.pages.len() > 1 {
            doc.selected_page += 1;
        }
        Ok(())
    }

    fn delete_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()> {
        let doc = self.document_mut(document_id)?;
        if doc.page(page_number).is_none() {
            return Err(ExecutorError::UnknownPage {
                document: document_id,
                page: page_number,
            });
        }
        let index = page_number as usize;
        doc.pages.remove(index);
        doc.renumber();
        if index < doc.selected_page || doc.selected_page >= doc.pages.len() {
            doc.selected_page = doc.selected_page.saturating_sub(1);
        }
        Ok(())
    }

    fn select_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()> {
        let doc = self.document_mut(document_id)?;
        if doc.page(page_number).is_none() {
            return Err(ExecutorError::UnknownPage {
                document: document_id,
                page: page_number,
            });
        }
        doc.selected_page = page_number as usize;
        Ok(())
    }

    fn execute_page_action(&mut self, document_id: DocumentId, page_number: i32, action: &Action) -> ExecutorResult<()> {
        let doc = self
            .documents
            .get_mut(&document_id)
            .ok_or(ExecutorError::UnknownDocument(document_id))?;
        let page = doc.page_mut(page_number).ok_or(ExecutorError::UnknownPage {
            document: document_id,
            page: page_number,
        })?;
        self.tools.execute(action, page)?;
        Ok(())
    }

    fn apply_recorded_page(&mut self, document_id: DocumentId, recorded: &RecordedPage) -> ExecutorResult<()> {
        let doc = self.document_mut(document_id)?;
        let page = doc.page_mut(recorded.page_number).ok_or(ExecutorError::UnknownPage {
            document: document_id,
            page: recorded.page_number,
        })?;
        let applied = replay_recorded_page(page, recorded);
        log::debug!(
            "Replayed {applied} actions onto page {} of document {document_id}",
            recorded.page_number
        );
        Ok(())
    }

    fn speech_published(&mut self, publisher_id: i64, display_name: &str) {
        match self.speakers.iter_mut().find(|(id, _)| *id == publisher_id) {
            Some((_, name)) => *name = display_name.to_string(),
            None => self.speakers.push((publisher_id, display_name.to_string())),
        }
    }

    fn media_changed(&mut self, kind: MediaKind, enabled: bool) {
        log::debug!("{kind:?} {}", if enabled { "enabled" } else { "disabled" });
        self.media.insert(kind, enabled);
    }
}

impl ActionExecutor for Viewer {
    /// Apply a page action to the selected page.
    fn execute_action(&mut self, action: &Action) -> ExecutorResult<()> {
        let id = self.selected.ok_or(ExecutorError::NoPage)?;
        let doc = self.documents.get_mut(&id).ok_or(ExecutorError::UnknownDocument(id))?;
        let page = doc.pages.get_mut(doc.selected_page).ok_or(ExecutorError::NoPage)?;
        self.tools.execute(action, page)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionKind, BrushSpec, PenPoint};
    use crate::document::BlankDocument;
    use crate::shapes::Brush;
    use crate::stream::DocumentType;

    fn viewer_with_doc(id: DocumentId, pages: usize) -> Viewer {
        let mut viewer = Viewer::new();
        let info = DocumentInfo::new(id, DocumentType::Whiteboard, "Board", "board");
        viewer
            .add_document(info, Box::new(BlankDocument::new(pages, 4.0, 3.0)))
            .unwrap();
        viewer
    }

    fn pen_actions(handle: i32) -> Vec<Action> {
        vec![
            Action::new(ActionKind::Pen(BrushSpec::new(handle, Brush::default()))),
            Action::new(ActionKind::ToolBegin(PenPoint::new(0.1, 0.1, 1.0))),
            Action::new(ActionKind::ToolEnd(PenPoint::new(0.2, 0.2, 1.0))),
        ]
    }

    #[test]
    fn test_pages_follow_backend() {
        let viewer = viewer_with_doc(1, 3);
        let doc = viewer.document(1).unwrap();
        assert_eq!(doc.pages().len(), 3);
        assert!((doc.pages()[0].bounds().height() - 0.75).abs() < 1e-12);
        assert_eq!(viewer.selected_page_number(), Some(0));
    }

    #[test]
    fn test_select_and_delete_pages() {
        let mut viewer = viewer_with_doc(1, 3);
        viewer.select_page(1, 2).unwrap();
        assert_eq!(viewer.selected_page_number(), Some(2));
        assert!(matches!(
            viewer.select_page(1, 3),
            Err(ExecutorError::UnknownPage { document: 1, page: 3 })
        ));

        viewer.delete_page(1, 0).unwrap();
        assert_eq!(viewer.selected_page_number(), Some(1));
        viewer.create_page(1, 0).unwrap();
        assert_eq!(viewer.selected_page_number(), Some(2));
        assert_eq!(viewer.document(1).unwrap().pages().len(), 3);
    }

    #[test]
    fn test_actions_target_selected_page() {
        let mut viewer = viewer_with_doc(1, 2);
        viewer.select_page(1, 1).unwrap();
        for action in pen_actions(3) {
            viewer.execute_action(&action).unwrap();
        }
        let doc = viewer.document(1).unwrap();
        assert!(doc.pages()[0].is_empty());
        assert!(doc.pages()[1].contains(3));
    }

    #[test]
    fn test_no_document_no_page() {
        let mut viewer = Viewer::new();
        assert!(matches!(
            viewer.execute_action(&Action::new(ActionKind::Undo)),
            Err(ExecutorError::NoPage)
        ));
    }

    #[test]
    fn test_recorded_page_replaces_content() {
        let mut viewer = viewer_with_doc(1, 1);
        for action in pen_actions(1) {
            viewer.execute_page_action(1, 0, &action).unwrap();
        }

        // a failing action in the middle is skipped
        let mut playback = vec![Action::new(ActionKind::DeleteShape(42))];
        playback.extend(pen_actions(2));
        let recorded = RecordedPage::new(0, 0, pen_actions(5), playback);
        viewer.apply_recorded_page(1, &recorded).unwrap();

        let page = &viewer.document(1).unwrap().pages()[0];
        assert!(!page.contains(1));
        assert!(page.contains(5));
        assert!(page.contains(2));
    }

    #[test]
    fn test_side_channels() {
        let mut viewer = Viewer::new();
        viewer.speech_published(4, "Ada");
        viewer.speech_published(4, "Ada L.");
        viewer.speech_published(5, "Grace");
        assert_eq!(viewer.speakers(), &[(4, "Ada L.".to_string()), (5, "Grace".to_string())]);

        viewer.media_changed(MediaKind::Camera, true);
        assert!(viewer.media_enabled(MediaKind::Camera));
        assert!(!viewer.media_enabled(MediaKind::Audio));
    }

    #[test]
    fn test_remove_selected_document() {
        let mut viewer = viewer_with_doc(1, 1);
        let info = DocumentInfo::new(1, DocumentType::Whiteboard, "Board", "board");
        viewer.remove_document(&info).unwrap();
        assert!(viewer.selected_document().is_none());
        assert!(matches!(
            viewer.remove_document(&info),
            Err(ExecutorError::UnknownDocument(1))
        ));
    }
}
