//! Routes decoded stream actions, holding back those that target a document
//! whose load has not finished yet.

use crate::action::Action;
use crate::codec::{CodecResult, ProgressiveReader, read_stream_action};
use crate::config::CodecConfig;
use crate::document::{DocumentBackend, LoadError};
use crate::stream::{DocumentId, DocumentInfo, MediaKind, RecordedPage, StreamAction};
use crate::tools::ToolError;
use thiserror::Error;

/// Errors raised while applying a stream action.
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Unknown document {0}")]
    UnknownDocument(DocumentId),
    #[error("Document {document} has no page {page}")]
    UnknownPage { document: DocumentId, page: i32 },
    #[error("No page selected")]
    NoPage,
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Load(#[from] LoadError),
}

pub type ExecutorResult<T> = Result<T, ExecutorError>;

/// Side effects of stream actions.
pub trait StreamExecutor {
    /// Start loading a document; the host reports back through
    /// [`StreamActionProcessor::document_loaded`].
    fn load_document(&mut self, info: &DocumentInfo);

    fn add_document(&mut self, info: DocumentInfo, backend: Box<dyn DocumentBackend>) -> ExecutorResult<()>;

    fn remove_document(&mut self, info: &DocumentInfo) -> ExecutorResult<()>;

    fn select_document(&mut self, info: &DocumentInfo) -> ExecutorResult<()>;

    fn create_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()>;

    fn delete_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()>;

    fn select_page(&mut self, document_id: DocumentId, page_number: i32) -> ExecutorResult<()>;

    fn execute_page_action(&mut self, document_id: DocumentId, page_number: i32, action: &Action) -> ExecutorResult<()>;

    fn apply_recorded_page(&mut self, document_id: DocumentId, page: &RecordedPage) -> ExecutorResult<()>;

    fn speech_published(&mut self, publisher_id: i64, display_name: &str);

    fn media_changed(&mut self, kind: MediaKind, enabled: bool);
}

/// Actions held back while a document loads.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentBuffer {
    pub document_id: DocumentId,
    pub actions: Vec<StreamAction>,
}

/// Decodes stream frames and applies them to a [`StreamExecutor`] in order.
pub struct StreamActionProcessor<E> {
    executor: E,
    codec: CodecConfig,
    /// At most one document load is buffered at a time.
    buffer: Option<DocumentBuffer>,
    /// Documents closed before their load resolved.
    closed_while_loading: Vec<DocumentId>,
}

impl<E: StreamExecutor> StreamActionProcessor<E> {
    pub fn new(executor: E, codec: CodecConfig) -> Self {
        Self {
            executor,
            codec,
            buffer: None,
            closed_while_loading: Vec::new(),
        }
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    pub fn buffer(&self) -> Option<&DocumentBuffer> {
        self.buffer.as_ref()
    }

    /// Decode and dispatch every frame in `data`.
    ///
    /// Frames before a decoding error have already been dispatched when the
    /// error is returned. Returns the number of frames dispatched.
    pub fn process_data(&mut self, data: &[u8]) -> CodecResult<usize> {
        let mut reader = ProgressiveReader::new(data);
        let mut dispatched = 0;
        while !reader.is_exhausted() {
            match read_stream_action(&mut reader, &self.codec) {
                Ok(Some(action)) => {
                    self.dispatch(action);
                    dispatched += 1;
                }
                Ok(None) => {}
                Err(err) => {
                    log::warn!("Dropping rest of buffer at offset {}: {err}", reader.offset());
                    return Err(err);
                }
            }
        }
        Ok(dispatched)
    }

    /// Buffer `action` if it targets the loading document, apply it otherwise.
    pub fn dispatch(&mut self, action: StreamAction) {
        if let Some(buffer) = self.buffer.as_mut() {
            let closes_buffered = matches!(&action, StreamAction::DocumentClosed(info) if info.id == buffer.document_id);
            if closes_buffered {
                log::debug!(
                    "Document {} closed while loading; dropping {} buffered actions",
                    buffer.document_id,
                    buffer.actions.len()
                );
                self.closed_while_loading.push(buffer.document_id);
                self.buffer = None;
                return;
            }
            if action.document_id() == Some(buffer.document_id) {
                log::debug!("Buffering {:?} for document {}", action.action_type(), buffer.document_id);
                buffer.actions.push(action);
                return;
            }
        }
        self.apply(action);
    }

    fn apply(&mut self, action: StreamAction) {
        let action_type = action.action_type();
        let result = match action {
            StreamAction::DocumentCreated(info) => {
                if let Some(pos) = self.closed_while_loading.iter().position(|id| *id == info.id) {
                    self.closed_while_loading.swap_remove(pos);
                    log::debug!("Document {} reopened before its earlier load resolved", info.id);
                }
                if let Some(previous) = self.buffer.replace(DocumentBuffer {
                    document_id: info.id,
                    actions: Vec::new(),
                }) {
                    log::warn!(
                        "Document {} created while document {} was loading; discarding {} buffered actions",
                        info.id,
                        previous.document_id,
                        previous.actions.len()
                    );
                }
                self.executor.load_document(&info);
                Ok(())
            }
            StreamAction::DocumentClosed(info) => self.executor.remove_document(&info),
            StreamAction::DocumentSelected(info) => self.executor.select_document(&info),
            StreamAction::PageCreated {
                document_id,
                page_number,
            } => self.executor.create_page(document_id, page_number),
            StreamAction::PageDeleted {
                document_id,
                page_number,
            } => self.executor.delete_page(document_id, page_number),
            StreamAction::PageSelected {
                document_id,
                page_number,
            } => self.executor.select_page(document_id, page_number),
            StreamAction::PageAction {
                document_id,
                page_number,
                action,
            } => self.executor.execute_page_action(document_id, page_number, &action),
            StreamAction::PageActionsBulk { document_id, page } => {
                self.executor.apply_recorded_page(document_id, &page)
            }
            StreamAction::SpeechPublished {
                publisher_id,
                display_name,
            } => {
                self.executor.speech_published(publisher_id, &display_name);
                Ok(())
            }
            StreamAction::MediaChange { kind, enabled } => {
                self.executor.media_changed(kind, enabled);
                Ok(())
            }
        };

        if let Err(err) = result {
            log::error!("Failed to apply {action_type:?}: {err}");
        }
    }

    /// Report the outcome of a load started by [`StreamExecutor::load_document`].
    ///
    /// On success the document is added and, if it is the one being
    /// buffered, its held-back actions are applied in arrival order.
    pub fn document_loaded(&mut self, info: DocumentInfo, result: Result<Box<dyn DocumentBackend>, LoadError>) {
        if let Some(pos) = self.closed_while_loading.iter().position(|id| *id == info.id) {
            self.closed_while_loading.swap_remove(pos);
            log::debug!("Discarding load of closed document {}", info.id);
            return;
        }

        let owns_buffer = self.buffer.as_ref().is_some_and(|b| b.document_id == info.id);
        let backend = match result {
            Ok(backend) => backend,
            Err(err) => {
                log::error!("Failed to load document {} ({}): {err}", info.id, info.name);
                if owns_buffer {
                    self.buffer = None;
                }
                return;
            }
        };

        let id = info.id;
        if let Err(err) = self.executor.add_document(info, backend) {
            log::error!("Failed to add document {id}: {err}");
        }

        if !owns_buffer {
            log::debug!("Document {id} loaded after its buffer was replaced");
            return;
        }
        if let Some(buffer) = self.buffer.take() {
            log::debug!("Flushing {} buffered actions for document {id}", buffer.actions.len());
            for action in buffer.actions {
                self.dispatch(action);
            }
        }
    }
}
