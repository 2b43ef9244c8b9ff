//! Transport-level events scoped to a session or document.

use crate::action::Action;

/// 64-bit document identity assigned by the presenter.
pub type DocumentId = i64;

/// Kind of shared document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum DocumentType {
    Pdf = 0,
    Whiteboard = 1,
    Screen = 2,
}

impl TryFrom<i8> for DocumentType {
    type Error = i8;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DocumentType::Pdf),
            1 => Ok(DocumentType::Whiteboard),
            2 => Ok(DocumentType::Screen),
            other => Err(other),
        }
    }
}

/// Document descriptor carried by the document lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
    pub id: DocumentId,
    pub doc_type: DocumentType,
    pub title: String,
    /// File reference the backend loads the document from.
    pub name: String,
    /// Unused by viewers, carried for wire compatibility.
    pub checksum: String,
}

impl DocumentInfo {
    pub fn new(id: DocumentId, doc_type: DocumentType, title: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            doc_type,
            title: title.into(),
            name: name.into(),
            checksum: String::new(),
        }
    }
}

/// Media track toggled by the presenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Audio,
    Camera,
    Screen,
}

/// A page's baseline and incremental action lists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordedPage {
    pub page_number: i32,
    pub timestamp: i32,
    /// State as of the initial load.
    pub static_actions: Vec<Action>,
    /// Later edits in timestamp order.
    pub playback_actions: Vec<Action>,
}

impl RecordedPage {
    pub fn new(page_number: i32, timestamp: i32, static_actions: Vec<Action>, playback_actions: Vec<Action>) -> Self {
        Self {
            page_number,
            timestamp,
            static_actions,
            playback_actions,
        }
    }

    /// All actions in replay order.
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.static_actions.iter().chain(self.playback_actions.iter())
    }
}

/// One-byte wire tag of a stream action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StreamActionType {
    DocumentCreated = 0,
    DocumentClosed = 1,
    DocumentSelected = 2,
    PageCreated = 3,
    PageDeleted = 4,
    PageSelected = 5,
    PageAction = 6,
    PageActionsBulk = 7,
    SpeechPublished = 8,
    CameraChange = 9,
    MicrophoneChange = 10,
    ScreenShareChange = 11,
}

impl TryFrom<u8> for StreamActionType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        use StreamActionType::*;
        const TABLE: [StreamActionType; 12] = [
            DocumentCreated,
            DocumentClosed,
            DocumentSelected,
            PageCreated,
            PageDeleted,
            PageSelected,
            PageAction,
            PageActionsBulk,
            SpeechPublished,
            CameraChange,
            MicrophoneChange,
            ScreenShareChange,
        ];
        TABLE.get(tag as usize).copied().ok_or(tag)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StreamAction {
    DocumentCreated(DocumentInfo),
    DocumentClosed(DocumentInfo),
    DocumentSelected(DocumentInfo),
    PageCreated {
        document_id: DocumentId,
        page_number: i32,
    },
    PageDeleted {
        document_id: DocumentId,
        page_number: i32,
    },
    PageSelected {
        document_id: DocumentId,
        page_number: i32,
    },
    PageAction {
        document_id: DocumentId,
        page_number: i32,
        action: Action,
    },
    PageActionsBulk {
        document_id: DocumentId,
        page: RecordedPage,
    },
    SpeechPublished {
        publisher_id: i64,
        display_name: String,
    },
    MediaChange {
        kind: MediaKind,
        enabled: bool,
    },
}

impl StreamAction {
    pub fn action_type(&self) -> StreamActionType {
        match self {
            StreamAction::DocumentCreated(_) => StreamActionType::DocumentCreated,
            StreamAction::DocumentClosed(_) => StreamActionType::DocumentClosed,
            StreamAction::DocumentSelected(_) => StreamActionType::DocumentSelected,
            StreamAction::PageCreated { .. } => StreamActionType::PageCreated,
            StreamAction::PageDeleted { .. } => StreamActionType::PageDeleted,
            StreamAction::PageSelected { .. } => StreamActionType::PageSelected,
            StreamAction::PageAction { .. } => StreamActionType::PageAction,
            StreamAction::PageActionsBulk { .. } => StreamActionType::PageActionsBulk,
            StreamAction::SpeechPublished { .. } => StreamActionType::SpeechPublished,
            StreamAction::MediaChange { kind, .. } => match kind {
                MediaKind::Camera => StreamActionType::CameraChange,
                MediaKind::Audio => StreamActionType::MicrophoneChange,
                MediaKind::Screen => StreamActionType::ScreenShareChange,
            },
        }
    }

    /// Document this event is scoped to, if any.
    pub fn document_id(&self) -> Option<DocumentId> {
        match self {
            StreamAction::DocumentCreated(info)
            | StreamAction::DocumentClosed(info)
            | StreamAction::DocumentSelected(info) => Some(info.id),
            StreamAction::PageCreated { document_id, .. }
            | StreamAction::PageDeleted { document_id, .. }
            | StreamAction::PageSelected { document_id, .. }
            | StreamAction::PageAction { document_id, .. }
            | StreamAction::PageActionsBulk { document_id, .. } => Some(*document_id),
            StreamAction::SpeechPublished { .. } | StreamAction::MediaChange { .. } => None,
        }
    }
}
