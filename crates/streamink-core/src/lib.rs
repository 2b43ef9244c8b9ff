//! StreamInk Core Library
//!
//! Wire codecs, page model, drawing tools and stream replay for the StreamInk
//! lecture viewer. Rendering lives in `streamink-render`.

pub mod action;
pub mod codec;
pub mod config;
pub mod document;
pub mod page;
pub mod player;
pub mod processor;
pub mod shapes;
pub mod stream;
pub mod tools;
pub mod viewer;

pub use action::{Action, ActionKind, ActionType, BrushSpec, KeyEvent, PenPoint};
pub use codec::{CodecError, CodecResult, ProgressiveReader};
pub use config::{CodecConfig, Config, ConfigError, CorruptLengthPolicy, PlayerConfig, UnknownActionPolicy};
pub use document::{BlankDocument, DocumentBackend, LoadError, PageImage};
pub use page::{Page, PageError, PageEvent, PageEventKind};
pub use player::{ActionExecutor, StreamActionPlayer};
pub use processor::{ExecutorError, StreamActionProcessor, StreamExecutor};
pub use shapes::{Brush, Rgba, Shape, ShapeHandle};
pub use stream::{DocumentId, DocumentInfo, DocumentType, MediaKind, RecordedPage, StreamAction, StreamActionType};
pub use tools::{Tool, ToolController, ToolError, ToolState};
pub use viewer::{LoadedDocument, Viewer};
