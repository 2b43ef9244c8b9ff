//! Binary wire codec for actions, stream actions and recorded pages.
//!
//! Every frame starts with a big-endian `i32` length counting the bytes that
//! follow it, so a reader that does not understand a frame can still skip it.

mod action;
mod reader;
mod recorded;
mod stream;
mod writer;

pub use action::{decode_action, encode_action, read_action};
pub use reader::ProgressiveReader;
pub use recorded::{decode_records, encode_records, read_recorded_page};
pub use stream::{decode_stream_action, encode_stream_action, read_stream_action};
pub use writer::FrameWriter;

use thiserror::Error;

/// Bytes of an action frame header after the length prefix (tag + timestamp).
pub const ACTION_HEADER_LEN: usize = 5;

/// Bytes of a stream action frame header after the length prefix (tag).
pub const STREAM_HEADER_LEN: usize = 1;

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Read of {requested} bytes at offset {offset} exceeds buffer of {len} bytes")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        len: usize,
    },
    #[error("Not implemented: {family} type {tag}")]
    NotImplemented { family: &'static str, tag: u8 },
    #[error("Corrupt data: {0}")]
    Corrupt(String),
    #[error("Frame declared {declared} payload bytes but {consumed} were consumed")]
    LengthMismatch { declared: usize, consumed: usize },
    #[error("Frame of {got} bytes exceeds the {max} byte limit")]
    FrameTooLarge { max: usize, got: usize },
    #[error("String of {0} bytes does not fit a 32-bit length")]
    StringTooLong(usize),
    #[error("Invalid UTF-8 in string field")]
    InvalidString,
}

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Read a declared length field and reject negative values.
pub(crate) fn checked_length(value: i32, what: &str) -> CodecResult<usize> {
    usize::try_from(value).map_err(|_| CodecError::Corrupt(format!("negative {what} length {value}")))
}
