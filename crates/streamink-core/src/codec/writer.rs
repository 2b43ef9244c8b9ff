//! Big-endian frame builder, the mirror of [`ProgressiveReader`](super::ProgressiveReader).

use super::{CodecError, CodecResult};

/// Growable big-endian byte buffer.
#[derive(Debug, Clone, Default)]
pub struct FrameWriter {
    buf: Vec<u8>,
}

impl FrameWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn put_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_i8(&mut self, value: i8) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f32(&mut self, value: f32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_f64(&mut self, value: f64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a byte length as `i32`, failing if it does not fit.
    pub fn put_len(&mut self, len: usize) -> CodecResult<()> {
        let len = i32::try_from(len).map_err(|_| CodecError::StringTooLong(len))?;
        self.put_i32(len);
        Ok(())
    }

    /// Write `i32 byteLength | bytes`.
    pub fn put_prefixed_string(&mut self, value: &str) -> CodecResult<()> {
        self.put_len(value.len())?;
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    /// Prepend the `i32` frame length and return the finished frame.
    pub fn finish_frame(self) -> CodecResult<Vec<u8>> {
        let len = i32::try_from(self.buf.len()).map_err(|_| CodecError::FrameTooLarge {
            max: i32::MAX as usize,
            got: self.buf.len(),
        })?;
        let mut frame = Vec::with_capacity(4 + self.buf.len());
        frame.extend_from_slice(&len.to_be_bytes());
        frame.extend_from_slice(&self.buf);
        Ok(frame)
    }

    /// Return the raw bytes without a length prefix.
    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
