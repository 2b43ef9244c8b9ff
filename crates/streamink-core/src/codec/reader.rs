//! Cursor over an immutable byte buffer.

use super::{CodecError, CodecResult};

/// Progressive reader: every read advances the cursor, nothing rewinds it.
///
/// Multi-byte reads are big-endian unless the method name ends in `_le`.
/// A read that would run past the end fails with [`CodecError::OutOfBounds`]
/// and leaves the cursor where it was.
#[derive(Debug, Clone)]
pub struct ProgressiveReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> ProgressiveReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    /// Current cursor position.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the cursor.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// Check if every byte has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Take the next `n` bytes as a slice.
    pub fn read_slice(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        let end = self
            .offset
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or(CodecError::OutOfBounds {
                offset: self.offset,
                requested: n,
                len: self.data.len(),
            })?;
        let slice = &self.data[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> CodecResult<()> {
        self.read_slice(n).map(|_| ())
    }

    /// Split off the next `n` bytes into a new reader.
    ///
    /// The parent cursor moves past the sub-range immediately, so the
    /// sub-reader is the only way to look at those bytes.
    pub fn sub_reader(&mut self, n: usize) -> CodecResult<ProgressiveReader<'a>> {
        self.read_slice(n).map(ProgressiveReader::new)
    }

    fn read_array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let slice = self.read_slice(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> CodecResult<u8> {
        self.read_array::<1>().map(|b| b[0])
    }

    pub fn read_i8(&mut self) -> CodecResult<i8> {
        self.read_array::<1>().map(i8::from_be_bytes)
    }

    pub fn read_u16(&mut self) -> CodecResult<u16> {
        self.read_array().map(u16::from_be_bytes)
    }

    pub fn read_i16(&mut self) -> CodecResult<i16> {
        self.read_array().map(i16::from_be_bytes)
    }

    pub fn read_u32(&mut self) -> CodecResult<u32> {
        self.read_array().map(u32::from_be_bytes)
    }

    pub fn read_i32(&mut self) -> CodecResult<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> CodecResult<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    pub fn read_f32(&mut self) -> CodecResult<f32> {
        self.read_array().map(f32::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> CodecResult<f64> {
        self.read_array().map(f64::from_be_bytes)
    }

    pub fn read_u16_le(&mut self) -> CodecResult<u16> {
        self.read_array().map(u16::from_le_bytes)
    }

    pub fn read_i16_le(&mut self) -> CodecResult<i16> {
        self.read_array().map(i16::from_le_bytes)
    }

    pub fn read_u32_le(&mut self) -> CodecResult<u32> {
        self.read_array().map(u32::from_le_bytes)
    }

    pub fn read_i32_le(&mut self) -> CodecResult<i32> {
        self.read_array().map(i32::from_le_bytes)
    }

    pub fn read_i64_le(&mut self) -> CodecResult<i64> {
        self.read_array().map(i64::from_le_bytes)
    }

    pub fn read_f32_le(&mut self) -> CodecResult<f32> {
        self.read_array().map(f32::from_le_bytes)
    }

    pub fn read_f64_le(&mut self) -> CodecResult<f64> {
        self.read_array().map(f64::from_le_bytes)
    }

    /// Read a string field of exactly `len` bytes.
    ///
    /// The text ends at the first zero byte or at `len`, whichever comes
    /// first; the cursor always moves by `len`.
    pub fn read_string(&mut self, len: usize) -> CodecResult<String> {
        let bytes = self.read_slice(len)?;
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end])
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidString)
    }

    /// Read an `i32` byte length followed by that many string bytes.
    pub fn read_prefixed_string(&mut self) -> CodecResult<String> {
        let len = super::checked_length(self.read_i32()?, "string")?;
        self.read_string(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_big_endian_reads() {
        let data = [0x00, 0x00, 0x01, 0x02, 0xff, 0xfe];
        let mut reader = ProgressiveReader::new(&data);
        assert_eq!(reader.read_i32().unwrap(), 0x0102);
        assert_eq!(reader.read_i16().unwrap(), -2);
        assert!(reader.is_exhausted());
    }

    #[test]
    fn test_little_endian_reads() {
        let data = [0x02, 0x01, 0x00, 0x00];
        let mut reader = ProgressiveReader::new(&data);
        assert_eq!(reader.read_u32_le().unwrap(), 0x0102);
    }

    #[test]
    fn test_floats() {
        let mut data = Vec::new();
        data.extend_from_slice(&1.5f32.to_be_bytes());
        data.extend_from_slice(&(-0.25f64).to_be_bytes());
        let mut reader = ProgressiveReader::new(&data);
        assert_eq!(reader.read_f32().unwrap(), 1.5);
        assert_eq!(reader.read_f64().unwrap(), -0.25);
    }

    #[test]
    fn test_out_of_bounds_keeps_cursor() {
        let data = [1u8, 2, 3];
        let mut reader = ProgressiveReader::new(&data);
        assert_eq!(reader.read_u8().unwrap(), 1);
        let err = reader.read_i32().unwrap_err();
        assert_eq!(
            err,
            CodecError::OutOfBounds {
                offset: 1,
                requested: 4,
                len: 3
            }
        );
        assert_eq!(reader.offset(), 1);
        assert!(reader.read_i64().is_err());
        assert!(reader.read_f64().is_err());
        assert_eq!(reader.read_u16().unwrap(), 0x0203);
        assert!(reader.read_u8().is_err());
    }

    #[test]
    fn test_string_stops_at_zero() {
        let data = b"abc\0\0xyz";
        let mut reader = ProgressiveReader::new(data);
        assert_eq!(reader.read_string(5).unwrap(), "abc");
        assert_eq!(reader.offset(), 5);
        assert_eq!(reader.read_string(3).unwrap(), "xyz");
    }

    #[test]
    fn test_empty_string() {
        let mut reader = ProgressiveReader::new(&[]);
        assert_eq!(reader.read_string(0).unwrap(), "");
    }

    #[test]
    fn test_sub_reader_consumes_range() {
        let data = [1u8, 2, 3, 4, 5];
        let mut reader = ProgressiveReader::new(&data);
        let mut sub = reader.sub_reader(3).unwrap();
        assert_eq!(reader.offset(), 3);
        assert_eq!(sub.read_u8().unwrap(), 1);
        assert_eq!(sub.remaining(), 2);
        assert!(sub.read_i32().is_err());
        assert_eq!(reader.read_u8().unwrap(), 4);
    }

    #[test]
    fn test_skip_past_end_fails() {
        let mut reader = ProgressiveReader::new(&[0u8; 2]);
        assert!(reader.skip(3).is_err());
        reader.skip(2).unwrap();
        assert!(reader.is_exhausted());
    }
}
