// SPDX-License-Identifier: Apache-2.0
//! A small big-endian writer/reader pair, shared by `save::save_state` and
//! `save::load_state`. Matches spec.md §4.2's "inputs are serialized
//! big-endian for multi-byte integers" rule, kept consistent between the
//! world hash (`dominium_hash::H64`) and the save format
//! (`SPEC_FULL.md` §4.8B).

use thiserror::Error;

/// Errors produced while decoding a canonical byte stream.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// The stream ended before the expected number of bytes were read.
    #[error("unexpected end of stream, wanted {wanted} more bytes")]
    UnexpectedEof {
        /// How many more bytes the read required.
        wanted: usize,
    },
}

/// An append-only big-endian byte writer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    /// An empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the writer, returning the accumulated bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Appends one byte.
    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    /// Appends a 16-bit value, big-endian.
    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a 32-bit value, big-endian.
    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a signed 32-bit value, big-endian.
    pub fn write_i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a 64-bit value, big-endian.
    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a signed 64-bit value, big-endian.
    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends `bytes` verbatim, prefixed by its length as a `u32`.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.write_u32(u32::try_from(bytes.len()).unwrap_or(u32::MAX));
        self.buf.extend_from_slice(bytes);
    }
}

/// A forward-only big-endian byte reader over a borrowed slice.
#[derive(Debug)]
pub struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// Wraps `buf` for sequential reading from the start.
    #[must_use]
    pub const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.pos + len > self.buf.len() {
            return Err(CodecError::UnexpectedEof { wanted: len });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Reads one byte.
    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.take(1)?[0])
    }

    /// Reads a big-endian 16-bit value.
    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        let bytes: [u8; 2] = self.take(2)?.try_into().unwrap_or([0; 2]);
        Ok(u16::from_be_bytes(bytes))
    }

    /// Reads a big-endian 32-bit value.
    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap_or([0; 4]);
        Ok(u32::from_be_bytes(bytes))
    }

    /// Reads a big-endian signed 32-bit value.
    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        let bytes: [u8; 4] = self.take(4)?.try_into().unwrap_or([0; 4]);
        Ok(i32::from_be_bytes(bytes))
    }

    /// Reads a big-endian 64-bit value.
    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap_or([0; 8]);
        Ok(u64::from_be_bytes(bytes))
    }

    /// Reads a big-endian signed 64-bit value.
    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        let bytes: [u8; 8] = self.take(8)?.try_into().unwrap_or([0; 8]);
        Ok(i64::from_be_bytes(bytes))
    }

    /// Reads a length-prefixed byte string written by
    /// [`Writer::write_bytes`].
    pub fn read_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_every_primitive() {
        let mut writer = Writer::new();
        writer.write_u8(0xab);
        writer.write_u16(0x1234);
        writer.write_u32(0x1122_3344);
        writer.write_i32(-7);
        writer.write_u64(0x0011_2233_4455_6677);
        writer.write_i64(-123_456_789_012);
        writer.write_bytes(b"hello");
        let bytes = writer.into_bytes();

        let mut reader = Reader::new(&bytes);
        assert_eq!(reader.read_u8().unwrap(), 0xab);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0x1122_3344);
        assert_eq!(reader.read_i32().unwrap(), -7);
        assert_eq!(reader.read_u64().unwrap(), 0x0011_2233_4455_6677);
        assert_eq!(reader.read_i64().unwrap(), -123_456_789_012);
        assert_eq!(reader.read_bytes().unwrap(), b"hello");
    }

    #[test]
    fn truncated_stream_is_an_error_not_a_panic() {
        let mut reader = Reader::new(&[0x01]);
        assert_eq!(
            reader.read_u32(),
            Err(CodecError::UnexpectedEof { wanted: 4 })
        );
    }
}
