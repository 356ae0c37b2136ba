//! Byte stream writer/reader
//!
//! `ByteStream` is a growable buffer with an explicit read cursor. Writes
//! always append; reads advance the cursor and fail with
//! [`WireError::UnexpectedEnd`] instead of reading past the end.

use crate::error::{WireError, WireResult};
use crate::platform::Endian;
use cir_common::fatal;
use log::{debug, trace};

/// Envelope buffer with a settable read offset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteStream {
    buf: Vec<u8>,
    offset: usize,
    endian: Endian,
    magic_written: bool,
}

macro_rules! put_int {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self, value: $ty) {
            let bytes = match self.endian {
                Endian::Little => value.to_le_bytes(),
                Endian::Big => value.to_be_bytes(),
            };
            self.buf.extend_from_slice(&bytes);
        }
    };
}

macro_rules! get_int {
    ($name:ident, $ty:ty) => {
        pub fn $name(&mut self) -> WireResult<$ty> {
            let bytes = self.take::<{ std::mem::size_of::<$ty>() }>()?;
            Ok(match self.endian {
                Endian::Little => <$ty>::from_le_bytes(bytes),
                Endian::Big => <$ty>::from_be_bytes(bytes),
            })
        }
    };
}

impl ByteStream {
    /// Create an empty little-endian stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty stream writing with the given byte order
    pub fn with_endian(endian: Endian) -> Self {
        Self {
            endian,
            ..Self::default()
        }
    }

    /// Wrap existing bytes for reading (little-endian until a platform
    /// marker says otherwise)
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            buf: bytes.into(),
            ..Self::default()
        }
    }

    pub fn endian(&self) -> Endian {
        self.endian
    }

    pub fn set_endian(&mut self, endian: Endian) {
        self.endian = endian;
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Current read offset
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Place the read cursor explicitly. Offsets past the end are clamped.
    pub fn start_offset(&mut self, offset: usize) {
        self.offset = offset.min(self.buf.len());
    }

    /// Rewind the read cursor to the beginning of the buffer
    pub fn reset_offset(&mut self) {
        self.offset = 0;
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.offset
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    // Preamble

    /// Write the one-byte magic marker. Only an empty buffer accepts it.
    pub fn set_magic(&mut self, magic: u8) -> bool {
        if !self.buf.is_empty() {
            debug!("ignoring magic {magic:#04x}: buffer already holds {} byte(s)", self.buf.len());
            return false;
        }
        self.buf.push(magic);
        self.magic_written = true;
        true
    }

    /// Write the platform marker for this stream's byte order. Only an empty
    /// or magic-only buffer accepts it.
    pub fn set_platform_compat(&mut self) -> bool {
        let preamble_len = usize::from(self.magic_written);
        if self.buf.len() != preamble_len {
            debug!("ignoring platform marker: payload already started");
            return false;
        }
        self.buf.push(self.endian.marker());
        true
    }

    /// Consume the magic byte if it matches `expected`. On mismatch the
    /// cursor is rolled back so the byte remains part of the payload.
    pub fn validate_magic(&mut self, expected: u8) -> bool {
        match self.get_byte() {
            Ok(found) if found == expected => true,
            Ok(found) => {
                trace!("magic mismatch: expected {expected:#04x}, found {found:#04x}");
                self.offset -= 1;
                false
            }
            Err(_) => false,
        }
    }

    /// Consume a platform marker if one is present and adopt its byte order.
    /// Anything else is rolled back.
    pub fn validate_platform_compat(&mut self) -> bool {
        match self.get_byte() {
            Ok(marker) => match Endian::from_marker(marker) {
                Some(endian) => {
                    self.endian = endian;
                    true
                }
                None => {
                    self.offset -= 1;
                    false
                }
            },
            Err(_) => false,
        }
    }

    /// Consume a full magic + platform preamble. A magic byte that is not
    /// followed by a platform marker is treated as payload and rolled back.
    pub fn validate_preamble(&mut self, magic: u8) -> bool {
        let start = self.offset;
        if !self.validate_magic(magic) {
            return false;
        }
        if self.validate_platform_compat() {
            return true;
        }
        self.offset = start;
        false
    }

    // Writers

    put_int!(put_short, u16);
    put_int!(put_word, u32);
    put_int!(put_dword, u64);

    pub fn put_byte(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.put_byte(u8::from(value));
    }

    /// Append raw bytes without a length prefix
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Write a 4-byte count
    pub fn put_len(&mut self, len: usize) {
        match u32::try_from(len) {
            Ok(count) => self.put_word(count),
            Err(_) => fatal!("length {len} does not fit a 32-bit envelope count"),
        }
    }

    /// Write a length-prefixed UTF-8 string
    pub fn put_string(&mut self, value: &str) {
        self.put_len(value.len());
        self.put_bytes(value.as_bytes());
    }

    /// Write a count followed by every element
    pub fn write_iter<I, F>(&mut self, items: I, mut write: F)
    where
        I: IntoIterator,
        I::IntoIter: ExactSizeIterator,
        F: FnMut(&mut ByteStream, I::Item),
    {
        let items = items.into_iter();
        self.put_len(items.len());
        for item in items {
            write(self, item);
        }
    }

    /// Embed another stream as a length-prefixed sub-buffer
    pub fn put_stream(&mut self, inner: &ByteStream) {
        self.put_len(inner.len());
        self.put_bytes(inner.as_bytes());
    }

    // Readers

    fn take<const N: usize>(&mut self) -> WireResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.get_bytes(N)?);
        Ok(out)
    }

    get_int!(get_short, u16);
    get_int!(get_word, u32);
    get_int!(get_dword, u64);

    pub fn get_byte(&mut self) -> WireResult<u8> {
        let [byte] = self.take::<1>()?;
        Ok(byte)
    }

    pub fn get_bool(&mut self) -> WireResult<bool> {
        Ok(self.get_byte()? != 0)
    }

    /// Read `n` raw bytes
    pub fn get_bytes(&mut self, n: usize) -> WireResult<&[u8]> {
        if self.remaining() < n {
            return Err(WireError::UnexpectedEnd {
                needed: n,
                offset: self.offset,
            });
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.buf[start..self.offset])
    }

    /// Read a 4-byte count and check it against the bytes left, assuming
    /// each element takes at least `min_element` bytes.
    pub fn get_len(&mut self, what: &'static str, min_element: usize) -> WireResult<usize> {
        let len = self.get_word()? as usize;
        let remaining = self.remaining();
        if len.saturating_mul(min_element) > remaining {
            return Err(WireError::LengthOverflow { what, len, remaining });
        }
        Ok(len)
    }

    /// Read a length-prefixed UTF-8 string
    pub fn get_string(&mut self) -> WireResult<String> {
        let len = self.get_len("string", 1)?;
        let offset = self.offset;
        let bytes = self.get_bytes(len)?.to_vec();
        String::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8 { offset })
    }

    /// Read a count followed by that many elements
    pub fn read_seq<T, F>(&mut self, mut read: F) -> WireResult<Vec<T>>
    where
        F: FnMut(&mut ByteStream) -> WireResult<T>,
    {
        let len = self.get_len("sequence", 0)?;
        let mut items = Vec::with_capacity(len.min(self.remaining()));
        for _ in 0..len {
            items.push(read(self)?);
        }
        Ok(items)
    }

    /// Read an embedded sub-buffer. The result inherits this stream's byte
    /// order and starts at offset 0.
    pub fn get_stream(&mut self) -> WireResult<ByteStream> {
        let len = self.get_len("embedded stream", 1)?;
        let bytes = self.get_bytes(len)?.to_vec();
        Ok(ByteStream {
            buf: bytes,
            offset: 0,
            endian: self.endian,
            magic_written: false,
        })
    }
}
