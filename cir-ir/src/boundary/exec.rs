//! Execution boundary: handing an encoded program to an executor

use crate::program::Program;
use cir_wire::{ByteStream, EncodeOptions, WireDecode, WireEncode, WireError, WireResult};

/// Opaque encoded program as passed to an executor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramHandle {
    bytes: Vec<u8>,
}

impl ProgramHandle {
    pub fn new(program: &Program, options: &EncodeOptions) -> Self {
        Self {
            bytes: program.to_envelope(options),
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decode the wrapped program
    pub fn open(&self) -> WireResult<Program> {
        Program::from_envelope(&self.bytes)
    }
}

/// Argument or environment list. Each entry is written as a length-prefixed
/// byte chunk and the list ends with [`ChunkList::TERMINATOR`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkList {
    chunks: Vec<Vec<u8>>,
}

impl ChunkList {
    /// Length word standing in for the null entry
    pub const TERMINATOR: u32 = 0xFFFF_FFFF;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: impl Into<Vec<u8>>) {
        self.chunks.push(chunk.into());
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u8]> {
        self.chunks.iter().map(Vec::as_slice)
    }

    /// Entries as text, with invalid UTF-8 replaced
    pub fn to_strings(&self) -> Vec<String> {
        self.iter()
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect()
    }
}

impl<S: Into<Vec<u8>>> FromIterator<S> for ChunkList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            chunks: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl WireEncode for ChunkList {
    fn encode(&self, stream: &mut ByteStream) {
        for chunk in &self.chunks {
            stream.put_len(chunk.len());
            stream.put_bytes(chunk);
        }
        stream.put_word(Self::TERMINATOR);
    }
}

impl WireDecode for ChunkList {
    fn decode(stream: &mut ByteStream) -> WireResult<Self> {
        let mut chunks = Vec::new();
        loop {
            let len = stream.get_word()?;
            if len == Self::TERMINATOR {
                break;
            }
            let len = len as usize;
            if len > stream.remaining() {
                return Err(WireError::LengthOverflow {
                    what: "chunk",
                    len,
                    remaining: stream.remaining(),
                });
            }
            chunks.push(stream.get_bytes(len)?.to_vec());
        }
        Ok(Self { chunks })
    }
}

/// Something that can run an encoded program and report its exit status
pub trait Executor {
    fn execute(&mut self, program: &ProgramHandle, args: &ChunkList, env: &ChunkList) -> i32;
}
