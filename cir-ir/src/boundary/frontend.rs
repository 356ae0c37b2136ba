//! Front-end boundary: pulling source text and pushing diagnostics back

use cir_common::{Diagnostic, ErrorReporter, SourceTracker};
use log::{debug, warn};

/// Name and size of a translation unit as reported by its reader
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitMetadata {
    pub name: String,
    pub size: usize,
}

/// Pull-based source of raw bytes. `next_chunk` returns `None` at the end.
pub trait SourceReader {
    fn next_chunk(&mut self) -> Option<Vec<u8>>;

    fn metadata(&self) -> UnitMetadata;
}

/// Receiver of front-end diagnostics
pub trait DiagnosticSink {
    fn report(&mut self, message: &str, fatal: bool);
}

impl<F> DiagnosticSink for F
where
    F: FnMut(&str, bool),
{
    fn report(&mut self, message: &str, fatal: bool) {
        self(message, fatal)
    }
}

impl DiagnosticSink for ErrorReporter {
    fn report(&mut self, message: &str, fatal: bool) {
        let diagnostic = if fatal {
            Diagnostic::fatal(message.to_string(), None)
        } else {
            Diagnostic::warning(message.to_string(), None)
        };
        self.push(diagnostic);
    }
}

/// Drain `reader` into a string. Invalid UTF-8 is reported to `sink` as a
/// fatal diagnostic and yields `None`.
pub fn read_source(reader: &mut dyn SourceReader, sink: &mut dyn DiagnosticSink) -> Option<String> {
    let metadata = reader.metadata();
    let mut bytes = Vec::with_capacity(metadata.size);
    while let Some(chunk) = reader.next_chunk() {
        bytes.extend_from_slice(&chunk);
    }
    if bytes.len() != metadata.size {
        debug!(
            "'{}' announced {} byte(s), read {}",
            metadata.name,
            metadata.size,
            bytes.len()
        );
    }

    match String::from_utf8(bytes) {
        Ok(text) => Some(text),
        Err(err) => {
            let offset = err.utf8_error().valid_up_to();
            let mut tracker = SourceTracker::new();
            tracker.advance_str(&String::from_utf8_lossy(&err.as_bytes()[..offset]));
            warn!("'{}' is not valid UTF-8", metadata.name);
            sink.report(
                &format!(
                    "{}:{}: invalid UTF-8 at byte {offset}",
                    metadata.name,
                    tracker.location()
                ),
                true,
            );
            None
        }
    }
}

/// In-memory reader handing out fixed-size chunks
#[derive(Debug, Clone)]
pub struct ChunkedSource {
    name: String,
    bytes: Vec<u8>,
    chunk_size: usize,
    offset: usize,
}

impl ChunkedSource {
    pub const DEFAULT_CHUNK_SIZE: usize = 4096;

    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self::with_chunk_size(name, bytes, Self::DEFAULT_CHUNK_SIZE)
    }

    /// A zero chunk size is treated as one byte per chunk
    pub fn with_chunk_size(name: impl Into<String>, bytes: impl Into<Vec<u8>>, chunk_size: usize) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
            chunk_size: chunk_size.max(1),
            offset: 0,
        }
    }
}

impl SourceReader for ChunkedSource {
    fn next_chunk(&mut self) -> Option<Vec<u8>> {
        if self.offset >= self.bytes.len() {
            return None;
        }
        let end = (self.offset + self.chunk_size).min(self.bytes.len());
        let chunk = self.bytes[self.offset..end].to_vec();
        self.offset = end;
        Some(chunk)
    }

    fn metadata(&self) -> UnitMetadata {
        UnitMetadata {
            name: self.name.clone(),
            size: self.bytes.len(),
        }
    }
}
