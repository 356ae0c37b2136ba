//! Encoding configuration
//!
//! Loaded from JSON by the driver (`circ --config`) and applied whenever a
//! top-level object (program, AST) starts a fresh stream.

use crate::platform::Endian;
use crate::stream::ByteStream;
use serde::{Deserialize, Serialize};

/// How top-level envelopes are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    /// Emit the magic and platform preamble
    #[serde(default = "default_true")]
    pub preamble: bool,
    /// Byte order of multi-byte fields
    #[serde(default)]
    pub endian: Endian,
}

fn default_true() -> bool {
    true
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            preamble: true,
            endian: Endian::Little,
        }
    }
}

impl EncodeOptions {
    /// Start an empty stream with the configured byte order and, when
    /// enabled, the preamble for `magic`.
    pub fn begin(&self, magic: u8) -> ByteStream {
        let mut stream = ByteStream::with_endian(self.endian);
        if self.preamble {
            stream.set_magic(magic);
            stream.set_platform_compat();
        }
        stream
    }
}
