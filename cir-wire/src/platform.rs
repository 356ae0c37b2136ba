//! Platform compatibility marker
//!
//! The optional second preamble byte records the byte order the payload was
//! written with, so a reader on any host decodes multi-byte fields correctly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte order of multi-byte fields in a stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endian {
    #[default]
    Little,
    Big,
}

impl Endian {
    /// Marker byte for little-endian payloads ('L')
    pub const LITTLE_MARKER: u8 = 0x4C;
    /// Marker byte for big-endian payloads ('B')
    pub const BIG_MARKER: u8 = 0x42;

    /// Byte order of the host
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endian::Big
        } else {
            Endian::Little
        }
    }

    pub fn marker(self) -> u8 {
        match self {
            Endian::Little => Self::LITTLE_MARKER,
            Endian::Big => Self::BIG_MARKER,
        }
    }

    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            Self::LITTLE_MARKER => Some(Endian::Little),
            Self::BIG_MARKER => Some(Endian::Big),
            _ => None,
        }
    }
}

impl fmt::Display for Endian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endian::Little => write!(f, "little-endian"),
            Endian::Big => write!(f, "big-endian"),
        }
    }
}
