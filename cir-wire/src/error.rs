//! Errors raised while reading an envelope

use thiserror::Error;

/// Malformed or truncated envelope data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    #[error("unexpected end of stream: need {needed} byte(s) at offset {offset}")]
    UnexpectedEnd { needed: usize, offset: usize },

    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    #[error("unknown {what} tag {tag:#04x}")]
    UnknownTag { what: &'static str, tag: u8 },

    #[error("{what} length {len} exceeds the remaining {remaining} byte(s)")]
    LengthOverflow {
        what: &'static str,
        len: usize,
        remaining: usize,
    },

    #[error("malformed envelope: {message}")]
    Malformed { message: String },
}

impl WireError {
    pub fn unknown_tag(what: &'static str, tag: u8) -> Self {
        WireError::UnknownTag { what, tag }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        WireError::Malformed {
            message: message.into(),
        }
    }
}

pub type WireResult<T> = Result<T, WireError>;
