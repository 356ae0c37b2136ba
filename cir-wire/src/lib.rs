//! C IR core - Wire Protocol
//!
//! A length-prefixed, magic-tagged binary stream used by every IR object to
//! persist itself. The layout of a buffer is
//!
//! ```text
//! [optional 1-byte magic][optional 1-byte platform marker][payload...]
//! ```
//!
//! Every variable-length field is a 4-byte count followed by its elements.

pub mod codec;
pub mod error;
pub mod options;
pub mod platform;
pub mod stream;

pub use codec::{WireDecode, WireEncode};
pub use error::{WireError, WireResult};
pub use options::EncodeOptions;
pub use platform::Endian;
pub use stream::ByteStream;
