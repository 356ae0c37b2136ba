//! C IR core - Common Errors, Diagnostics and Source Locations
//! 
//! This crate contains the error tiers, diagnostic reporting and source
//! location types shared by the wire protocol, the IR crate and the driver.

pub mod error;
pub mod fatal;
pub mod source_loc;

pub use error::{Diagnostic, ErrorReporter, IrError, IrResult, Severity};
pub use source_loc::{SourceLocation, SourceTracker};
