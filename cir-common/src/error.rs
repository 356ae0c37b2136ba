//! Error handling for the C IR core
//!
//! This module defines the recoverable, caller-facing error tier and the
//! diagnostic reporting utilities used by the front-end boundary and the
//! stage context. Internal invariant failures live in [`crate::fatal`].

use crate::source_loc::SourceLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Recoverable IR errors, expected to be caught at call sites and turned
/// into diagnostics
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IrError {
    #[error("field '{name}' already exists in record")]
    FieldExists { name: String },

    #[error("record has no field named '{name}'")]
    FieldNotFound { name: String },

    #[error("index {index} is out of bounds (size {size})")]
    OutOfBounds { index: usize, size: usize },

    #[error("invalid type cast from {from} to {to}")]
    InvalidTypeCast { from: String, to: String },

    #[error("invalid arithmetic '{op}' on {category} value")]
    InvalidValueArithmetic { op: String, category: String },

    #[error("stage '{stage}' requires phase {required}, program is at {current}")]
    StageIncompatible {
        stage: String,
        required: String,
        current: String,
    },

    #[error("access violation: {message}")]
    AccessViolation { message: String },
}

pub type IrResult<T> = Result<T, IrError>;

impl IrError {
    /// Create an invalid-type-cast error from anything printable
    pub fn invalid_cast(from: impl fmt::Display, to: impl fmt::Display) -> Self {
        IrError::InvalidTypeCast {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    /// Create an invalid-value-arithmetic error
    pub fn invalid_arithmetic(op: impl fmt::Display, category: impl fmt::Display) -> Self {
        IrError::InvalidValueArithmetic {
            op: op.to_string(),
            category: category.to_string(),
        }
    }

    /// Create an access-violation error
    pub fn access_violation(message: impl Into<String>) -> Self {
        IrError::AccessViolation {
            message: message.into(),
        }
    }

    /// Turn this error into an error diagnostic
    pub fn to_diagnostic(&self, location: Option<SourceLocation>) -> Diagnostic {
        Diagnostic::error(self.to_string(), location)
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Fatal,
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Fatal => write!(f, "fatal"),
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with optional location, severity and trailing notes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub notes: Vec<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, message: String, location: Option<SourceLocation>) -> Self {
        Self {
            severity,
            message,
            location,
            notes: Vec::new(),
        }
    }

    pub fn fatal(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(Severity::Fatal, message, location)
    }

    pub fn error(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(Severity::Error, message, location)
    }

    pub fn warning(message: String, location: Option<SourceLocation>) -> Self {
        Self::new(Severity::Warning, message, location)
    }

    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(location) = &self.location {
            write!(f, "{location}: ")?;
        }
        write!(f, "{}: {}", self.severity, self.message)?;

        for note in &self.notes {
            write!(f, "\n  note: {note}")?;
        }

        Ok(())
    }
}

/// Collects diagnostics and keeps error and warning tallies
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an already-built diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Fatal | Severity::Error => self.error_count += 1,
            Severity::Warning => self.warning_count += 1,
        }
        self.diagnostics.push(diagnostic);
    }

    /// Report a recoverable IR error as an error diagnostic
    pub fn report_error(&mut self, error: &IrError, location: Option<SourceLocation>) {
        self.push(error.to_diagnostic(location));
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn has_fatal(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Fatal)
    }

    /// Fatal and error diagnostics together
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// One-line tally, e.g. `1 error, 2 warnings`
    pub fn summary(&self) -> String {
        fn counted(n: usize, what: &str) -> String {
            format!("{n} {what}{}", if n == 1 { "" } else { "s" })
        }
        match (self.error_count, self.warning_count) {
            (0, 0) => "no diagnostics".to_string(),
            (e, 0) => counted(e, "error"),
            (0, w) => counted(w, "warning"),
            (e, w) => format!("{}, {}", counted(e, "error"), counted(w, "warning")),
        }
    }
}
