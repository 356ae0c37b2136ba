//! Source location tracking for diagnostics and AST nodes
//!
//! Front ends hand the IR chunks of source text; AST nodes remember where
//! they came from as a (line, column) pair.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A location in a source unit (line and column are 1-based, 0 = unknown)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Location used for synthesized nodes
    pub fn dummy() -> Self {
        Self::new(0, 0)
    }

    pub fn is_dummy(&self) -> bool {
        self.line == 0 && self.column == 0
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Helper for tracking the current location while consuming source text
#[derive(Debug, Clone)]
pub struct SourceTracker {
    line: u32,
    column: u32,
}

impl SourceTracker {
    pub fn new() -> Self {
        Self { line: 1, column: 1 }
    }

    /// Get current location
    pub fn location(&self) -> SourceLocation {
        SourceLocation::new(self.line, self.column)
    }

    /// Advance by one character
    pub fn advance(&mut self, ch: char) {
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    /// Advance by a string
    pub fn advance_str(&mut self, s: &str) {
        for ch in s.chars() {
            self.advance(ch);
        }
    }
}

impl Default for SourceTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_location() {
        let loc = SourceLocation::new(42, 10);
        assert_eq!(loc.line, 42);
        assert_eq!(loc.column, 10);
        assert_eq!(format!("{}", loc), "42:10");
        assert!(!loc.is_dummy());
        assert!(SourceLocation::dummy().is_dummy());
    }

    #[test]
    fn test_location_ordering() {
        assert!(SourceLocation::new(1, 9) < SourceLocation::new(2, 1));
        assert!(SourceLocation::new(2, 1) < SourceLocation::new(2, 3));
    }

    #[test]
    fn test_source_tracker() {
        let mut tracker = SourceTracker::new();

        let start_loc = tracker.location();
        assert_eq!(start_loc, SourceLocation::new(1, 1));

        tracker.advance('h');
        tracker.advance('i');
        tracker.advance('\n');
        tracker.advance('t');

        assert_eq!(tracker.location(), SourceLocation::new(2, 2));
    }

    #[test]
    fn test_source_tracker_advance_str() {
        let mut tracker = SourceTracker::new();
        tracker.advance_str("hello\nworld");

        let end_loc = tracker.location();
        assert_eq!(end_loc.line, 2);
        assert_eq!(end_loc.column, 6); // "world" is 5 chars + 1 for 1-based
    }
}
