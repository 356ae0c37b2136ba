//! Compilation phase tracking

use serde::{Deserialize, Serialize};
use std::fmt;

/// Phases a program moves through, in order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Phase {
    #[default]
    Canonical = 0,
    Detection = 1,
    Substitution = 2,
    Validation = 3,
    StaticResolved = 4,
    AssertionPassed = 5,
    Compliant = 6,
    Optimized = 7,
    Stripped = 8,
}

impl Phase {
    const ALL: [Phase; 9] = [
        Phase::Canonical,
        Phase::Detection,
        Phase::Substitution,
        Phase::Validation,
        Phase::StaticResolved,
        Phase::AssertionPassed,
        Phase::Compliant,
        Phase::Optimized,
        Phase::Stripped,
    ];

    pub fn tag(self) -> u8 {
        self as u8
    }

    pub fn from_tag(tag: u8) -> Option<Self> {
        Self::ALL.get(usize::from(tag)).copied()
    }

    /// The following phase; `None` at the terminal phase
    pub fn successor(self) -> Option<Self> {
        Self::from_tag(self.tag() + 1)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Canonical => "canonical",
            Phase::Detection => "detection",
            Phase::Substitution => "substitution",
            Phase::Validation => "validation",
            Phase::StaticResolved => "static-resolved",
            Phase::AssertionPassed => "assertion-passed",
            Phase::Compliant => "compliant",
            Phase::Optimized => "optimized",
            Phase::Stripped => "stripped",
        };
        write!(f, "{name}")
    }
}

/// Monotonic phase counter. It never moves backwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionTracker {
    phase: Phase,
}

impl ConditionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn at(phase: Phase) -> Self {
        Self { phase }
    }

    pub fn current(&self) -> Phase {
        self.phase
    }

    /// Step to the next phase. A no-op at the terminal phase.
    pub fn advance(&mut self) -> Phase {
        if let Some(next) = self.phase.successor() {
            self.phase = next;
        }
        self.phase
    }

    /// Jump forward to `target`. Targets at or behind the current phase
    /// leave it unchanged.
    pub fn advance_to(&mut self, target: Phase) -> Phase {
        self.phase = self.phase.max(target);
        self.phase
    }

    pub fn is_at_least(&self, phase: Phase) -> bool {
        self.phase >= phase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_steps_reach_validation() {
        let mut tracker = ConditionTracker::new();
        tracker.advance();
        tracker.advance();
        assert_eq!(tracker.advance(), Phase::Validation);
        assert_eq!(tracker.current().tag(), 3);
    }

    #[test]
    fn test_advance_past_terminal_is_noop() {
        let mut tracker = ConditionTracker::new();
        tracker.advance_to(Phase::Stripped);
        assert_eq!(tracker.advance(), Phase::Stripped);
        assert_eq!(tracker.advance(), Phase::Stripped);
    }

    #[test]
    fn test_never_moves_backwards() {
        let mut tracker = ConditionTracker::new();
        tracker.advance_to(Phase::Compliant);
        assert_eq!(tracker.advance_to(Phase::Detection), Phase::Compliant);
        assert!(tracker.is_at_least(Phase::Validation));
        assert!(!tracker.is_at_least(Phase::Optimized));
    }

    #[test]
    fn test_phase_tags() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_tag(phase.tag()), Some(phase));
        }
        assert_eq!(Phase::from_tag(9), None);
        assert_eq!(Phase::Stripped.successor(), None);
        assert_eq!(Phase::StaticResolved.to_string(), "static-resolved");
    }
}
