//! # Primitives
//!
//! Newtypes and constants shared across the engine.
//!
//! `Name` and `Count` are deliberately small: validation happens once at the
//! boundary, and everything downstream can rely on the invariants.

use crate::TallyError;
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Maximum accepted participant name length (in characters).
pub const MAX_NAME_LEN: usize = 64;

/// Default marker class applied by a pulse.
///
/// The value is styling, not algorithm: an external stylesheet keys a CSS
/// transition on this token. Overridable at startup.
pub const DEFAULT_PULSE_CLASS: &str = "pulse";

/// Default pulse duration in milliseconds. Overridable at startup.
pub const DEFAULT_PULSE_DURATION_MS: u64 = 300;

// =============================================================================
// NAME
// =============================================================================

/// A validated participant name.
///
/// Invariants: trimmed, non-empty, at most [`MAX_NAME_LEN`] characters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Name(String);

impl Name {
    /// Validate and construct a name.
    ///
    /// Leading/trailing whitespace is stripped before validation, matching
    /// the join form behavior.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TallyError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TallyError::InvalidName(String::from("empty name")));
        }
        if trimmed.chars().count() > MAX_NAME_LEN {
            return Err(TallyError::InvalidName(format!(
                "name longer than {MAX_NAME_LEN} characters"
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// View the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// COUNT
// =============================================================================

/// A drink count.
///
/// Saturating in both directions: incrementing never overflows, decrementing
/// never goes below zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Count(u64);

impl Count {
    /// Construct a count with an explicit value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The zero count.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Raw value.
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Count plus one, saturating.
    #[must_use]
    pub const fn increment(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Count minus one, floored at zero.
    #[must_use]
    pub const fn decrement(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl fmt::Display for Count {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_trims_whitespace() {
        let name = Name::new("  Alice  ").expect("valid name");
        assert_eq!(name.as_str(), "Alice");
    }

    #[test]
    fn name_rejects_empty() {
        assert!(Name::new("").is_err());
        assert!(Name::new("   ").is_err());
    }

    #[test]
    fn name_rejects_too_long() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(Name::new(&long).is_err());
        let ok = "x".repeat(MAX_NAME_LEN);
        assert!(Name::new(&ok).is_ok());
    }

    #[test]
    fn count_decrement_floors_at_zero() {
        let count = Count::zero();
        assert_eq!(count.decrement(), Count::zero());
    }

    #[test]
    fn count_increment_saturates() {
        let count = Count::new(u64::MAX);
        assert_eq!(count.increment().value(), u64::MAX);
    }
}
