//! # Pulse State Model
//!
//! The pure half of the transient-marker ("pulse") engine.
//!
//! A pulse applies a marker class to a UI element for a fixed duration; an
//! external stylesheet keys a CSS transition on that class. The element is
//! modeled as an injected capability ([`ClassSet`]) so the engine is
//! testable without any real UI host. The timer half lives in the app layer
//! (apps/tally), which owns the async runtime.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

use crate::{DEFAULT_PULSE_CLASS, DEFAULT_PULSE_DURATION_MS};

// =============================================================================
// CLASS-SET CAPABILITY
// =============================================================================

/// Class-list mutation capability of a UI element.
///
/// All operations are set-semantic: adding a present token and removing an
/// absent token are no-ops, never errors.
pub trait ClassSet {
    /// Add a class token. Returns `true` if it was not already present.
    fn add(&mut self, class: &str) -> bool;

    /// Remove a class token. Returns `true` if it was present.
    fn remove(&mut self, class: &str) -> bool;

    /// Check whether a class token is present.
    fn contains(&self, class: &str) -> bool;
}

// =============================================================================
// MARKER SET
// =============================================================================

/// The concrete class set held per element.
///
/// `BTreeSet` keeps snapshots deterministic when serialized into API
/// responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerSet {
    classes: BTreeSet<String>,
}

impl MarkerSet {
    /// Create an empty marker set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot the active classes in deterministic order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.classes.iter().cloned().collect()
    }

    /// Number of active classes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether no classes are active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl ClassSet for MarkerSet {
    fn add(&mut self, class: &str) -> bool {
        self.classes.insert(class.to_string())
    }

    fn remove(&mut self, class: &str) -> bool {
        self.classes.remove(class)
    }

    fn contains(&self, class: &str) -> bool {
        self.classes.contains(class)
    }
}

// =============================================================================
// PULSE CONFIGURATION
// =============================================================================

/// Configuration for the pulse effect.
///
/// The marker name and duration encode a design choice (animation timing),
/// not an algorithmic necessity, so they are configuration rather than
/// hard-coded literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PulseConfig {
    /// The marker class applied for the duration of a pulse.
    pub class: String,

    /// How long the marker stays applied.
    pub duration: Duration,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            class: String::from(DEFAULT_PULSE_CLASS),
            duration: Duration::from_millis(DEFAULT_PULSE_DURATION_MS),
        }
    }
}

impl PulseConfig {
    /// Build a config with explicit values.
    #[must_use]
    pub fn new(class: impl Into<String>, duration: Duration) -> Self {
        Self {
            class: class.into(),
            duration,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
