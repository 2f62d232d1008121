//! # Roster
//!
//! The participant -> drink count bookkeeping.
//!
//! Uses `BTreeMap` exclusively for deterministic ordering. The roster is the
//! single source of truth for counts; persistence layers serialize whole
//! snapshots of it.

use crate::{Count, Name, TallyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The participant roster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    /// Participant storage: name -> drink count.
    entries: BTreeMap<Name, Count>,
}

impl Roster {
    /// Create an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a participant with a zero count.
    ///
    /// Joining is idempotent: an existing participant keeps their count.
    /// Returns `true` if the participant was newly added.
    pub fn join(&mut self, name: Name) -> bool {
        if self.entries.contains_key(&name) {
            return false;
        }
        self.entries.insert(name, Count::zero());
        true
    }

    /// Increment a participant's count by one (saturating).
    ///
    /// Fails with [`TallyError::UnknownParticipant`] if the name is not on
    /// the roster.
    pub fn increment(&mut self, name: &Name) -> Result<Count, TallyError> {
        let count = self
            .entries
            .get_mut(name)
            .ok_or_else(|| TallyError::UnknownParticipant(name.to_string()))?;
        *count = count.increment();
        Ok(*count)
    }

    /// Decrement a participant's count by one, floored at zero.
    pub fn decrement(&mut self, name: &Name) -> Result<Count, TallyError> {
        let count = self
            .entries
            .get_mut(name)
            .ok_or_else(|| TallyError::UnknownParticipant(name.to_string()))?;
        *count = count.decrement();
        Ok(*count)
    }

    /// Put a participant back with an explicit count.
    ///
    /// Used when rehydrating a roster from persistent storage; overwrites
    /// any existing entry for the name.
    pub fn restore(&mut self, name: Name, count: Count) {
        self.entries.insert(name, count);
    }

    /// Look up a participant's count.
    #[must_use]
    pub fn count(&self, name: &Name) -> Option<Count> {
        self.entries.get(name).copied()
    }

    /// Check whether a participant is on the roster.
    #[must_use]
    pub fn contains(&self, name: &Name) -> bool {
        self.entries.contains_key(name)
    }

    /// All participants ordered by count descending, ties broken by name
    /// ascending.
    ///
    /// The tiebreak keeps the ordering fully deterministic; the original
    /// service left ties in insertion order.
    #[must_use]
    pub fn leaderboard(&self) -> Vec<(Name, Count)> {
        let mut rows: Vec<(Name, Count)> = self
            .entries
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        rows.sort_by(|(a_name, a_count), (b_name, b_count)| {
            b_count.cmp(a_count).then_with(|| a_name.cmp(b_name))
        });
        rows
    }

    /// Iterate participants in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&Name, Count)> {
        self.entries.iter().map(|(name, count)| (name, *count))
    }

    /// Number of participants.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the roster has no participants.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
