//! # Tally Core
//!
//! The deterministic engine for Tally, a party drink-counter service.
//!
//! This crate holds THE LOGIC only:
//! - [`roster`]: participant -> drink count bookkeeping
//! - [`pulse`]: the transient-marker (pulse) state model
//! - [`formats`]: canonical snapshot serialization
//! - [`storage`]: redb-backed persistence
//!
//! No async, no network, no randomness. All collections are `BTreeMap` /
//! `BTreeSet` so every operation is deterministic and every iteration order
//! is stable.

pub mod error;
pub mod formats;
pub mod pulse;
pub mod roster;
pub mod storage;

mod primitives;

pub use error::TallyError;
pub use primitives::{Count, Name, DEFAULT_PULSE_CLASS, DEFAULT_PULSE_DURATION_MS, MAX_NAME_LEN};
pub use roster::Roster;
