//! # Formats Module
//!
//! Snapshot serialization for Tally rosters.
//!
//! This module contains the canonical binary snapshot format (postcard +
//! header). Note: file I/O operations remain in the app layer (apps/tally).
//! This module only handles format conversion (pure transformations).

mod persistence;

pub use persistence::*;
