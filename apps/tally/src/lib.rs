//! # Tally Library
//!
//! This library exposes the Tally modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod cli;
pub mod error;
pub mod pulse;
pub mod session;
pub mod store;

// Re-export tally_core for convenience
pub use tally_core;
