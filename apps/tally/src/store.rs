//! # Roster Persistence Backends
//!
//! Three ways to keep the roster:
//! - `memory`: nothing survives a restart (demo mode)
//! - `json`: a pretty-printed JSON file, the original data-file format
//! - `redb`: the embedded database from tally-core
//!
//! Handlers persist a full snapshot after every mutation, matching the
//! load/save-per-request behavior of the original service. The roster is
//! tiny, so snapshot writes are cheap.

use crate::error::AppError;
use clap::ValueEnum;
use std::fs;
use std::path::{Path, PathBuf};
use tally_core::storage::RedbRoster;
use tally_core::Roster;

/// Which persistence backend a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Backend {
    /// In-memory only; data is lost on shutdown.
    Memory,
    /// JSON data file.
    Json,
    /// redb embedded database.
    Redb,
}

/// Snapshot persistence for the roster.
pub trait RosterPersist: Send + Sync {
    /// Load the roster, yielding an empty one when nothing is stored yet.
    fn load(&self) -> Result<Roster, AppError>;

    /// Persist a full snapshot of the roster.
    fn save(&self, roster: &Roster) -> Result<(), AppError>;
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// No-op persistence; the in-process roster is the only copy.
#[derive(Debug, Default)]
pub struct MemoryStore;

impl RosterPersist for MemoryStore {
    fn load(&self) -> Result<Roster, AppError> {
        Ok(Roster::new())
    }

    fn save(&self, _roster: &Roster) -> Result<(), AppError> {
        Ok(())
    }
}

// =============================================================================
// JSON FILE BACKEND
// =============================================================================

/// JSON data-file persistence.
///
/// A missing file reads as an empty roster; a corrupt file is an error
/// rather than silent data loss.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    /// Create a store for the given data file path.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The data file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RosterPersist for JsonStore {
    fn load(&self) -> Result<Roster, AppError> {
        if !self.path.exists() {
            return Ok(Roster::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, roster: &Roster) -> Result<(), AppError> {
        let content = serde_json::to_string_pretty(roster)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

// =============================================================================
// REDB BACKEND
// =============================================================================

impl RosterPersist for RedbRoster {
    fn load(&self) -> Result<Roster, AppError> {
        Ok(RedbRoster::load(self)?)
    }

    fn save(&self, roster: &Roster) -> Result<(), AppError> {
        Ok(RedbRoster::save(self, roster)?)
    }
}

// =============================================================================
// BACKEND SELECTION
// =============================================================================

/// Open the persistence backend for a path.
pub fn open_store(path: &Path, backend: Backend) -> Result<Box<dyn RosterPersist>, AppError> {
    match backend {
        Backend::Memory => Ok(Box::new(MemoryStore)),
        Backend::Json => Ok(Box::new(JsonStore::new(path))),
        Backend::Redb => Ok(Box::new(RedbRoster::open(path)?)),
    }
}

// =============================================================================
// TESTS
// =============================================================================
