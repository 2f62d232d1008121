//! # Error Types
//!
//! The single error enum shared across the core crate.
//!
//! Every fallible core operation returns `Result<_, TallyError>`. The app
//! layer wraps these into HTTP / CLI errors; the core never prints, logs,
//! or panics.

use thiserror::Error;

/// Errors produced by the core engine.
#[derive(Debug, Error)]
pub enum TallyError {
    /// A participant name failed validation.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The named participant is not on the roster.
    #[error("unknown participant: {0}")]
    UnknownParticipant(String),

    /// A snapshot did not start with the canonical magic bytes.
    #[error("bad snapshot magic")]
    BadMagic,

    /// A snapshot carries a format version this build cannot read.
    #[error("unsupported snapshot version: {0}")]
    UnsupportedVersion(u8),

    /// A snapshot header was present but the payload failed to decode.
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] postcard::Error),

    /// An underlying redb operation failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<redb::Error> for TallyError {
    fn from(e: redb::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::DatabaseError> for TallyError {
    fn from(e: redb::DatabaseError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::TransactionError> for TallyError {
    fn from(e: redb::TransactionError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::TableError> for TallyError {
    fn from(e: redb::TableError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::StorageError> for TallyError {
    fn from(e: redb::StorageError) -> Self {
        Self::Storage(e.to_string())
    }
}

impl From<redb::CommitError> for TallyError {
    fn from(e: redb::CommitError) -> Self {
        Self::Storage(e.to_string())
    }
}
