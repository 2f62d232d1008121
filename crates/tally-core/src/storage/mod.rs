//! # Storage Module
//!
//! Disk-backed roster persistence using redb.
//!
//! Uses redb embedded database for:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (concurrent readers, single writer)

mod redb_roster;

pub use redb_roster::RedbRoster;
