//! redb-backed roster store.
//!
//! The roster is small (one row per participant), so persistence is
//! snapshot-style: `save` rewrites the whole table inside one transaction,
//! `load` reads it back. Both are atomic.

use crate::{Count, Name, Roster, TallyError};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Participant table: name -> drink count.
const ROSTER_TABLE: TableDefinition<&str, u64> = TableDefinition::new("roster");

/// A roster store backed by a redb database file.
pub struct RedbRoster {
    db: Database,
}

impl RedbRoster {
    /// Open (or create) a redb database at the given path.
    pub fn open(path: &Path) -> Result<Self, TallyError> {
        let db = Database::create(path)?;
        Ok(Self { db })
    }

    /// Ensure the roster table exists.
    ///
    /// Used by `init` so a fresh database is readable immediately.
    pub fn init(&self) -> Result<(), TallyError> {
        let write_txn = self.db.begin_write()?;
        {
            let _table = write_txn.open_table(ROSTER_TABLE)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load the full roster.
    ///
    /// A database without the roster table yields an empty roster.
    pub fn load(&self) -> Result<Roster, TallyError> {
        let read_txn = self.db.begin_read()?;
        let table = match read_txn.open_table(ROSTER_TABLE) {
            Ok(table) => table,
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(Roster::new()),
            Err(e) => return Err(e.into()),
        };

        let mut roster = Roster::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            roster.restore(Name::new(key.value())?, Count::new(value.value()));
        }
        Ok(roster)
    }

    /// Persist the full roster atomically, replacing any previous contents.
    pub fn save(&self, roster: &Roster) -> Result<(), TallyError> {
        let write_txn = self.db.begin_write()?;
        {
            write_txn.delete_table(ROSTER_TABLE)?;
            let mut table = write_txn.open_table(ROSTER_TABLE)?;
            for (name, count) in roster.iter() {
                table.insert(name.as_str(), count.value())?;
            }
        }
        write_txn.commit()?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
