//! # redb-backed Key/Value Store
//!
//! A disk-backed store using the redb embedded database.
//!
//! One table maps storage keys to serialized values. Every write is its own
//! ACID transaction, so a crash never leaves a half-written entry behind.
//!
//! ## Capacity
//!
//! redb itself grows without bound. To give the cache a quota to recover
//! from, the store keeps a running byte count (keys plus values), rebuilt by
//! a full scan on open, and refuses writes that would exceed it.

use super::{KeyValueStore, entry_size};
use crate::HabeatsError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for entries: storage key -> serialized value
const ENTRIES: TableDefinition<&str, &str> = TableDefinition::new("entries");

fn io_error(e: impl std::fmt::Display) -> HabeatsError {
    HabeatsError::IoError(e.to_string())
}

/// A disk-backed key/value store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Byte limit for keys plus values, if any.
    capacity: Option<u64>,
    /// Bytes currently held.
    used: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("capacity", &self.capacity)
            .field("used", &self.used)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>, capacity: Option<u64>) -> Result<Self, HabeatsError> {
        let db = Database::create(path.as_ref()).map_err(io_error)?;

        // Create the table if this is a fresh file.
        {
            let write_txn = db.begin_write().map_err(io_error)?;
            let _ = write_txn.open_table(ENTRIES).map_err(io_error)?;
            write_txn.commit().map_err(io_error)?;
        }

        let used = {
            let read_txn = db.begin_read().map_err(io_error)?;
            let table = read_txn.open_table(ENTRIES).map_err(io_error)?;
            let mut used = 0u64;
            for entry in table.iter().map_err(io_error)? {
                let (key, value) = entry.map_err(io_error)?;
                used = used.saturating_add(entry_size(key.value(), value.value()));
            }
            used
        };

        Ok(Self { db, capacity, used })
    }

    /// Bytes currently held.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used
    }
}

impl KeyValueStore for RedbStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, HabeatsError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(ENTRIES).map_err(io_error)?;
        let value = table
            .get(key)
            .map_err(io_error)?
            .map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HabeatsError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;

        let (requested, written) = {
            let mut table = write_txn.open_table(ENTRIES).map_err(io_error)?;
            let previous = table
                .get(key)
                .map_err(io_error)?
                .map(|guard| entry_size(key, guard.value()))
                .unwrap_or(0);
            let requested = self
                .used
                .saturating_sub(previous)
                .saturating_add(entry_size(key, value));

            if self.capacity.is_some_and(|capacity| requested > capacity) {
                (requested, false)
            } else {
                table.insert(key, value).map_err(io_error)?;
                (requested, true)
            }
        };

        if !written {
            write_txn.abort().map_err(io_error)?;
            return Err(HabeatsError::QuotaExceeded {
                requested,
                capacity: self.capacity.unwrap_or(u64::MAX),
            });
        }

        write_txn.commit().map_err(io_error)?;
        // In-memory accounting only after a successful commit.
        self.used = requested;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<bool, HabeatsError> {
        let write_txn = self.db.begin_write().map_err(io_error)?;
        let freed = {
            let mut table = write_txn.open_table(ENTRIES).map_err(io_error)?;
            table
                .remove(key)
                .map_err(io_error)?
                .map(|guard| entry_size(key, guard.value()))
        };
        write_txn.commit().map_err(io_error)?;

        match freed {
            Some(bytes) => {
                self.used = self.used.saturating_sub(bytes);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys(&self) -> Result<Vec<String>, HabeatsError> {
        let read_txn = self.db.begin_read().map_err(io_error)?;
        let table = read_txn.open_table(ENTRIES).map_err(io_error)?;

        let mut keys = Vec::new();
        for entry in table.iter().map_err(io_error)? {
            let (key, _) = entry.map_err(io_error)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}
