//! # Key/Value Storage
//!
//! The synchronous, string-keyed store the TTL cache sits on.
//!
//! Two backends:
//! - `MemoryStore`: `BTreeMap` in memory, optional byte capacity
//! - `RedbStore`: one redb table on disk, optional byte capacity
//!
//! `StorageBackend` picks between them at runtime.

mod memory;
mod redb_store;

pub use memory::MemoryStore;
pub use redb_store::RedbStore;

use crate::HabeatsError;
use std::path::Path;

/// A persistent synchronous key/value store with string keys and values.
///
/// Stores report a full store as [`HabeatsError::QuotaExceeded`] so callers
/// can make room and retry.
pub trait KeyValueStore {
    /// Read a value.
    fn get_item(&self, key: &str) -> Result<Option<String>, HabeatsError>;

    /// Write a value, replacing any previous one.
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HabeatsError>;

    /// Delete a value. Returns whether the key existed.
    fn remove_item(&mut self, key: &str) -> Result<bool, HabeatsError>;

    /// Every key currently stored, in ascending order.
    fn keys(&self) -> Result<Vec<String>, HabeatsError>;
}

/// Bytes a key/value pair occupies for capacity accounting.
pub(crate) fn entry_size(key: &str, value: &str) -> u64 {
    (key.len() as u64).saturating_add(value.len() as u64)
}

/// Runtime choice of store.
#[derive(Debug)]
pub enum StorageBackend {
    /// Volatile, in-process map.
    InMemory(MemoryStore),
    /// Disk-backed redb database.
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Open (or create) a redb-backed store.
    pub fn open_redb(path: impl AsRef<Path>, capacity: Option<u64>) -> Result<Self, HabeatsError> {
        Ok(Self::Persistent(RedbStore::open(path, capacity)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, StorageBackend::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get_item(&self, key: &str) -> Result<Option<String>, HabeatsError> {
        match self {
            StorageBackend::InMemory(store) => store.get_item(key),
            StorageBackend::Persistent(store) => store.get_item(key),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HabeatsError> {
        match self {
            StorageBackend::InMemory(store) => store.set_item(key, value),
            StorageBackend::Persistent(store) => store.set_item(key, value),
        }
    }

    fn remove_item(&mut self, key: &str) -> Result<bool, HabeatsError> {
        match self {
            StorageBackend::InMemory(store) => store.remove_item(key),
            StorageBackend::Persistent(store) => store.remove_item(key),
        }
    }

    fn keys(&self) -> Result<Vec<String>, HabeatsError> {
        match self {
            StorageBackend::InMemory(store) => store.keys(),
            StorageBackend::Persistent(store) => store.keys(),
        }
    }
}
