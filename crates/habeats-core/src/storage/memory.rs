//! In-memory key/value store.

use super::{KeyValueStore, entry_size};
use crate::HabeatsError;
use std::collections::BTreeMap;

/// `BTreeMap`-backed store with an optional byte capacity.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: BTreeMap<String, String>,
    capacity: Option<u64>,
    used: u64,
}

impl MemoryStore {
    /// Unbounded store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses writes beyond `capacity` bytes (keys plus values).
    #[must_use]
    pub fn with_capacity(capacity: u64) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::default()
        }
    }

    /// Bytes currently held.
    #[must_use]
    pub fn used_bytes(&self) -> u64 {
        self.used
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, HabeatsError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), HabeatsError> {
        let previous = self
            .items
            .get(key)
            .map(|old| entry_size(key, old))
            .unwrap_or(0);
        let requested = self
            .used
            .saturating_sub(previous)
            .saturating_add(entry_size(key, value));

        if let Some(capacity) = self.capacity.filter(|&capacity| requested > capacity) {
            return Err(HabeatsError::QuotaExceeded {
                requested,
                capacity,
            });
        }

        self.items.insert(key.to_string(), value.to_string());
        self.used = requested;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<bool, HabeatsError> {
        match self.items.remove(key) {
            Some(old) => {
                self.used = self.used.saturating_sub(entry_size(key, &old));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn keys(&self) -> Result<Vec<String>, HabeatsError> {
        Ok(self.items.keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let mut store = MemoryStore::new();
        store.set_item("a", "1").expect("set");
        assert_eq!(store.get_item("a").expect("get").as_deref(), Some("1"));
        assert!(store.remove_item("a").expect("remove"));
        assert!(!store.remove_item("a").expect("remove again"));
        assert!(store.is_empty());
    }

    #[test]
    fn capacity_counts_keys_and_values() {
        let mut store = MemoryStore::with_capacity(6);
        store.set_item("ab", "cd").expect("fits");
        assert_eq!(store.used_bytes(), 4);

        let err = store.set_item("ef", "gh").expect_err("over capacity");
        assert!(err.is_quota_exceeded());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn overwrite_reuses_old_space() {
        let mut store = MemoryStore::with_capacity(4);
        store.set_item("ab", "cd").expect("first");
        store.set_item("ab", "ef").expect("overwrite fits");
        assert_eq!(store.used_bytes(), 4);
        assert_eq!(store.get_item("ab").expect("get").as_deref(), Some("ef"));
    }

    #[test]
    fn keys_are_sorted() {
        let mut store = MemoryStore::new();
        store.set_item("b", "").expect("set");
        store.set_item("a", "").expect("set");
        assert_eq!(store.keys().expect("keys"), vec!["a".to_string(), "b".to_string()]);
    }
}
