//! # TTL Cache
//!
//! Expiring entries on top of a [`KeyValueStore`].
//!
//! Entries are JSON documents `{"v", "data", "timestamp", "ttl"}` stored under
//! `"{prefix}_{key}"` (default prefix `cache`). An entry is valid while its
//! age is below its TTL and its schema version is current.
//!
//! ## Eviction
//!
//! There is no timer. Expired entries are deleted when a read trips over
//! them, or in bulk by [`TtlCache::clear_expired_cache`], which scans every
//! key in the store: O(total keys), not O(cache keys).
//!
//! ## Failure Semantics
//!
//! The cache is an optimization. Storage and parse failures are logged and
//! degrade to a miss or a dropped write; nothing here returns an error.
//! A full store gets one purge of expired entries and one retry.

use crate::clock::{Clock, SystemClock};
use crate::primitives::{
    CACHE_SCHEMA_VERSION, DEFAULT_KEY_PREFIX, DefaultTtl, duration_to_millis, is_cache_key,
};
use crate::storage::KeyValueStore;
use crate::HabeatsError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// ERROR LOGGING HELPERS
// =============================================================================

/// Log a storage or parse error and convert the Result to an Option.
#[inline]
fn log_and_convert<T>(result: Result<T, HabeatsError>, context: &str, key: &str) -> Option<T> {
    match result {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(key = key, error = %e, "{}", context);
            None
        }
    }
}

fn parse<T: DeserializeOwned>(raw: &str) -> Result<T, HabeatsError> {
    serde_json::from_str(raw).map_err(|e| HabeatsError::DeserializationError(e.to_string()))
}

// =============================================================================
// ENTRY
// =============================================================================

/// A cached value with its write time and lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    /// Schema version; absent in legacy entries, which read as 0.
    #[serde(rename = "v", default)]
    pub version: u32,
    pub data: T,
    /// Write time, epoch milliseconds.
    pub timestamp: u64,
    /// Lifetime in milliseconds.
    pub ttl: u64,
}

impl<T> CacheEntry<T> {
    /// A current-schema entry written at `timestamp`.
    pub fn new(data: T, timestamp: u64, ttl: Duration) -> Self {
        Self {
            version: CACHE_SCHEMA_VERSION,
            data,
            timestamp,
            ttl: duration_to_millis(ttl),
        }
    }

    /// Milliseconds since the write; zero for timestamps in the future.
    #[must_use]
    pub fn age_at(&self, now_millis: u64) -> u64 {
        now_millis.saturating_sub(self.timestamp)
    }

    /// Whether the entry is current-schema and younger than its TTL.
    #[must_use]
    pub fn is_valid_at(&self, now_millis: u64) -> bool {
        self.version == CACHE_SCHEMA_VERSION && self.age_at(now_millis) < self.ttl
    }
}

/// Validity check that treats a missing entry as invalid.
#[must_use]
pub fn is_cache_valid<T>(entry: Option<&CacheEntry<T>>, now_millis: u64) -> bool {
    entry.is_some_and(|e| e.is_valid_at(now_millis))
}

/// Metadata of a stored entry, read without touching `data`.
#[derive(Debug, Deserialize)]
struct EntryHeader {
    #[serde(rename = "v", default)]
    version: u32,
    timestamp: u64,
    ttl: u64,
}

/// Just the write time, enough to age entries whose header is incomplete.
#[derive(Debug, Deserialize)]
struct EntryTimestamp {
    timestamp: u64,
}

impl EntryHeader {
    fn is_valid_at(&self, now_millis: u64) -> bool {
        self.version == CACHE_SCHEMA_VERSION && now_millis.saturating_sub(self.timestamp) < self.ttl
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Per-call cache options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL used when the write itself names none.
    pub ttl: Option<Duration>,
    /// Replaces the default `cache` key prefix.
    pub key_prefix: Option<String>,
}

impl CacheConfig {
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = Some(prefix.into());
        self
    }
}

/// Storage key for a cache key: `"{prefix}_{key}"`.
#[must_use]
pub fn storage_key(key: &str, config: Option<&CacheConfig>) -> String {
    let prefix = config
        .and_then(|c| c.key_prefix.as_deref())
        .unwrap_or(DEFAULT_KEY_PREFIX);
    format!("{}_{}", prefix, key)
}

// =============================================================================
// TTL CACHE
// =============================================================================

/// Expiring key/value cache over a store.
///
/// Reads take `&mut self` because an expired hit is deleted on the spot.
#[derive(Debug)]
pub struct TtlCache<S> {
    store: S,
    clock: Arc<dyn Clock>,
}

impl<S: KeyValueStore> TtlCache<S> {
    /// Cache on the system clock.
    pub fn new(store: S) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    /// Cache on an explicit clock.
    pub fn with_clock(store: S, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current time according to the cache's clock.
    pub fn now_millis(&self) -> u64 {
        self.clock.now_millis()
    }

    /// Whether `entry` is present, current-schema and unexpired now.
    pub fn is_cache_valid<T>(&self, entry: Option<&CacheEntry<T>>) -> bool {
        is_cache_valid(entry, self.now_millis())
    }

    /// Read a valid entry's data.
    ///
    /// Expired or outdated entries are removed and read as a miss. Corrupt
    /// entries and storage failures are logged and read as a miss.
    pub fn get_cached_data<T: DeserializeOwned>(
        &mut self,
        key: &str,
        config: Option<&CacheConfig>,
    ) -> Option<T> {
        let full_key = storage_key(key, config);
        let raw = log_and_convert(
            self.store.get_item(&full_key),
            "Error reading cache entry",
            &full_key,
        )??;

        let header: EntryHeader =
            log_and_convert(parse(&raw), "Corrupt cache entry", &full_key)?;
        if !header.is_valid_at(self.now_millis()) {
            tracing::debug!(key = %full_key, "Cache entry expired, evicting");
            self.remove_key(&full_key);
            return None;
        }

        let entry: CacheEntry<T> =
            log_and_convert(parse(&raw), "Cache entry has unexpected shape", &full_key)?;
        Some(entry.data)
    }

    /// Write an entry stamped now.
    ///
    /// TTL precedence: `ttl`, then `config.ttl`, then [`DefaultTtl::PROGRESS`].
    /// Returns whether the entry was stored.
    pub fn set_cached_data<T: Serialize>(
        &mut self,
        key: &str,
        data: &T,
        ttl: Option<Duration>,
        config: Option<&CacheConfig>,
    ) -> bool {
        let full_key = storage_key(key, config);
        let ttl = ttl
            .or_else(|| config.and_then(|c| c.ttl))
            .unwrap_or(DefaultTtl::PROGRESS);

        match self.write_entry(&full_key, data, ttl) {
            Ok(()) => true,
            Err(e) if e.is_quota_exceeded() => {
                tracing::warn!(key = %full_key, error = %e, "Cache full, purging expired entries");
                self.clear_expired_cache();
                log_and_convert(
                    self.write_entry(&full_key, data, ttl),
                    "Failed to cache after cleanup",
                    &full_key,
                )
                .is_some()
            }
            Err(e) => {
                tracing::warn!(key = %full_key, error = %e, "Error writing cache entry");
                false
            }
        }
    }

    fn write_entry<T: Serialize>(
        &mut self,
        full_key: &str,
        data: &T,
        ttl: Duration,
    ) -> Result<(), HabeatsError> {
        let entry = CacheEntry::new(data, self.now_millis(), ttl);
        let raw = serde_json::to_string(&entry)
            .map_err(|e| HabeatsError::SerializationError(e.to_string()))?;
        self.store.set_item(full_key, &raw)
    }

    /// Delete an entry. Returns whether it existed; storage failures are
    /// logged and reported as `false`.
    pub fn remove_cached_data(&mut self, key: &str, config: Option<&CacheConfig>) -> bool {
        let full_key = storage_key(key, config);
        self.remove_key(&full_key)
    }

    fn remove_key(&mut self, full_key: &str) -> bool {
        log_and_convert(
            self.store.remove_item(full_key),
            "Error removing cache entry",
            full_key,
        )
        .unwrap_or(false)
    }

    fn cache_keys(&self) -> Vec<String> {
        log_and_convert(self.store.keys(), "Error listing cache keys", "*")
            .unwrap_or_default()
            .into_iter()
            .filter(|key| is_cache_key(key))
            .collect()
    }

    /// Remove every expired, outdated or unparsable cache entry.
    ///
    /// Returns the number removed. Running it twice in a row removes nothing
    /// the second time unless the clock moved.
    pub fn clear_expired_cache(&mut self) -> usize {
        let now = self.now_millis();
        let mut cleared = 0;

        for key in self.cache_keys() {
            let stale = match self.store.get_item(&key) {
                Ok(Some(raw)) => parse::<EntryHeader>(&raw)
                    .map(|header| !header.is_valid_at(now))
                    .unwrap_or(true),
                Ok(None) => false,
                Err(_) => true,
            };

            if stale && self.remove_key(&key) {
                cleared += 1;
            }
        }

        if cleared > 0 {
            tracing::info!(cleared, "Cleared expired cache entries");
        }
        cleared
    }

    /// Remove every cache entry, valid or not. Returns the number removed.
    pub fn clear_all_cache(&mut self) -> usize {
        let mut cleared = 0;
        for key in self.cache_keys() {
            if self.remove_key(&key) {
                cleared += 1;
            }
        }
        tracing::info!(cleared, "Cleared all cache entries");
        cleared
    }

    /// Age of a stored entry, whether or not it is still valid.
    pub fn get_cache_age(&self, key: &str, config: Option<&CacheConfig>) -> Option<Duration> {
        let full_key = storage_key(key, config);
        let raw = self.store.get_item(&full_key).ok()??;
        let entry: EntryTimestamp = parse(&raw).ok()?;
        Some(Duration::from_millis(
            self.now_millis().saturating_sub(entry.timestamp),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================
