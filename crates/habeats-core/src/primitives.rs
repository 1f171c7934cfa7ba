//! # Policy Constants
//!
//! Compiled-in business rules and storage conventions.
//! None of these are configurable at runtime; changing one is a code change.

use std::time::Duration;

// =============================================================================
// PLAN & STREAK RULES
// =============================================================================

/// Number of concurrent plans a free account may hold.
pub const FREE_PLAN_LIMIT: u32 = 1;

/// Refusal shown when a free account hits [`FREE_PLAN_LIMIT`].
pub const FREE_PLAN_LIMIT_REASON: &str =
    "Free users can only have 1 active plan. Upgrade to Plus for unlimited plans.";

/// Streak length (days) at which free accounts see the upgrade prompt.
pub const STREAK_PROMPT_THRESHOLD: u32 = 5;

// =============================================================================
// CACHE NAMESPACE
// =============================================================================

/// Prefix applied to cache keys when no custom prefix is configured.
pub const DEFAULT_KEY_PREFIX: &str = "cache";

/// Storage keys starting with this belong to the cache.
pub const NAMESPACE_PREFIX: &str = "cache_";

/// Storage keys containing this belong to the cache.
pub const NAMESPACE_MARKER: &str = "_cache_";

/// Current on-disk entry schema.
///
/// Increment this when changing `CacheEntry`'s layout. Entries carrying any
/// other version are treated as expired.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

// =============================================================================
// DEFAULT TTL TABLE
// =============================================================================

/// Default time-to-live per kind of cached data.
///
/// Policy values, not minimums: callers override per write.
#[derive(Debug, Clone, Copy)]
pub struct DefaultTtl;

impl DefaultTtl {
    /// Authentication data.
    pub const AUTH: Duration = Duration::from_secs(5 * 60);
    /// Daily progress. Also the fallback when no TTL is given.
    pub const PROGRESS: Duration = Duration::from_secs(2 * 60);
    /// Goals.
    pub const GOALS: Duration = Duration::from_secs(10 * 60);
    /// Meal plans.
    pub const PLAN: Duration = Duration::from_secs(30 * 60);
    /// Favorites.
    pub const FAVORITES: Duration = Duration::from_secs(15 * 60);
}

/// Whether a storage key belongs to the cache namespace.
#[must_use]
pub fn is_cache_key(key: &str) -> bool {
    key.starts_with(NAMESPACE_PREFIX) || key.contains(NAMESPACE_MARKER)
}

/// Convert a duration to whole milliseconds, saturating at `u64::MAX`.
#[must_use]
pub fn duration_to_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
