//! # habeats-core
//!
//! Subscription gating and client-side caching for Habeats - THE LOGIC.
//!
//! Two independent leaves:
//! - **Access evaluator** (`access`, `catalog`): maps a subscription tier and
//!   a feature, plan count or streak to a decision, with a development bypass
//!   injected at construction.
//! - **TTL cache** (`cache`, `storage`, `clock`): expiring JSON entries on a
//!   synchronous key/value store, with lazy eviction, quota recovery and a
//!   bulk sweep.
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies
//! - No hidden globals: bypass flags and clocks are passed in
//! - Cache failures never reach the caller; they degrade to misses

// =============================================================================
// MODULES
// =============================================================================

pub mod access;
pub mod cache;
pub mod catalog;
pub mod clock;
pub mod primitives;
pub mod storage;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{FeatureKey, HabeatsError, SubscriptionTier};

// =============================================================================
// RE-EXPORTS: Access Evaluator
// =============================================================================

pub use access::{
    AccessPolicy, BuildMode, PlanDecision, RuntimeFlags, has_feature_access, required_tier,
};
pub use catalog::{TIERS, TierDefinition, UpgradeOffer, tier_definition, upgrade_offer};

// =============================================================================
// RE-EXPORTS: Cache
// =============================================================================

pub use cache::{CacheConfig, CacheEntry, TtlCache, is_cache_valid, storage_key};
pub use clock::{Clock, ManualClock, SystemClock};
pub use primitives::DefaultTtl;
pub use storage::{KeyValueStore, MemoryStore, RedbStore, StorageBackend};
