//! # Contract Tier Tests (C0-C3)
//!
//! If ANY tier fails, gating or caching is broken.
//!
//! ## Tiers
//! - C0: Tier Gating
//! - C1: Cache Read/Write Semantics
//! - C2: Failure Recovery
//! - C3: Persistent Storage

use habeats_core::{
    AccessPolicy, CacheConfig, CacheEntry, FeatureKey, HabeatsError, KeyValueStore, ManualClock,
    MemoryStore, RedbStore, StorageBackend, SubscriptionTier, TtlCache, has_feature_access,
    is_cache_valid,
};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

const T0: u64 = 1_700_000_000_000;

fn memory_cache() -> (TtlCache<MemoryStore>, ManualClock) {
    let clock = ManualClock::new(T0);
    (
        TtlCache::with_clock(MemoryStore::new(), Arc::new(clock.clone())),
        clock,
    )
}

// =============================================================================
// TIER C0: TIER GATING
// =============================================================================

mod c0_tier_gating {
    use super::*;

    /// C0.1: Premium reaches every declared feature.
    #[test]
    fn premium_is_universal() {
        for feature in FeatureKey::ALL {
            assert!(has_feature_access(SubscriptionTier::Premium, feature), "{}", feature);
        }
    }

    /// C0.2: Plan limits per tier.
    #[test]
    fn plan_generation_limits() {
        let policy = AccessPolicy::strict();
        assert!(policy.can_generate_new_plan(SubscriptionTier::Free, 0).can_generate);

        let refused = policy.can_generate_new_plan(SubscriptionTier::Free, 1);
        assert!(!refused.can_generate);
        assert!(refused.requires_upgrade);

        assert!(policy.can_generate_new_plan(SubscriptionTier::Plus, 100).can_generate);
        assert!(policy.can_generate_new_plan(SubscriptionTier::Premium, 7).can_generate);
    }

    /// C0.3: Streak prompt only for free users at five days who have not seen it.
    #[test]
    fn streak_prompt() {
        let policy = AccessPolicy::strict();
        assert!(policy.should_show_streak_upgrade_prompt(SubscriptionTier::Free, 5, false));
        assert!(!policy.should_show_streak_upgrade_prompt(SubscriptionTier::Free, 5, true));
        assert!(!policy.should_show_streak_upgrade_prompt(SubscriptionTier::Free, 4, false));
        for tier in [SubscriptionTier::Plus, SubscriptionTier::Premium] {
            assert!(!policy.should_show_streak_upgrade_prompt(tier, 100, false));
        }
    }

    /// C0.4: The test-mode bypass unlocks everything.
    #[cfg(any(debug_assertions, feature = "dev-bypass"))]
    #[test]
    fn test_mode_bypass() {
        use habeats_core::{BuildMode, RuntimeFlags};

        let policy = AccessPolicy::from_flags(RuntimeFlags {
            build_mode: BuildMode::Production,
            test_mode: true,
        });
        for feature in FeatureKey::ALL {
            assert!(policy.has_feature_access_with_bypass(SubscriptionTier::Free, feature));
        }
        for count in [0, 1, 5, u32::MAX] {
            assert!(policy.can_generate_new_plan(SubscriptionTier::Free, count).can_generate);
        }
    }

    /// C0.5: Plan refusal serializes the way clients expect.
    #[test]
    fn plan_decision_wire_format() {
        let refused = AccessPolicy::strict().can_generate_new_plan(SubscriptionTier::Free, 3);
        let wire = serde_json::to_value(&refused).expect("serialize");
        assert_eq!(wire["canGenerate"], json!(false));
        assert_eq!(wire["requiresUpgrade"], json!(true));
        assert!(wire["reason"].as_str().is_some_and(|r| r.contains("Upgrade to Plus")));

        let allowed = AccessPolicy::strict().can_generate_new_plan(SubscriptionTier::Plus, 3);
        let wire = serde_json::to_value(&allowed).expect("serialize");
        assert!(wire.get("reason").is_none());
    }
}

// =============================================================================
// TIER C1: CACHE READ/WRITE SEMANTICS
// =============================================================================

mod c1_cache_semantics {
    use super::*;

    /// C1.1: A write is readable immediately.
    #[test]
    fn write_then_read() {
        let (mut cache, _clock) = memory_cache();
        assert!(cache.set_cached_data("k", &json!({"a": 1}), Some(Duration::from_secs(1)), None));
        assert_eq!(cache.get_cached_data::<Value>("k", None), Some(json!({"a": 1})));
    }

    /// C1.2: An expired read is a miss and evicts the storage key.
    #[test]
    fn expiry_evicts_on_read() {
        let (mut cache, clock) = memory_cache();
        cache.set_cached_data("k", &json!({"a": 1}), Some(Duration::from_millis(1)), None);
        clock.advance(Duration::from_millis(2));

        assert_eq!(cache.get_cached_data::<Value>("k", None), None);
        assert!(cache.store().get_item("cache_k").expect("get").is_none());
    }

    /// C1.3: Validity of absent and zero-TTL entries.
    #[test]
    fn validity_edges() {
        let (cache, _clock) = memory_cache();
        assert!(!cache.is_cache_valid::<Value>(None));

        let zero = CacheEntry::new(json!(null), cache.now_millis(), Duration::ZERO);
        assert!(!cache.is_cache_valid(Some(&zero)));
    }

    /// C1.4: Sweep removes only expired entries and is idempotent.
    #[test]
    fn sweep_is_selective_and_idempotent() {
        let (mut cache, clock) = memory_cache();
        cache.set_cached_data("short", &1, Some(Duration::from_millis(100)), None);
        cache.set_cached_data("long", &2, Some(Duration::from_secs(60)), None);
        clock.advance(Duration::from_millis(500));

        assert_eq!(cache.clear_expired_cache(), 1);
        assert_eq!(cache.clear_expired_cache(), 0);
        assert_eq!(cache.get_cached_data::<i32>("long", None), Some(2));
    }

    /// C1.5: Clear-all only touches the cache namespace.
    #[test]
    fn clear_all_spares_foreign_keys() {
        let mut store = MemoryStore::new();
        store.set_item("auth_token", "secret").expect("set");
        let mut cache = TtlCache::new(store);

        let marked = CacheConfig::default().with_prefix("habeats_cache");
        cache.set_cached_data("a", &1, None, None);
        cache.set_cached_data("b", &2, None, Some(&marked));

        assert_eq!(cache.clear_all_cache(), 2);
        assert_eq!(
            cache.store().keys().expect("keys"),
            vec!["auth_token".to_string()]
        );
    }

    /// C1.6: Outdated schema versions are discarded on read.
    #[test]
    fn legacy_entries_discarded() {
        let (mut cache, clock) = memory_cache();
        let legacy = json!({"data": {"a": 1}, "timestamp": clock_now(&clock), "ttl": 60_000});

        let mut store = MemoryStore::new();
        store.set_item("cache_old", &legacy.to_string()).expect("seed");
        let mut cache_over_legacy = TtlCache::with_clock(store, Arc::new(clock.clone()));

        assert_eq!(cache_over_legacy.get_cached_data::<Value>("old", None), None);
        assert!(cache_over_legacy.store().get_item("cache_old").expect("get").is_none());

        // Current entries next to it are unaffected.
        cache.set_cached_data("new", &1, None, None);
        assert_eq!(cache.get_cached_data::<i32>("new", None), Some(1));
    }

    fn clock_now(clock: &ManualClock) -> u64 {
        use habeats_core::Clock;
        clock.now_millis()
    }

    /// C1.7: Sweep also removes unparsable cache entries.
    #[test]
    fn sweep_removes_garbage() {
        let mut store = MemoryStore::new();
        store.set_item("cache_junk", "{not json").expect("seed");
        store.set_item("notes", "{not json").expect("seed");
        let mut cache = TtlCache::new(store);

        assert_eq!(cache.get_cached_data::<Value>("junk", None), None);
        assert_eq!(cache.clear_expired_cache(), 1);
        assert_eq!(cache.store().keys().expect("keys"), vec!["notes".to_string()]);
    }

    /// C1.8: Valid entries found by the free function too.
    #[test]
    fn free_validity_function() {
        let entry = CacheEntry::new(json!(1), T0, Duration::from_secs(1));
        assert!(is_cache_valid(Some(&entry), T0 + 999));
        assert!(!is_cache_valid(Some(&entry), T0 + 1000));
    }
}

// =============================================================================
// TIER C2: FAILURE RECOVERY
// =============================================================================

mod c2_failure_recovery {
    use super::*;

    /// A store whose every operation fails.
    #[derive(Debug, Default)]
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, HabeatsError> {
            Err(HabeatsError::IoError("storage disabled".into()))
        }
        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), HabeatsError> {
            Err(HabeatsError::IoError("storage disabled".into()))
        }
        fn remove_item(&mut self, _key: &str) -> Result<bool, HabeatsError> {
            Err(HabeatsError::IoError("storage disabled".into()))
        }
        fn keys(&self) -> Result<Vec<String>, HabeatsError> {
            Err(HabeatsError::IoError("storage disabled".into()))
        }
    }

    /// C2.1: A dead store degrades to misses and no-ops.
    #[test]
    fn broken_store_never_errors() {
        let mut cache = TtlCache::new(BrokenStore);
        assert!(!cache.set_cached_data("k", &1, None, None));
        assert_eq!(cache.get_cached_data::<i32>("k", None), None);
        assert!(!cache.remove_cached_data("k", None));
        assert_eq!(cache.clear_expired_cache(), 0);
        assert_eq!(cache.clear_all_cache(), 0);
        assert_eq!(cache.get_cache_age("k", None), None);
    }

    /// C2.2: A full store purges expired entries and retries once.
    #[test]
    fn quota_recovery_succeeds_after_purge() {
        let clock = ManualClock::new(T0);
        let mut cache = TtlCache::with_clock(MemoryStore::with_capacity(200), Arc::new(clock.clone()));

        assert!(cache.set_cached_data("old", &"x".repeat(60), Some(Duration::from_millis(10)), None));
        clock.advance(Duration::from_secs(1));

        assert!(cache.set_cached_data("fresh", &"y".repeat(60), None, None));
        assert!(cache.store().get_item("cache_old").expect("get").is_none());
        assert_eq!(cache.get_cached_data::<String>("fresh", None), Some("y".repeat(60)));
    }

    /// C2.3: A write that still does not fit is dropped.
    #[test]
    fn quota_retry_failure_is_dropped() {
        let clock = ManualClock::new(T0);
        let mut cache = TtlCache::with_clock(MemoryStore::with_capacity(200), Arc::new(clock.clone()));

        assert!(cache.set_cached_data("live", &"x".repeat(60), Some(Duration::from_secs(60)), None));
        assert!(!cache.set_cached_data("big", &"y".repeat(150), None, None));
        assert_eq!(cache.get_cached_data::<String>("live", None), Some("x".repeat(60)));
        assert_eq!(cache.get_cached_data::<String>("big", None), None);
    }
}

// =============================================================================
// TIER C3: PERSISTENT STORAGE
// =============================================================================

mod c3_persistent_storage {
    use super::*;
    use tempfile::tempdir;

    /// C3.1: Entries survive reopening the database.
    #[test]
    fn entries_survive_reopen() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("cache.redb");
        let clock = ManualClock::new(T0);

        {
            let store = StorageBackend::open_redb(&path, None).expect("open");
            assert!(store.is_persistent());
            let mut cache = TtlCache::with_clock(store, Arc::new(clock.clone()));
            let config = CacheConfig::default().with_prefix("auth");
            assert!(cache.set_cached_data("user", &json!({"id": 7}), Some(Duration::from_secs(300)), Some(&config)));
        }

        let store = RedbStore::open(&path, None).expect("reopen");
        let mut cache = TtlCache::with_clock(store, Arc::new(clock.clone()));
        let config = CacheConfig::default().with_prefix("auth");
        assert_eq!(cache.get_cached_data::<Value>("user", Some(&config)), Some(json!({"id": 7})));

        clock.advance(Duration::from_secs(301));
        assert_eq!(cache.get_cache_age("user", Some(&config)), Some(Duration::from_secs(301)));
        assert_eq!(cache.get_cached_data::<Value>("user", Some(&config)), None);
        assert!(cache.store().get_item("auth_user").expect("get").is_none());
    }

    /// C3.2: Quota recovery works on disk as well.
    #[test]
    fn redb_quota_recovery() {
        let dir = tempdir().expect("tempdir");
        let clock = ManualClock::new(T0);
        let store = RedbStore::open(dir.path().join("q.redb"), Some(200)).expect("open");
        let mut cache = TtlCache::with_clock(store, Arc::new(clock.clone()));

        assert!(cache.set_cached_data("old", &"x".repeat(60), Some(Duration::from_millis(5)), None));
        clock.advance(Duration::from_millis(10));
        assert!(cache.set_cached_data("new", &"y".repeat(60), None, None));
        assert_eq!(cache.store().keys().expect("keys"), vec!["cache_new".to_string()]);
    }
}
