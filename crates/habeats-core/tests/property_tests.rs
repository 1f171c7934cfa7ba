//! # Property-Based Tests
//!
//! Invariants of tier gating and cache expiry, checked with proptest.

use habeats_core::{
    AccessPolicy, CacheEntry, FeatureKey, ManualClock, MemoryStore, SubscriptionTier, TtlCache,
    has_feature_access, is_cache_valid,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn tier() -> impl Strategy<Value = SubscriptionTier> {
    prop::sample::select(SubscriptionTier::ALL.to_vec())
}

fn feature() -> impl Strategy<Value = FeatureKey> {
    prop::sample::select(FeatureKey::ALL.to_vec())
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Access never shrinks as rank grows.
    #[test]
    fn access_is_monotonic_in_rank(t1 in tier(), t2 in tier(), f in feature()) {
        let (low, high) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
        if has_feature_access(low, f) {
            prop_assert!(has_feature_access(high, f));
        }
    }

    /// The strict policy agrees with the bare check.
    #[test]
    fn strict_policy_matches_bare_check(t in tier(), f in feature()) {
        let policy = AccessPolicy::strict();
        prop_assert_eq!(policy.has_feature_access_with_bypass(t, f), has_feature_access(t, f));
    }

    /// Paid tiers are never capped.
    #[test]
    fn paid_tiers_unlimited(count in any::<u32>()) {
        let policy = AccessPolicy::strict();
        prop_assert!(policy.can_generate_new_plan(SubscriptionTier::Plus, count).can_generate);
        prop_assert!(policy.can_generate_new_plan(SubscriptionTier::Premium, count).can_generate);
    }

    /// A refusal always asks for an upgrade and explains why.
    #[test]
    fn refusal_is_explained(t in tier(), count in 0u32..10) {
        let decision = AccessPolicy::strict().can_generate_new_plan(t, count);
        prop_assert_eq!(decision.can_generate, !decision.requires_upgrade);
        prop_assert_eq!(decision.reason.is_some(), decision.requires_upgrade);
    }

    /// An entry is valid exactly while age < ttl.
    #[test]
    fn validity_boundary(ttl in 0u64..100_000, elapsed in 0u64..200_000) {
        let start = 1_700_000_000_000u64;
        let entry = CacheEntry::new((), start, Duration::from_millis(ttl));
        prop_assert_eq!(is_cache_valid(Some(&entry), start + elapsed), elapsed < ttl);
    }

    /// Reads before expiry hit, reads after miss, and the sweep finds nothing left.
    #[test]
    fn read_before_and_after_expiry(ttl in 1u64..10_000, value in any::<i64>()) {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut cache = TtlCache::with_clock(MemoryStore::new(), Arc::new(clock.clone()));

        prop_assert!(cache.set_cached_data("k", &value, Some(Duration::from_millis(ttl)), None));
        clock.advance(Duration::from_millis(ttl - 1));
        prop_assert_eq!(cache.get_cached_data::<i64>("k", None), Some(value));

        clock.advance(Duration::from_millis(1));
        prop_assert_eq!(cache.get_cached_data::<i64>("k", None), None);
        prop_assert_eq!(cache.clear_expired_cache(), 0);
    }

    /// Sweeping twice removes nothing the second time.
    #[test]
    fn sweep_idempotent(ttls in prop::collection::vec(1u64..1_000, 1..20), advance in 0u64..1_500) {
        let clock = ManualClock::new(1_700_000_000_000);
        let mut cache = TtlCache::with_clock(MemoryStore::new(), Arc::new(clock.clone()));

        for (i, ttl) in ttls.iter().enumerate() {
            cache.set_cached_data(&format!("k{}", i), &i, Some(Duration::from_millis(*ttl)), None);
        }
        clock.advance(Duration::from_millis(advance));

        let expected = ttls.iter().filter(|&&ttl| advance >= ttl).count();
        prop_assert_eq!(cache.clear_expired_cache(), expected);
        prop_assert_eq!(cache.clear_expired_cache(), 0);
        prop_assert_eq!(cache.store().len(), ttls.len() - expected);
    }
}
