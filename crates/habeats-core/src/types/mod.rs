//! # Core Type Definitions
//!
//! This module contains the closed vocabularies shared by every other module:
//! - Subscription tiers (`SubscriptionTier`)
//! - Gateable capabilities (`FeatureKey`)
//! - Error types (`HabeatsError`)
//!
//! ## Closed Enumerations
//!
//! Tiers and features are enums rather than strings. Every table keyed by
//! them is an exhaustive `match`, so adding a variant without deciding its
//! tier or its copy is a compile error instead of a silent denial.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// SUBSCRIPTION TIER
// =============================================================================

/// A named subscription level granting a monotonically increasing feature set.
///
/// Set externally (billing webhook); read-only from this crate's perspective.
/// Accounts with no tier are treated as [`SubscriptionTier::Free`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    #[default]
    Free,
    Plus,
    Premium,
}

impl SubscriptionTier {
    /// Every tier, lowest rank first.
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Free,
        SubscriptionTier::Plus,
        SubscriptionTier::Premium,
    ];

    /// Explicit rank used for all access comparisons.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            SubscriptionTier::Free => 0,
            SubscriptionTier::Plus => 1,
            SubscriptionTier::Premium => 2,
        }
    }

    /// Wire name (`"free"`, `"plus"`, `"premium"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "free",
            SubscriptionTier::Plus => "plus",
            SubscriptionTier::Premium => "premium",
        }
    }

    /// Display name shown on paywalls.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Plus => "Plus",
            SubscriptionTier::Premium => "Premium",
        }
    }

    /// Check whether this tier ranks at least as high as `other`.
    #[must_use]
    pub const fn satisfies(self, other: SubscriptionTier) -> bool {
        self.rank() >= other.rank()
    }
}

impl fmt::Display for SubscriptionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionTier {
    type Err = HabeatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(SubscriptionTier::Free),
            "plus" => Ok(SubscriptionTier::Plus),
            "premium" => Ok(SubscriptionTier::Premium),
            _ => Err(HabeatsError::UnknownTier(s.to_string())),
        }
    }
}

// =============================================================================
// FEATURE KEY
// =============================================================================

/// Identifier for one gateable product capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FeatureKey {
    StarInspiredPlanLimited,
    MealsPerWeekBasic,
    StreakCounter,
    AllStarInspiredPlans,
    FullWeeklyPlanning,
    GroceryList,
    StreakContinuation,
    BlendedPlans,
    PersonalizedPortions,
    WeeklyInsights,
}

impl FeatureKey {
    /// Every declared feature, in catalog order.
    pub const ALL: [FeatureKey; 10] = [
        FeatureKey::StarInspiredPlanLimited,
        FeatureKey::MealsPerWeekBasic,
        FeatureKey::StreakCounter,
        FeatureKey::AllStarInspiredPlans,
        FeatureKey::FullWeeklyPlanning,
        FeatureKey::GroceryList,
        FeatureKey::StreakContinuation,
        FeatureKey::BlendedPlans,
        FeatureKey::PersonalizedPortions,
        FeatureKey::WeeklyInsights,
    ];

    /// Wire name, identical to the serde representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            FeatureKey::StarInspiredPlanLimited => "starInspiredPlanLimited",
            FeatureKey::MealsPerWeekBasic => "mealsPerWeekBasic",
            FeatureKey::StreakCounter => "streakCounter",
            FeatureKey::AllStarInspiredPlans => "allStarInspiredPlans",
            FeatureKey::FullWeeklyPlanning => "fullWeeklyPlanning",
            FeatureKey::GroceryList => "groceryList",
            FeatureKey::StreakContinuation => "streakContinuation",
            FeatureKey::BlendedPlans => "blendedPlans",
            FeatureKey::PersonalizedPortions => "personalizedPortions",
            FeatureKey::WeeklyInsights => "weeklyInsights",
        }
    }

    /// Copy used by upgrade prompts.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            FeatureKey::StarInspiredPlanLimited => "Access limited star-inspired meal plans",
            FeatureKey::MealsPerWeekBasic => "Plan 3-5 meals per week",
            FeatureKey::StreakCounter => "Track your meal logging streak",
            FeatureKey::AllStarInspiredPlans => "Access all star-inspired meal plans",
            FeatureKey::FullWeeklyPlanning => "Plan your entire week of meals",
            FeatureKey::GroceryList => "Generate smart grocery lists from your meal plan",
            FeatureKey::StreakContinuation => "Use streak freeze to maintain your streak",
            FeatureKey::BlendedPlans => "Create custom blended meal plans",
            FeatureKey::PersonalizedPortions => "Get personalized portion recommendations",
            FeatureKey::WeeklyInsights => "Receive detailed weekly nutrition insights",
        }
    }
}

impl fmt::Display for FeatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FeatureKey {
    type Err = HabeatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FeatureKey::ALL
            .into_iter()
            .find(|feature| feature.as_str() == trimmed)
            .ok_or_else(|| HabeatsError::UnknownFeature(s.to_string()))
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in Habeats.
///
/// The cache never surfaces these to its callers; they are logged and turned
/// into misses. Stores and parsers return them so the cache can tell a full
/// store apart from a broken one.
#[derive(Debug, Error)]
pub enum HabeatsError {
    /// A tier name did not match any subscription tier.
    #[error("Unknown subscription tier: {0}")]
    UnknownTier(String),

    /// A feature name did not match any gateable feature.
    #[error("Unknown feature: {0}")]
    UnknownFeature(String),

    /// The store has no room left for the write.
    #[error("Storage quota exceeded: {requested} bytes requested, capacity {capacity} bytes")]
    QuotaExceeded {
        /// Bytes the store would hold after the write.
        requested: u64,
        /// Configured capacity of the store.
        capacity: u64,
    },

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O or storage-engine error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be read or was invalid.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl HabeatsError {
    /// Check if this error means the store is full.
    #[must_use]
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, HabeatsError::QuotaExceeded { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_ranks_are_strictly_increasing() {
        let ranks: Vec<u8> = SubscriptionTier::ALL.iter().map(|t| t.rank()).collect();
        assert_eq!(ranks, vec![0, 1, 2]);
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("Plus".parse::<SubscriptionTier>().ok(), Some(SubscriptionTier::Plus));
        assert_eq!(" premium ".parse::<SubscriptionTier>().ok(), Some(SubscriptionTier::Premium));
        assert!(matches!(
            "gold".parse::<SubscriptionTier>(),
            Err(HabeatsError::UnknownTier(_))
        ));
    }

    #[test]
    fn tier_serde_is_lowercase() {
        let json = serde_json::to_string(&SubscriptionTier::Premium).expect("serialize");
        assert_eq!(json, "\"premium\"");
    }

    #[test]
    fn missing_tier_defaults_to_free() {
        assert_eq!(SubscriptionTier::default(), SubscriptionTier::Free);
    }

    #[test]
    fn feature_names_match_serde() {
        for feature in FeatureKey::ALL {
            let json = serde_json::to_string(&feature).expect("serialize");
            assert_eq!(json, format!("\"{}\"", feature.as_str()));
            assert_eq!(feature.as_str().parse::<FeatureKey>().ok(), Some(feature));
        }
    }

    #[test]
    fn unknown_feature_rejected() {
        assert!(matches!(
            "teleportation".parse::<FeatureKey>(),
            Err(HabeatsError::UnknownFeature(_))
        ));
    }

    #[test]
    fn quota_error_is_recognized() {
        let err = HabeatsError::QuotaExceeded {
            requested: 10,
            capacity: 5,
        };
        assert!(err.is_quota_exceeded());
        assert!(!HabeatsError::IoError("disk".into()).is_quota_exceeded());
    }
}
