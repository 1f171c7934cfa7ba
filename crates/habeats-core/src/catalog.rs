//! # Tier Catalog
//!
//! Paywall data: tier names, monthly prices and marketing lines, plus the
//! upgrade offer shown when a feature is locked.
//!
//! Prices are integer cents.

use crate::access::{has_feature_access, required_tier};
use crate::{FeatureKey, SubscriptionTier};
use serde::Serialize;

/// One purchasable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierDefinition {
    pub id: SubscriptionTier,
    pub name: &'static str,
    pub price_cents: u32,
    pub features: &'static [&'static str],
}

impl TierDefinition {
    /// Monthly price label, e.g. `"$9.99/month"`.
    #[must_use]
    pub fn price_label(&self) -> String {
        format!(
            "${}.{:02}/month",
            self.price_cents / 100,
            self.price_cents % 100
        )
    }
}

/// Every tier, cheapest first.
pub const TIERS: [TierDefinition; 3] = [
    TierDefinition {
        id: SubscriptionTier::Free,
        name: "Free",
        price_cents: 0,
        features: &[
            "1 Star-Inspired Plan (limited)",
            "3\u{2013}5 meals/week",
            "Streak counter (visible \u{1F525})",
        ],
    },
    TierDefinition {
        id: SubscriptionTier::Plus,
        name: "Plus",
        price_cents: 999,
        features: &[
            "All Star-Inspired Plans",
            "Full weekly planning",
            "Grocery list",
            "Streak continuation",
        ],
    },
    TierDefinition {
        id: SubscriptionTier::Premium,
        name: "Premium",
        price_cents: 1499,
        features: &["Blended plans", "Personalized portions", "Weekly insights"],
    },
];

/// Catalog entry for a tier.
#[must_use]
pub fn tier_definition(tier: SubscriptionTier) -> &'static TierDefinition {
    match tier {
        SubscriptionTier::Free => &TIERS[0],
        SubscriptionTier::Plus => &TIERS[1],
        SubscriptionTier::Premium => &TIERS[2],
    }
}

/// What to show a user who lacks a feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeOffer {
    pub feature: FeatureKey,
    pub required_tier: SubscriptionTier,
    pub tier_name: &'static str,
    pub price_label: String,
    pub description: &'static str,
}

/// Upgrade offer for `feature`, or `None` if `tier` already has it.
///
/// Free features never produce an offer.
#[must_use]
pub fn upgrade_offer(tier: SubscriptionTier, feature: FeatureKey) -> Option<UpgradeOffer> {
    if has_feature_access(tier, feature) {
        return None;
    }

    let required = required_tier(feature);
    let definition = tier_definition(required);
    Some(UpgradeOffer {
        feature,
        required_tier: required,
        tier_name: definition.name,
        price_label: definition.price_label(),
        description: feature.description(),
    })
}
