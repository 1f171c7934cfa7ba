//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use habeats_core::{
    FeatureKey, HabeatsError, PlanDecision, SubscriptionTier, TierDefinition, UpgradeOffer,
    required_tier,
};
use serde::{Deserialize, Serialize};

/// Parse an optional tier name; a missing tier is free.
fn parse_tier(tier: Option<&str>) -> Result<SubscriptionTier, HabeatsError> {
    tier.map(str::parse).transpose().map(Option::unwrap_or_default)
}

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub bypass_active: bool,
}

impl HealthResponse {
    #[must_use]
    pub fn new(bypass_active: bool) -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            bypass_active,
        }
    }
}

// =============================================================================
// ERROR RESPONSE
// =============================================================================

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

// =============================================================================
// CATALOG RESPONSES
// =============================================================================

/// One tier of the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierResponse {
    pub id: SubscriptionTier,
    pub name: String,
    pub price_cents: u32,
    pub price_label: String,
    pub features: Vec<String>,
}

impl From<&TierDefinition> for TierResponse {
    fn from(definition: &TierDefinition) -> Self {
        Self {
            id: definition.id,
            name: definition.name.to_string(),
            price_cents: definition.price_cents,
            price_label: definition.price_label(),
            features: definition.features.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// One gateable feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureResponse {
    pub feature: FeatureKey,
    pub required_tier: SubscriptionTier,
    pub description: String,
}

impl From<FeatureKey> for FeatureResponse {
    fn from(feature: FeatureKey) -> Self {
        Self {
            feature,
            required_tier: required_tier(feature),
            description: feature.description().to_string(),
        }
    }
}

// =============================================================================
// ACCESS REQUEST/RESPONSE
// =============================================================================

/// Feature access check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Tier name; missing means free.
    #[serde(default)]
    pub tier: Option<String>,
    pub feature: String,
}

impl AccessRequest {
    /// Validate tier and feature names.
    pub fn parse(&self) -> Result<(SubscriptionTier, FeatureKey), HabeatsError> {
        Ok((parse_tier(self.tier.as_deref())?, self.feature.parse()?))
    }
}

/// Feature access decision.
#[derive(Debug, Clone, Serialize)]
pub struct AccessResponse {
    pub allowed: bool,
    pub required_tier: SubscriptionTier,
    pub bypass: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade: Option<UpgradeOffer>,
}

// =============================================================================
// PLAN ELIGIBILITY
// =============================================================================

/// Plan-creation check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    #[serde(default)]
    pub tier: Option<String>,
    pub current_plan_count: u32,
}

impl PlanRequest {
    pub fn tier(&self) -> Result<SubscriptionTier, HabeatsError> {
        parse_tier(self.tier.as_deref())
    }
}

/// Plan-creation decision, in the client's camelCase shape.
pub type PlanResponse = PlanDecision;

// =============================================================================
// STREAK PROMPT
// =============================================================================

/// Streak upsell check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakRequest {
    #[serde(default)]
    pub tier: Option<String>,
    pub current_streak: u32,
    #[serde(default)]
    pub has_seen_prompt: bool,
}

impl StreakRequest {
    pub fn tier(&self) -> Result<SubscriptionTier, HabeatsError> {
        parse_tier(self.tier.as_deref())
    }
}

/// Streak upsell decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreakResponse {
    pub show_prompt: bool,
}

// =============================================================================
// CACHE
// =============================================================================

/// `?prefix=` on cache routes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefixQuery {
    pub prefix: Option<String>,
}

/// Cache read result. A miss is a normal outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheReadResponse {
    pub key: String,
    pub hit: bool,
    pub data: Option<serde_json::Value>,
}

/// Cache write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheWriteRequest {
    pub data: serde_json::Value,
    /// Lifetime in milliseconds; falls back to the default progress TTL.
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

/// Cache write outcome. `stored = false` means the write was dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheWriteResponse {
    pub key: String,
    pub stored: bool,
}

/// Entry age.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheAgeResponse {
    pub key: String,
    pub age_ms: Option<u64>,
}

/// Bulk removal count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearResponse {
    pub removed: usize,
}
