//! # Access Evaluator
//!
//! Decides whether a subscription tier may use a feature, create another
//! plan, or should be shown the streak upsell.
//!
//! ## Bypass
//!
//! Development and test builds unlock everything. The switch is resolved
//! once, in [`AccessPolicy::from_flags`], from [`RuntimeFlags`] the caller
//! reads at startup. Nothing here looks at the environment.
//!
//! The switch only exists in debug builds or with the `dev-bypass` cargo
//! feature. A plain release build compiles it down to a constant `false`,
//! whatever the flags say.

use crate::primitives::{FREE_PLAN_LIMIT, FREE_PLAN_LIMIT_REASON, STREAK_PROMPT_THRESHOLD};
use crate::{FeatureKey, HabeatsError, SubscriptionTier};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

// =============================================================================
// FEATURE REQUIREMENTS
// =============================================================================

/// Minimum tier required for a feature.
#[must_use]
pub const fn required_tier(feature: FeatureKey) -> SubscriptionTier {
    match feature {
        FeatureKey::StarInspiredPlanLimited
        | FeatureKey::MealsPerWeekBasic
        | FeatureKey::StreakCounter => SubscriptionTier::Free,
        FeatureKey::AllStarInspiredPlans
        | FeatureKey::FullWeeklyPlanning
        | FeatureKey::GroceryList
        | FeatureKey::StreakContinuation => SubscriptionTier::Plus,
        FeatureKey::BlendedPlans | FeatureKey::PersonalizedPortions | FeatureKey::WeeklyInsights => {
            SubscriptionTier::Premium
        }
    }
}

/// Check if `tier` grants `feature`. Ignores any bypass.
#[must_use]
pub const fn has_feature_access(tier: SubscriptionTier, feature: FeatureKey) -> bool {
    tier.satisfies(required_tier(feature))
}

// =============================================================================
// RUNTIME FLAGS
// =============================================================================

/// Build flavor the host process was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    Development,
    #[default]
    Production,
}

impl FromStr for BuildMode {
    type Err = HabeatsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(BuildMode::Development),
            "production" | "prod" => Ok(BuildMode::Production),
            other => Err(HabeatsError::ConfigError(format!(
                "unknown build mode '{}' (expected development or production)",
                other
            ))),
        }
    }
}

/// Flags consulted once when building an [`AccessPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuntimeFlags {
    /// Development or production.
    pub build_mode: BuildMode,
    /// Explicit test-frontend switch.
    pub test_mode: bool,
}

impl RuntimeFlags {
    /// Production, no test mode.
    #[must_use]
    pub const fn production() -> Self {
        Self {
            build_mode: BuildMode::Production,
            test_mode: false,
        }
    }

    /// Whether these flags ask for the bypass.
    #[must_use]
    pub fn requests_bypass(&self) -> bool {
        self.build_mode == BuildMode::Development || self.test_mode
    }
}

// =============================================================================
// PLAN DECISION
// =============================================================================

/// Outcome of a plan-creation check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanDecision {
    /// Whether a new plan may be created.
    pub can_generate: bool,
    /// Refusal text for display, present only when refused.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reason: Option<String>,
    /// Whether upgrading would lift the refusal.
    pub requires_upgrade: bool,
}

impl PlanDecision {
    /// A permitting decision.
    #[must_use]
    pub fn allowed() -> Self {
        Self {
            can_generate: true,
            reason: None,
            requires_upgrade: false,
        }
    }

    /// A refusal that an upgrade would resolve.
    #[must_use]
    pub fn upgrade_required(reason: impl Into<String>) -> Self {
        Self {
            can_generate: false,
            reason: Some(reason.into()),
            requires_upgrade: true,
        }
    }
}

// =============================================================================
// ACCESS POLICY
// =============================================================================

/// Whether this build can honor a bypass request at all.
const BYPASS_COMPILED_IN: bool = cfg!(any(debug_assertions, feature = "dev-bypass"));

/// Tier-gating decisions with an injected development bypass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessPolicy {
    bypass: bool,
}

impl AccessPolicy {
    /// A policy that never bypasses.
    #[must_use]
    pub const fn strict() -> Self {
        Self { bypass: false }
    }

    /// Resolve the bypass from runtime flags.
    pub fn from_flags(flags: RuntimeFlags) -> Self {
        Self::resolve(flags, BYPASS_COMPILED_IN)
    }

    /// Resolution with the build switch passed in, so release behavior is
    /// testable from a debug build.
    fn resolve(flags: RuntimeFlags, compiled_in: bool) -> Self {
        let bypass = compiled_in && flags.requests_bypass();
        if bypass {
            tracing::warn!(
                build_mode = ?flags.build_mode,
                test_mode = flags.test_mode,
                "Access bypass ACTIVE - every feature is unlocked"
            );
        } else if flags.requests_bypass() {
            tracing::info!("Access bypass requested but compiled out; enforcing tiers");
        }
        Self { bypass }
    }

    /// Whether the development bypass is in effect.
    #[must_use]
    pub const fn bypass_active(&self) -> bool {
        self.bypass
    }

    /// Feature check that honors the bypass.
    #[must_use]
    pub fn has_feature_access_with_bypass(
        &self,
        tier: SubscriptionTier,
        feature: FeatureKey,
    ) -> bool {
        self.bypass || has_feature_access(tier, feature)
    }

    /// Whether another plan may be created given the current plan count.
    ///
    /// Free accounts hold at most [`FREE_PLAN_LIMIT`] plans; Plus and
    /// Premium are unlimited.
    #[must_use]
    pub fn can_generate_new_plan(
        &self,
        tier: SubscriptionTier,
        current_plan_count: u32,
    ) -> PlanDecision {
        if self.bypass {
            return PlanDecision::allowed();
        }

        if tier == SubscriptionTier::Free && current_plan_count >= FREE_PLAN_LIMIT {
            return PlanDecision::upgrade_required(FREE_PLAN_LIMIT_REASON);
        }

        PlanDecision::allowed()
    }

    /// Whether to show the streak upsell. Suppressed under the bypass.
    #[must_use]
    pub fn should_show_streak_upgrade_prompt(
        &self,
        tier: SubscriptionTier,
        current_streak: u32,
        has_seen_prompt: bool,
    ) -> bool {
        if self.bypass {
            return false;
        }

        tier == SubscriptionTier::Free
            && current_streak >= STREAK_PROMPT_THRESHOLD
            && !has_seen_prompt
    }
}

// =============================================================================
// TESTS
// =============================================================================
