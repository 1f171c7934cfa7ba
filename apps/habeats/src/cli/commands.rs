//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.

use super::CacheCommand;
use crate::api::{self, AppState};
use crate::config::HabeatsConfig;
use habeats_core::{
    CacheConfig, FeatureKey, HabeatsError, SubscriptionTier, TIERS, primitives::duration_to_millis,
    required_tier, upgrade_offer,
};
use std::time::Duration;

/// Print a JSON value the way every `--json-mode` command does.
fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

fn cache_options(config: &HabeatsConfig, prefix: Option<String>) -> CacheConfig {
    match prefix {
        Some(prefix) => config.cache_defaults().with_prefix(prefix),
        None => config.cache_defaults(),
    }
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Start the HTTP server.
pub async fn cmd_server(config: &HabeatsConfig, host: &str, port: u16) -> Result<(), HabeatsError> {
    let cache = config.open_cache()?;
    let policy = config.access_policy();

    println!("Habeats Gating Service Starting...");
    println!();
    println!("Configuration:");
    println!("  Host:     {}", host);
    println!("  Port:     {}", port);
    println!("  Mode:     {:?}", config.runtime.mode);
    if config.cache.in_memory {
        println!("  Cache:    in-memory");
    } else {
        println!("  Cache:    {:?}", config.cache.path);
    }
    println!("  Bypass:   {}", policy.bypass_active());
    println!();
    println!("Endpoints:");
    println!("  GET  /health            - Health check");
    println!("  GET  /tiers             - Tier catalog");
    println!("  GET  /features          - Gateable features");
    println!("  POST /access            - Feature access decision");
    println!("  POST /plans/eligibility - Plan-creation decision");
    println!("  POST /streak/prompt     - Streak upsell decision");
    println!("  *    /cache/...         - Cache administration");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let state = AppState::new(cache, policy, config.cache_defaults());
    let addr = format!("{}:{}", host, port);
    api::run_server(&addr, state).await
}

// =============================================================================
// CATALOG COMMANDS
// =============================================================================

/// List subscription tiers.
pub fn cmd_tiers(json_mode: bool) -> Result<(), HabeatsError> {
    if json_mode {
        let tiers: Vec<api::TierResponse> = TIERS.iter().map(api::TierResponse::from).collect();
        print_json(&serde_json::json!(tiers));
        return Ok(());
    }

    println!("Habeats Subscription Tiers");
    println!("==========================");
    for tier in &TIERS {
        println!();
        println!("{} ({})", tier.name, tier.price_label());
        for line in tier.features {
            println!("  - {}", line);
        }
    }

    Ok(())
}

/// List gateable features.
pub fn cmd_features(json_mode: bool) -> Result<(), HabeatsError> {
    if json_mode {
        let features: Vec<api::FeatureResponse> = FeatureKey::ALL
            .into_iter()
            .map(api::FeatureResponse::from)
            .collect();
        print_json(&serde_json::json!(features));
        return Ok(());
    }

    println!("Habeats Features");
    println!("================");
    for feature in FeatureKey::ALL {
        println!(
            "{:<22} {:<8} {}",
            feature.as_str(),
            required_tier(feature).display_name(),
            feature.description()
        );
    }

    Ok(())
}

// =============================================================================
// ACCESS COMMANDS
// =============================================================================

/// Check feature access for a tier.
pub fn cmd_access(
    config: &HabeatsConfig,
    json_mode: bool,
    tier: &str,
    feature: &str,
) -> Result<(), HabeatsError> {
    let tier: SubscriptionTier = tier.parse()?;
    let feature: FeatureKey = feature.parse()?;
    let policy = config.access_policy();

    let allowed = policy.has_feature_access_with_bypass(tier, feature);
    let offer = if allowed {
        None
    } else {
        upgrade_offer(tier, feature)
    };

    if json_mode {
        print_json(&serde_json::json!({
            "tier": tier,
            "feature": feature,
            "allowed": allowed,
            "required_tier": required_tier(feature),
            "bypass": policy.bypass_active(),
            "upgrade": offer,
        }));
        return Ok(());
    }

    println!(
        "{} on {}: {}",
        feature,
        tier.display_name(),
        if allowed { "allowed" } else { "denied" }
    );
    if let Some(offer) = offer {
        println!(
            "Upgrade to {} ({}): {}",
            offer.tier_name, offer.price_label, offer.description
        );
    }

    Ok(())
}

/// Check whether another plan may be generated.
pub fn cmd_plan(
    config: &HabeatsConfig,
    json_mode: bool,
    tier: &str,
    count: u32,
) -> Result<(), HabeatsError> {
    let tier: SubscriptionTier = tier.parse()?;
    let decision = config.access_policy().can_generate_new_plan(tier, count);

    if json_mode {
        print_json(&serde_json::json!(decision));
        return Ok(());
    }

    if decision.can_generate {
        println!("A new plan can be generated.");
    } else {
        println!("Plan limit reached.");
    }
    if let Some(reason) = &decision.reason {
        println!("{}", reason);
    }

    Ok(())
}

/// Check whether to show the streak upgrade prompt.
pub fn cmd_streak(
    config: &HabeatsConfig,
    json_mode: bool,
    tier: &str,
    streak: u32,
    seen: bool,
) -> Result<(), HabeatsError> {
    let tier: SubscriptionTier = tier.parse()?;
    let show_prompt = config
        .access_policy()
        .should_show_streak_upgrade_prompt(tier, streak, seen);

    if json_mode {
        print_json(&serde_json::json!({ "show_prompt": show_prompt }));
    } else if show_prompt {
        println!("Show the streak upgrade prompt.");
    } else {
        println!("No prompt.");
    }

    Ok(())
}

// =============================================================================
// CACHE COMMANDS
// =============================================================================

/// Run a cache subcommand against the configured store.
pub fn cmd_cache(
    config: &HabeatsConfig,
    json_mode: bool,
    action: CacheCommand,
) -> Result<(), HabeatsError> {
    let mut cache = config.open_cache()?;

    let output = match action {
        CacheCommand::Get { key, prefix } => {
            let options = cache_options(config, prefix);
            let data = cache.get_cached_data::<serde_json::Value>(&key, Some(&options));
            serde_json::json!({ "key": key, "hit": data.is_some(), "data": data })
        }
        CacheCommand::Set {
            key,
            data,
            ttl_ms,
            prefix,
        } => {
            let value: serde_json::Value = serde_json::from_str(&data)
                .map_err(|e| HabeatsError::DeserializationError(format!("--data: {}", e)))?;
            let options = cache_options(config, prefix);
            let ttl = ttl_ms.map(Duration::from_millis);
            let stored = cache.set_cached_data(&key, &value, ttl, Some(&options));
            serde_json::json!({ "key": key, "stored": stored })
        }
        CacheCommand::Remove { key, prefix } => {
            let options = cache_options(config, prefix);
            let existed = cache.remove_cached_data(&key, Some(&options));
            serde_json::json!({ "key": key, "existed": existed })
        }
        CacheCommand::Age { key, prefix } => {
            let options = cache_options(config, prefix);
            let age_ms = cache
                .get_cache_age(&key, Some(&options))
                .map(duration_to_millis);
            serde_json::json!({ "key": key, "age_ms": age_ms })
        }
        CacheCommand::Sweep => {
            serde_json::json!({ "removed": cache.clear_expired_cache() })
        }
        CacheCommand::Clear => {
            serde_json::json!({ "removed": cache.clear_all_cache() })
        }
    };

    if json_mode {
        print_json(&output);
        return Ok(());
    }

    match output.as_object() {
        Some(fields) => {
            for (name, value) in fields {
                println!("{:<8} {}", name, value);
            }
        }
        None => println!("{}", output),
    }

    Ok(())
}
