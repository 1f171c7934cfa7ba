//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.

use super::{
    AppState,
    types::{
        AccessRequest, AccessResponse, CacheAgeResponse, CacheReadResponse, CacheWriteRequest,
        CacheWriteResponse, ClearResponse, ErrorResponse, FeatureResponse, HealthResponse,
        PlanRequest, PrefixQuery, StreakRequest, StreakResponse, TierResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use habeats_core::{
    CacheConfig, FeatureKey, HabeatsError, TIERS, primitives::duration_to_millis, required_tier,
    upgrade_offer,
};
use std::time::Duration;

/// 400 with the validation error.
fn bad_request(e: HabeatsError) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse::new(e.to_string())),
    )
        .into_response()
}

/// Per-request cache options: `?prefix=` beats the configured default.
fn cache_options(state: &AppState, query: PrefixQuery) -> CacheConfig {
    match query.prefix {
        Some(prefix) => state.cache_defaults.clone().with_prefix(prefix),
        None => state.cache_defaults.clone(),
    }
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse::new(state.policy.bypass_active()))
}

// =============================================================================
// CATALOG HANDLERS
// =============================================================================

/// List subscription tiers.
pub async fn tiers_handler() -> impl IntoResponse {
    let tiers: Vec<TierResponse> = TIERS.iter().map(TierResponse::from).collect();
    Json(tiers)
}

/// List gateable features with their required tier.
pub async fn features_handler() -> impl IntoResponse {
    let features: Vec<FeatureResponse> =
        FeatureKey::ALL.into_iter().map(FeatureResponse::from).collect();
    Json(features)
}

// =============================================================================
// ACCESS HANDLERS
// =============================================================================

/// Check feature access for a tier.
pub async fn access_handler(
    State(state): State<AppState>,
    Json(request): Json<AccessRequest>,
) -> Response {
    let (tier, feature) = match request.parse() {
        Ok(parsed) => parsed,
        Err(e) => return bad_request(e),
    };

    let allowed = state.policy.has_feature_access_with_bypass(tier, feature);
    let response = AccessResponse {
        allowed,
        required_tier: required_tier(feature),
        bypass: state.policy.bypass_active(),
        upgrade: if allowed {
            None
        } else {
            upgrade_offer(tier, feature)
        },
    };

    (StatusCode::OK, Json(response)).into_response()
}

/// Check whether another plan may be generated.
pub async fn plan_eligibility_handler(
    State(state): State<AppState>,
    Json(request): Json<PlanRequest>,
) -> Response {
    let tier = match request.tier() {
        Ok(tier) => tier,
        Err(e) => return bad_request(e),
    };

    let decision = state
        .policy
        .can_generate_new_plan(tier, request.current_plan_count);
    (StatusCode::OK, Json(decision)).into_response()
}

/// Check whether to show the streak upsell.
pub async fn streak_prompt_handler(
    State(state): State<AppState>,
    Json(request): Json<StreakRequest>,
) -> Response {
    let tier = match request.tier() {
        Ok(tier) => tier,
        Err(e) => return bad_request(e),
    };

    let show_prompt = state.policy.should_show_streak_upgrade_prompt(
        tier,
        request.current_streak,
        request.has_seen_prompt,
    );
    (StatusCode::OK, Json(StreakResponse { show_prompt })).into_response()
}

// =============================================================================
// CACHE HANDLERS
// =============================================================================

/// Read a cache entry.
pub async fn cache_get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> impl IntoResponse {
    let options = cache_options(&state, query);
    // Write lock: an expired hit is evicted during the read.
    let mut cache = state.cache.write().await;
    let data = cache.get_cached_data::<serde_json::Value>(&key, Some(&options));

    Json(CacheReadResponse {
        key,
        hit: data.is_some(),
        data,
    })
}

/// Write a cache entry.
pub async fn cache_put_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PrefixQuery>,
    Json(request): Json<CacheWriteRequest>,
) -> impl IntoResponse {
    let options = cache_options(&state, query);
    let ttl = request.ttl_ms.map(Duration::from_millis);

    let mut cache = state.cache.write().await;
    let stored = cache.set_cached_data(&key, &request.data, ttl, Some(&options));

    Json(CacheWriteResponse { key, stored })
}

/// Delete a cache entry.
pub async fn cache_delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> impl IntoResponse {
    let options = cache_options(&state, query);
    let mut cache = state.cache.write().await;
    cache.remove_cached_data(&key, Some(&options));
    StatusCode::NO_CONTENT
}

/// Age of a cache entry, valid or not.
pub async fn cache_age_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<PrefixQuery>,
) -> impl IntoResponse {
    let options = cache_options(&state, query);
    let cache = state.cache.read().await;
    let age_ms = cache
        .get_cache_age(&key, Some(&options))
        .map(duration_to_millis);

    Json(CacheAgeResponse { key, age_ms })
}

/// Remove expired entries.
pub async fn cache_sweep_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut cache = state.cache.write().await;
    Json(ClearResponse {
        removed: cache.clear_expired_cache(),
    })
}

/// Remove every cache entry.
pub async fn cache_clear_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut cache = state.cache.write().await;
    Json(ClearResponse {
        removed: cache.clear_all_cache(),
    })
}
