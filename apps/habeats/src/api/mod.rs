//! # Habeats HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /tiers` - Subscription tier catalog
//! - `GET /features` - Gateable features and their required tier
//! - `POST /access` - Feature access decision
//! - `POST /plans/eligibility` - Plan-creation decision
//! - `POST /streak/prompt` - Streak upsell decision
//! - `GET|PUT|DELETE /cache/{key}` - Read, write or remove a cache entry
//! - `GET /cache/{key}/age` - Age of a cache entry
//! - `POST /cache/sweep` - Remove expired entries
//! - `DELETE /cache` - Remove every cache entry
//!
//! Cache routes accept `?prefix=` to select a namespace.
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `HABEATS_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `HABEATS_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `HABEATS_ADMIN_RATE_LIMIT`: Sweep and clear-all requests per second (default: 5, 0 to disable)
//! - `HABEATS_API_KEY`: If set, client routes require Bearer token authentication
//! - `HABEATS_ADMIN_KEY`: Key for sweep and clear-all (default: `HABEATS_API_KEY`)
//!
//! `/health`, `/tiers` and `/features` are always open.

mod auth;
mod handlers;
mod middleware;
mod types;

// Re-exports for external use
pub use auth::ApiKeys;
pub use middleware::{
    GlobalRateLimiter, RateLimits, RouteClass, create_rate_limiter,
    get_admin_rate_limit_from_env, get_rate_limit_from_env,
};
// Re-export types for integration tests (via `habeats::api::*`)
pub use types::{
    AccessRequest, AccessResponse, CacheAgeResponse, CacheReadResponse, CacheWriteRequest,
    CacheWriteResponse, ClearResponse, ErrorResponse, FeatureResponse, HealthResponse,
    PlanRequest, PlanResponse, PrefixQuery, StreakRequest, StreakResponse, TierResponse,
};

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{delete, get, post},
};
use habeats_core::{AccessPolicy, CacheConfig, HabeatsError, StorageBackend, TtlCache};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state: the cache behind one lock, plus the access policy
/// fixed at startup.
#[derive(Clone)]
pub struct AppState {
    /// The cache over the configured store.
    pub cache: Arc<RwLock<TtlCache<StorageBackend>>>,
    /// Access policy built from the startup runtime flags.
    pub policy: AccessPolicy,
    /// Cache options used when a request names no prefix.
    pub cache_defaults: CacheConfig,
}

impl AppState {
    /// Create new app state.
    #[must_use]
    pub fn new(
        cache: TtlCache<StorageBackend>,
        policy: AccessPolicy,
        cache_defaults: CacheConfig,
    ) -> Self {
        Self {
            cache: Arc::new(RwLock::new(cache)),
            policy,
            cache_defaults,
        }
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

const CORS_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Build CORS layer from environment configuration.
///
/// Reads `HABEATS_CORS_ORIGINS`:
/// - If "*": allows all origins
/// - If not set: defaults to localhost only
/// - Otherwise: parses comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var("HABEATS_CORS_ORIGINS").ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (HABEATS_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in HABEATS_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                CorsLayer::new()
                    .allow_origin(allowed_origins)
                    .allow_methods(CORS_METHODS)
                    .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
            }
        }
        None => {
            tracing::info!("CORS: No HABEATS_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

/// Localhost-only CORS, the dev servers of the web client.
fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8081",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8081",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(CORS_METHODS)
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing - logs all requests
/// 2. CORS - handles preflight requests
/// 3. Rate Limiting per route class (if enabled)
/// 4. Authentication per route class (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limits = RateLimits::from_env();
    if rate_limits.is_enabled() {
        tracing::info!(
            global_rps = get_rate_limit_from_env(),
            admin_rps = get_admin_rate_limit_from_env(),
            "Rate limiting enabled"
        );
    } else {
        tracing::info!("Rate limiting disabled");
    }

    let api_keys = ApiKeys::from_env();
    if api_keys.is_enabled() {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - cache routes are publicly accessible! \
             Set HABEATS_API_KEY environment variable to enable authentication."
        );
    }

    if state.policy.bypass_active() {
        tracing::warn!("Serving with the development access bypass active");
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/tiers", get(handlers::tiers_handler))
        .route("/features", get(handlers::features_handler))
        .route("/access", post(handlers::access_handler))
        .route(
            "/plans/eligibility",
            post(handlers::plan_eligibility_handler),
        )
        .route("/streak/prompt", post(handlers::streak_prompt_handler))
        .route("/cache", delete(handlers::cache_clear_handler))
        .route("/cache/sweep", post(handlers::cache_sweep_handler))
        .route(
            "/cache/{key}",
            get(handlers::cache_get_handler)
                .put(handlers::cache_put_handler)
                .delete(handlers::cache_delete_handler),
        )
        .route("/cache/{key}/age", get(handlers::cache_age_handler));

    if api_keys.is_enabled() {
        router = router.layer(axum_middleware::from_fn_with_state(
            api_keys,
            auth::api_key_auth_middleware,
        ));
    }

    if rate_limits.is_enabled() {
        router = router.layer(axum_middleware::from_fn_with_state(
            rate_limits,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(2 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), HabeatsError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| HabeatsError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("Habeats HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| HabeatsError::IoError(format!("Server error: {}", e)))
}
