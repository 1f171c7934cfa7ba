//! # Middleware Module
//!
//! Route classification and rate limiting for the Habeats HTTP API.
//!
//! Every request falls in one [`RouteClass`]. Catalog reads are public,
//! decisions and single-key cache calls are client traffic, and the bulk
//! cache routes (`POST /cache/sweep`, `DELETE /cache`) are admin traffic.
//! Bulk routes scan every key in the store, so they get their own, lower
//! quota on top of the global one.
//!
//! ## Configuration
//!
//! - `HABEATS_RATE_LIMIT`: global requests per second (default: 100, 0 disables)
//! - `HABEATS_ADMIN_RATE_LIMIT`: bulk cache requests per second (default: 5, 0 disables)

use axum::{
    body::Body,
    extract::State,
    http::{Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Default global rate limit in requests per second.
const DEFAULT_RATE_LIMIT: u32 = 100;

/// Default rate for sweep and clear-all.
const DEFAULT_ADMIN_RATE_LIMIT: u32 = 5;

// =============================================================================
// ROUTE CLASSES
// =============================================================================

/// Who a route is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Health and the static catalog. Never authenticated or limited.
    Public,
    /// Access decisions and single-key cache calls.
    Client,
    /// Bulk cache administration.
    Admin,
}

impl RouteClass {
    /// Classify a request by method and path.
    pub fn of(method: &Method, path: &str) -> Self {
        if *method == Method::GET && matches!(path, "/health" | "/tiers" | "/features") {
            RouteClass::Public
        } else if (*method == Method::POST && path == "/cache/sweep")
            || (*method == Method::DELETE && path == "/cache")
        {
            RouteClass::Admin
        } else {
            RouteClass::Client
        }
    }

    /// Classify an incoming request.
    pub fn of_request(request: &Request<Body>) -> Self {
        Self::of(request.method(), request.uri().path())
    }
}

// =============================================================================
// RATE LIMITER
// =============================================================================

/// Global rate limiter type alias.
pub type GlobalRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

/// Create a limiter, or `None` when the rate is 0.
pub fn create_rate_limiter(requests_per_second: u32) -> Option<GlobalRateLimiter> {
    NonZeroU32::new(requests_per_second)
        .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))))
}

fn rate_from_env(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

/// Value of `HABEATS_RATE_LIMIT`, or 100 if unset or unparsable.
pub fn get_rate_limit_from_env() -> u32 {
    rate_from_env("HABEATS_RATE_LIMIT", DEFAULT_RATE_LIMIT)
}

/// Value of `HABEATS_ADMIN_RATE_LIMIT`, or 5 if unset or unparsable.
pub fn get_admin_rate_limit_from_env() -> u32 {
    rate_from_env("HABEATS_ADMIN_RATE_LIMIT", DEFAULT_ADMIN_RATE_LIMIT)
}

/// Limiters applied per route class.
#[derive(Clone, Default)]
pub struct RateLimits {
    /// Shared by client and admin routes.
    pub global: Option<GlobalRateLimiter>,
    /// Extra quota for admin routes.
    pub admin: Option<GlobalRateLimiter>,
}

impl RateLimits {
    /// Limits from explicit rates; 0 disables a limiter.
    pub fn new(global_rps: u32, admin_rps: u32) -> Self {
        Self {
            global: create_rate_limiter(global_rps),
            admin: create_rate_limiter(admin_rps),
        }
    }

    /// Limits from `HABEATS_RATE_LIMIT` and `HABEATS_ADMIN_RATE_LIMIT`.
    pub fn from_env() -> Self {
        Self::new(get_rate_limit_from_env(), get_admin_rate_limit_from_env())
    }

    /// Whether any limiter is configured.
    pub fn is_enabled(&self) -> bool {
        self.global.is_some() || self.admin.is_some()
    }

    /// Spend one token for a request of `class`. Returns false when over quota.
    pub fn check(&self, class: RouteClass) -> bool {
        let within = |limiter: &Option<GlobalRateLimiter>| {
            limiter.as_ref().is_none_or(|l| l.check().is_ok())
        };

        match class {
            RouteClass::Public => true,
            RouteClass::Client => within(&self.global),
            // Admin spends from its own bucket first so a rejected sweep
            // does not eat global quota.
            RouteClass::Admin => within(&self.admin) && within(&self.global),
        }
    }
}

/// Rejects with 429 once the limiter for the route's class is exhausted.
pub async fn rate_limit_middleware(
    State(limits): State<RateLimits>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let class = RouteClass::of_request(&request);
    if limits.check(class) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            route_class = ?class,
            path = %request.uri().path(),
            "Rate limit exceeded"
        );
        Err((StatusCode::TOO_MANY_REQUESTS, "Too Many Requests"))
    }
}

// =============================================================================
// TESTS
// =============================================================================
