//! # Authentication Module
//!
//! API key authentication for the Habeats HTTP API, applied per [`RouteClass`].
//!
//! - Public routes (`/health`, `/tiers`, `/features`) never need a key.
//! - Client routes need the client key.
//! - Admin routes (`POST /cache/sweep`, `DELETE /cache`) need the admin key.
//!
//! ## Configuration
//!
//! - `HABEATS_API_KEY`: client key; unset leaves client routes open
//! - `HABEATS_ADMIN_KEY`: admin key; falls back to `HABEATS_API_KEY` when unset
//!
//! ## Usage
//!
//! ```text
//! Authorization: Bearer <your-api-key>
//! ```

use super::middleware::RouteClass;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;

// =============================================================================
// API KEYS
// =============================================================================

/// Keys accepted by the API.
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    client: Option<String>,
    admin: Option<String>,
}

impl ApiKeys {
    /// Build from optional keys. Empty strings count as unset, and a missing
    /// admin key falls back to the client key.
    pub fn new(client: Option<String>, admin: Option<String>) -> Self {
        let client = client.filter(|k| !k.is_empty());
        let admin = admin.filter(|k| !k.is_empty()).or_else(|| client.clone());
        Self { client, admin }
    }

    /// Keys from `HABEATS_API_KEY` and `HABEATS_ADMIN_KEY`.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var("HABEATS_API_KEY").ok(),
            std::env::var("HABEATS_ADMIN_KEY").ok(),
        )
    }

    /// Whether any route requires a key.
    pub fn is_enabled(&self) -> bool {
        self.client.is_some() || self.admin.is_some()
    }

    /// The key a route of `class` requires, if any.
    pub fn required_key(&self, class: RouteClass) -> Option<&str> {
        match class {
            RouteClass::Public => None,
            RouteClass::Client => self.client.as_deref(),
            RouteClass::Admin => self.admin.as_deref(),
        }
    }
}

/// Constant-time key comparison. Both sides are padded to the same length
/// so the comparison always touches the same number of bytes.
fn keys_match(provided: &str, expected: &str) -> bool {
    let provided_bytes = provided.as_bytes();
    let expected_bytes = expected.as_bytes();

    let max_len = provided_bytes.len().max(expected_bytes.len());
    let mut padded_provided = vec![0u8; max_len];
    let mut padded_expected = vec![0u8; max_len];
    padded_provided[..provided_bytes.len()].copy_from_slice(provided_bytes);
    padded_expected[..expected_bytes.len()].copy_from_slice(expected_bytes);

    let bytes_match: bool = padded_provided.ct_eq(&padded_expected).into();
    bytes_match && provided_bytes.len() == expected_bytes.len()
}

/// Rejects with 401 unless the request carries the key its route class needs.
pub async fn api_key_auth_middleware(
    State(keys): State<ApiKeys>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, (StatusCode, &'static str)> {
    let class = RouteClass::of_request(&request);
    let Some(expected) = keys.required_key(class) else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        // Accept both "Bearer <key>" and a bare key.
        .map(|v| v.strip_prefix("Bearer ").unwrap_or(v));

    match provided {
        Some(key) if keys_match(key, expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(
                event = "auth_failure",
                reason = "invalid_api_key",
                route_class = ?class,
                "Authentication failed: invalid API key"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
        None => {
            tracing::warn!(
                event = "auth_failure",
                reason = "missing_authorization_header",
                route_class = ?class,
                "Missing Authorization header"
            );
            Err((StatusCode::UNAUTHORIZED, "Unauthorized"))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
