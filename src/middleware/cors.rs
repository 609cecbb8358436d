//! CORS policy for browser clients.
//!
//! Policy:
//! - Development: permissive (Allow-Origin: *), WITHOUT credentials.
//! - Production: allowlist origins from Config (comma-separated env var), WITHOUT credentials.
//!
//! The API has no auth, so no Authorization header is allowed through.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Apply CORS policy to the given Router.
pub fn apply(router: Router, config: &Config) -> Router {
    router.layer(layer(config))
}

fn layer(config: &Config) -> CorsLayer {
    let cors = if config.app_env.is_production() {
        // An empty allowlist allows nothing.
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new().allow_origin(allow_origin)
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    cors.allow_methods([
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .expose_headers([HeaderName::from_static("x-request-id")])
    .max_age(Duration::from_secs(60 * 10))
}
