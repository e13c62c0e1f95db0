//! Cross-origin policy, applied before the gatekeeper.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer. Entries that fail to parse are skipped with a warning.
pub fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let methods: Vec<Method> = parse_all(&config.allowed_methods, "method");
    let headers: Vec<HeaderName> = parse_all(&config.allowed_headers, "header");

    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(parse_all::<HeaderValue>(&config.allowed_origins, "origin"))
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(methods)
        .allow_headers(headers)
        .max_age(Duration::from_secs(config.max_age_secs))
}

fn parse_all<T: std::str::FromStr>(values: &[String], kind: &'static str) -> Vec<T> {
    values
        .iter()
        .filter_map(|value| match value.parse() {
            Ok(parsed) => Some(parsed),
            Err(_) => {
                tracing::warn!(kind, value = %value, "Ignoring invalid CORS entry");
                None
            }
        })
        .collect()
}
