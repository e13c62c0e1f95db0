//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//! - Refuse the placeholder secret in production
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, DEFAULT_JWT_SECRET};

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("auth.jwt_secret must not be empty")]
    EmptySecret,

    #[error("auth.jwt_secret must be changed from the default in production")]
    DefaultSecretInProduction,

    #[error("auth.protected_routes entry {0:?} must start with '/'")]
    InvalidProtectedRoute(String),

    #[error("{field} must be at least 1")]
    Zero { field: &'static str },

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("observability.log_format must be \"pretty\" or \"json\", got {0:?}")]
    InvalidLogFormat(String),

    #[error("environment variable {key} has an invalid value: {value:?}")]
    InvalidEnv { key: &'static str, value: String },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.auth.jwt_secret.is_empty() {
        errors.push(ValidationError::EmptySecret);
    } else if config.app.is_production() && config.auth.jwt_secret == DEFAULT_JWT_SECRET {
        errors.push(ValidationError::DefaultSecretInProduction);
    }

    for route in &config.auth.protected_routes {
        if !route.starts_with('/') {
            errors.push(ValidationError::InvalidProtectedRoute(route.clone()));
        }
    }

    let ranges = [
        ("rate_limit.max_requests", u64::from(config.rate_limit.max_requests)),
        ("rate_limit.window_secs", config.rate_limit.window_secs),
        ("rate_limit.sweep_interval_secs", config.rate_limit.sweep_interval_secs),
        ("health.timeout_ms", config.health.timeout_ms),
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.startup_secs", config.timeouts.startup_secs),
    ];
    for (field, value) in ranges {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    match config.observability.log_format.as_str() {
        "pretty" | "json" => {}
        other => errors.push(ValidationError::InvalidLogFormat(other.to_string())),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
