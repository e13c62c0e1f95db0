//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => GatewayConfig::default(),
    };

    let mut errors = apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    if let Err(invalid) = validate_config(&config) {
        errors.extend(invalid);
    }

    if errors.is_empty() {
        Ok(config)
    } else {
        Err(ConfigError::Validation(errors))
    }
}

/// Parse a TOML document. Missing sections fall back to defaults.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Override config values from the deployment environment.
///
/// `lookup` returns the value of an environment variable; empty values are
/// treated as unset. Values that cannot be applied are returned as errors and
/// leave the config untouched.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Vec<ValidationError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut errors = Vec::new();
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(env) = get("APP_ENV") {
        config.app.env = env;
    }
    if let Some(addr) = get("HTTP_ADDR") {
        // ":8080" means every interface
        config.listener.bind_address = match addr.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}"),
            None => addr,
        };
    }
    if let Some(url) = get("POSTGRES_URL") {
        config.health.postgres_url = url;
    }
    if let Some(addr) = get("REDIS_ADDR") {
        config.health.redis_url = if addr.contains("://") {
            addr
        } else {
            format!("redis://{addr}")
        };
    }
    if let Some(url) = get("REDIS_URL") {
        config.health.redis_url = url;
    }
    if let Some(secret) = get("JWT_SECRET") {
        config.auth.jwt_secret = secret;
    }
    if let Some(max) = get("RATE_LIMIT_MAX") {
        match max.parse() {
            Ok(max) => config.rate_limit.max_requests = max,
            Err(_) => errors.push(ValidationError::InvalidEnv {
                key: "RATE_LIMIT_MAX",
                value: max,
            }),
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            [auth]
            jwt_secret = "s3cr3t"

            [rate_limit]
            max_requests = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.auth.jwt_secret, "s3cr3t");
        assert_eq!(config.auth.protected_routes, vec!["/api/v1/me".to_string()]);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert_eq!(config.health.timeout_ms, 2000);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let err = parse_config("[rate_limit]\nmax_requests = \"lots\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_win() {
        let mut config = GatewayConfig::default();
        let errors = apply_env_overrides(
            &mut config,
            env(&[
                ("APP_ENV", "production"),
                ("HTTP_ADDR", ":9000"),
                ("REDIS_ADDR", "cache:6380"),
                ("JWT_SECRET", "from-env"),
                ("RATE_LIMIT_MAX", "10"),
                ("POSTGRES_URL", ""),
            ]),
        );

        assert!(errors.is_empty());
        assert!(config.app.is_production());
        assert_eq!(config.listener.bind_address, "0.0.0.0:9000");
        assert_eq!(config.health.redis_url, "redis://cache:6380");
        assert_eq!(config.auth.jwt_secret, "from-env");
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(
            config.health.postgres_url,
            GatewayConfig::default().health.postgres_url
        );
    }

    #[test]
    fn unparsable_rate_limit_override_is_an_error() {
        for bad in ["abc", "-1", "1.5"] {
            let mut config = GatewayConfig::default();
            let errors = apply_env_overrides(&mut config, env(&[("RATE_LIMIT_MAX", bad)]));
            assert_eq!(
                errors,
                vec![ValidationError::InvalidEnv {
                    key: "RATE_LIMIT_MAX",
                    value: bad.to_string(),
                }]
            );
        }
    }

    #[test]
    fn env_errors_are_reported_with_validation_errors() {
        let mut config = GatewayConfig::default();
        config.auth.jwt_secret.clear();
        let mut errors = apply_env_overrides(&mut config, env(&[("RATE_LIMIT_MAX", "abc")]));
        errors.extend(validate_config(&config).unwrap_err());

        assert!(errors.contains(&ValidationError::InvalidEnv {
            key: "RATE_LIMIT_MAX",
            value: "abc".into(),
        }));
        assert!(errors.contains(&ValidationError::EmptySecret));
        let message = ConfigError::Validation(errors).to_string();
        assert!(message.contains("RATE_LIMIT_MAX"));
    }
}
