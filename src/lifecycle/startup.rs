//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the Postgres pool and Redis connection the health probe uses
//! - Fail fast when Redis cannot be reached within the startup timeout
//! - Bind the HTTP listener
//!
//! # Design Decisions
//! - The Postgres pool connects lazily; its health shows up in `/health`
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;
use std::time::Duration;

use redis::aio::ConnectionManager;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::GatewayConfig;
use crate::health::{HealthChecker, PostgresProbe, RedisProbe};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid postgres configuration: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("redis unavailable: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("timed out connecting to {0}")]
    Timeout(&'static str),

    #[error("failed to bind listener on {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Connect to the external dependencies and wrap them in a health checker.
pub async fn connect_dependencies(config: &GatewayConfig) -> Result<HealthChecker, StartupError> {
    let startup_timeout = Duration::from_secs(config.timeouts.startup_secs);
    let probe_timeout = Duration::from_millis(config.health.timeout_ms);

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(probe_timeout)
        .connect_lazy(&config.health.postgres_url)?;
    tracing::info!("Postgres pool configured");

    let client = redis::Client::open(config.health.redis_url.as_str())?;
    let conn = tokio::time::timeout(startup_timeout, ConnectionManager::new(client))
        .await
        .map_err(|_| StartupError::Timeout("redis"))??;
    tracing::info!("Redis connection established");

    Ok(HealthChecker::new(
        Arc::new(PostgresProbe::new(pool)),
        Arc::new(RedisProbe::new(conn)),
        probe_timeout,
    ))
}

/// Bind the HTTP listener on `listener.bind_address`.
pub async fn bind_listener(config: &GatewayConfig) -> Result<TcpListener, StartupError> {
    let address = &config.listener.bind_address;
    TcpListener::bind(address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })
}
