//! Dependency liveness probes.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use thiserror::Error;

/// Why a dependency was reported down.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("dependency unavailable: {0}")]
    Unavailable(String),

    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// A single external dependency that can be pinged.
#[async_trait]
pub trait DependencyProbe: Send + Sync {
    /// Name used in logs, metrics and the health report.
    fn name(&self) -> &'static str;

    async fn ping(&self) -> Result<(), ProbeError>;
}

/// Runs `SELECT 1` against the Postgres pool.
pub struct PostgresProbe {
    pool: PgPool,
}

impl PostgresProbe {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyProbe for PostgresProbe {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), ProbeError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::Unavailable(e.to_string()))
    }
}

/// Sends `PING` over a shared Redis connection manager.
pub struct RedisProbe {
    conn: ConnectionManager,
}

impl RedisProbe {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl DependencyProbe for RedisProbe {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn ping(&self) -> Result<(), ProbeError> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| ProbeError::Unavailable(e.to_string()))?;
        Ok(())
    }
}
