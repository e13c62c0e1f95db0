//! Concurrent, time-bounded dependency checks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time;

use crate::health::probe::{DependencyProbe, ProbeError};
use crate::observability::metrics;

/// Body of `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    pub postgres: bool,
    pub redis: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.postgres && self.redis
    }
}

/// Probes Postgres and Redis independently, each under its own timeout.
#[derive(Clone)]
pub struct HealthChecker {
    postgres: Arc<dyn DependencyProbe>,
    redis: Arc<dyn DependencyProbe>,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(
        postgres: Arc<dyn DependencyProbe>,
        redis: Arc<dyn DependencyProbe>,
        timeout: Duration,
    ) -> Self {
        Self {
            postgres,
            redis,
            timeout,
        }
    }

    /// Run both probes concurrently. Never takes much longer than the timeout.
    pub async fn check(&self) -> HealthReport {
        let (postgres, redis) = tokio::join!(
            self.probe(self.postgres.as_ref()),
            self.probe(self.redis.as_ref()),
        );
        HealthReport { postgres, redis }
    }

    async fn probe(&self, probe: &dyn DependencyProbe) -> bool {
        let started = Instant::now();
        let result = match time::timeout(self.timeout, probe.ping()).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };
        let elapsed = started.elapsed();

        let healthy = match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(dependency = probe.name(), error = %e, ?elapsed, "Health probe failed");
                false
            }
        };

        metrics::record_dependency_health(probe.name(), healthy, elapsed);
        healthy
    }
}
