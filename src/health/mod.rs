//! Dependency health reporting.
//!
//! # Data Flow
//! ```text
//! GET /health
//!     → checker.rs (run probes concurrently, each under a timeout)
//!     → probe.rs (Postgres SELECT 1, Redis PING)
//!     → HealthReport { postgres, redis } → 200 or 503
//! ```
//!
//! # Design Decisions
//! - Reports only; never gates other requests
//! - One slow dependency cannot delay the other's result
//! - Probe failures are logged and returned, never propagated

pub mod checker;
pub mod probe;

pub use checker::{HealthChecker, HealthReport};
pub use probe::{DependencyProbe, PostgresProbe, ProbeError, RedisProbe};
