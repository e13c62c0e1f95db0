//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin policy, preflight answered here)
//!     → rate_limit.rs (per-client fixed window, via the gatekeeper)
//!     → Pass to authentication
//! ```
//!
//! # Design Decisions
//! - Defense in depth: multiple layers of protection
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod cors;
pub mod rate_limit;

pub use rate_limit::{RateLimitSweeper, RateLimiter};
