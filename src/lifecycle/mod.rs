//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Connect dependencies → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop accepting → Drain for grace period → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then dependencies, then listener
//! - Shutdown has timeout: remaining connections dropped after the grace period

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
