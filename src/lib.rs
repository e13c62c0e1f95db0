//! Rocket API gateway library.
//!
//! Admission control (rate limiting, bearer authentication) in front of a
//! small set of HTTP handlers, plus dependency health reporting.

pub mod auth;
pub mod config;
pub mod gatekeeper;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use config::schema::GatewayConfig;
pub use gatekeeper::Gatekeeper;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
