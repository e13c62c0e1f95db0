//! Request admission.
//!
//! # Data Flow
//! ```text
//! Incoming request (after CORS layer):
//!     → pipeline.rs (rate limit by client key)
//!     → pipeline.rs (bearer token on protected routes)
//!     → context.rs (RequestContext inserted into extensions)
//!     → application handler
//! ```
//!
//! # Design Decisions
//! - Stages run in a fixed order; a rejection ends the request
//! - Route protection is static configuration
//! - Fail closed: any credential problem is a 401

pub mod context;
pub mod pipeline;

pub use context::{AuthenticatedUser, RequestContext};
pub use pipeline::{gatekeeper_middleware, Admission, Gatekeeper, Rejection, RouteTable, Stage};
