//! Bearer token authentication.
//!
//! # Data Flow
//! ```text
//! Authorization header
//!     → token.rs (scheme, segments, HS256 signature)
//!     → claims.rs (expiry, subject)
//!     → SubjectId written into the request context
//! ```
//!
//! # Design Decisions
//! - Every failure is reported to clients as the same 401
//! - Failure causes stay distinct in `AuthError` for logs and tests
//! - Signature is checked before claims are trusted

pub mod claims;
pub mod error;
pub mod token;

pub use claims::{Claims, SubjectId};
pub use error::AuthError;
pub use token::{issue_token, TokenVerifier};
