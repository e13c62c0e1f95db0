//! Authentication failure causes.

use thiserror::Error;

/// Why a credential was refused.
///
/// Callers only ever see "unauthorized"; the variants exist for logs,
/// metrics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No Authorization header, or an empty one.
    #[error("missing authorization header")]
    MissingCredential,

    /// Wrong scheme, wrong segment count, bad encoding or unsupported algorithm.
    #[error("malformed credential")]
    MalformedCredential,

    /// Signature does not match the shared secret.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Expiry missing or not in the future.
    #[error("token expired")]
    ExpiredCredential,

    /// Claims carry no usable subject identifier.
    #[error("token has no subject")]
    MissingSubject,
}

impl AuthError {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingCredential => "missing_credential",
            AuthError::MalformedCredential => "malformed_credential",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::ExpiredCredential => "expired_credential",
            AuthError::MissingSubject => "missing_subject",
        }
    }
}
