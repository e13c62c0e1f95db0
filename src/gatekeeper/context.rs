//! Per-request state produced by the gatekeeper.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::SubjectId;
use crate::http::response::ApiError;

/// Facts established by earlier pipeline stages, stored in the request's
/// extensions for later stages and handlers.
///
/// Lives exactly as long as its request. Only the gatekeeper can set the
/// subject; everything else reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    client_key: String,
    subject: Option<SubjectId>,
}

impl RequestContext {
    pub fn new(client_key: impl Into<String>) -> Self {
        Self {
            client_key: client_key.into(),
            subject: None,
        }
    }

    /// Identity the rate limiter keyed this request by.
    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    /// Authenticated subject, set only on protected routes.
    pub fn subject(&self) -> Option<&SubjectId> {
        self.subject.as_ref()
    }

    pub(crate) fn set_subject(&mut self, subject: SubjectId) {
        debug_assert!(self.subject.is_none(), "subject written twice");
        self.subject = Some(subject);
    }
}

/// Extractor for handlers that need the caller's identity.
///
/// Rejects with 401 when the request was not authenticated, e.g. when a
/// handler is mounted on a path that is not configured as protected.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub SubjectId);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .and_then(|ctx| ctx.subject().cloned())
            .map(AuthenticatedUser)
            .ok_or(ApiError::Unauthorized)
    }
}
