//! Admission state machine and its Axum middleware.
//!
//! ```text
//! Start → CorsChecked → RateLimited ─┬─ unprotected ──────────────→ Dispatch
//!                           │        └─ protected → Authenticated → Dispatch
//!                           ↓                  ↓
//!                        Rejected           Rejected
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{AuthError, TokenVerifier};
use crate::config::GatewayConfig;
use crate::gatekeeper::context::RequestContext;
use crate::http::response::ApiError;
use crate::observability::metrics;
use crate::security::rate_limit::RateLimiter;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Position of a request in the admission pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    /// Past the CORS policy layer.
    CorsChecked,
    /// Within the client's request budget.
    RateLimited,
    /// Bearer token verified, subject recorded.
    Authenticated,
    /// Terminal: hand to the application handler.
    Dispatch,
    /// Terminal: respond without running the handler.
    Rejected(Rejection),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Dispatch | Stage::Rejected(_))
    }
}

/// Why the gatekeeper refused a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    RateLimitExceeded,
    Unauthorized(AuthError),
}

impl Rejection {
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::RateLimitExceeded => "rate_limit_exceeded",
            Rejection::Unauthorized(err) => err.reason(),
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::RateLimitExceeded => ApiError::TooManyRequests,
            Rejection::Unauthorized(_) => ApiError::Unauthorized,
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        ApiError::from(self).into_response()
    }
}

/// Static classification of paths that need a bearer token.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    protected: Vec<String>,
}

impl RouteTable {
    pub fn new<I, S>(protected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            protected: protected.into_iter().map(Into::into).collect(),
        }
    }

    /// True when `path` equals a protected route or extends one at a `/`.
    pub fn is_protected(&self, path: &str) -> bool {
        self.protected.iter().any(|route| {
            path.strip_prefix(route.as_str()).is_some_and(|rest| {
                rest.is_empty() || rest.starts_with('/') || route.ends_with('/')
            })
        })
    }
}

/// The parts of a request the gatekeeper looks at.
#[derive(Debug, Clone, Copy)]
pub struct Admission<'a> {
    pub client_key: &'a str,
    pub path: &'a str,
    pub authorization: Option<&'a str>,
}

/// Ordered admission checks run before any handler.
#[derive(Debug)]
pub struct Gatekeeper {
    limiter: Option<Arc<RateLimiter>>,
    verifier: TokenVerifier,
    routes: RouteTable,
    trust_forwarded_for: bool,
}

impl Gatekeeper {
    /// `limiter` of `None` disables rate limiting.
    pub fn new(limiter: Option<Arc<RateLimiter>>, verifier: TokenVerifier, routes: RouteTable) -> Self {
        Self {
            limiter,
            verifier,
            routes,
            trust_forwarded_for: false,
        }
    }

    /// Build from configuration, sharing `limiter` with the sweeper.
    pub fn from_config(config: &GatewayConfig, limiter: Arc<RateLimiter>) -> Self {
        let limiter = config.rate_limit.enabled.then_some(limiter);
        Self::new(
            limiter,
            TokenVerifier::new(&config.auth.jwt_secret),
            RouteTable::new(config.auth.protected_routes.iter().cloned()),
        )
        .with_trust_forwarded_for(config.rate_limit.trust_forwarded_for)
    }

    pub fn with_trust_forwarded_for(mut self, trust: bool) -> Self {
        self.trust_forwarded_for = trust;
        self
    }

    /// Perform one transition. Terminal stages map to themselves.
    pub fn advance(&self, stage: Stage, admission: &Admission<'_>, ctx: &mut RequestContext) -> Stage {
        match stage {
            // Preflights are answered by the CORS layer and never get here.
            Stage::Start => Stage::CorsChecked,
            Stage::CorsChecked => match &self.limiter {
                Some(limiter) if !limiter.admit(admission.client_key) => {
                    tracing::warn!(client = %admission.client_key, "Rate limit exceeded");
                    Stage::Rejected(Rejection::RateLimitExceeded)
                }
                _ => Stage::RateLimited,
            },
            Stage::RateLimited if self.routes.is_protected(admission.path) => {
                match self.verifier.validate(admission.authorization) {
                    Ok(subject) => {
                        tracing::debug!(client = %admission.client_key, subject = %subject, "Authenticated");
                        ctx.set_subject(subject);
                        Stage::Authenticated
                    }
                    Err(err) => {
                        tracing::warn!(
                            client = %admission.client_key,
                            path = %admission.path,
                            reason = err.reason(),
                            "Authentication failed"
                        );
                        Stage::Rejected(Rejection::Unauthorized(err))
                    }
                }
            }
            Stage::RateLimited | Stage::Authenticated => Stage::Dispatch,
            terminal @ (Stage::Dispatch | Stage::Rejected(_)) => terminal,
        }
    }

    /// Drive a request to a terminal stage.
    pub fn run(&self, admission: &Admission<'_>) -> Result<RequestContext, Rejection> {
        let mut ctx = RequestContext::new(admission.client_key);
        let mut stage = Stage::Start;
        loop {
            stage = match self.advance(stage, admission, &mut ctx) {
                Stage::Dispatch => return Ok(ctx),
                Stage::Rejected(rejection) => return Err(rejection),
                next => next,
            };
        }
    }

    /// Identity used for rate limiting: peer IP, or the first
    /// X-Forwarded-For hop when that header is trusted.
    pub fn client_key<B>(&self, request: &axum::http::Request<B>) -> String {
        if self.trust_forwarded_for {
            let forwarded = request
                .headers()
                .get(X_FORWARDED_FOR)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());
            if let Some(client) = forwarded {
                return client.to_string();
            }
        }

        request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Axum middleware running the gatekeeper in front of every route.
pub async fn gatekeeper_middleware(
    State(gatekeeper): State<Arc<Gatekeeper>>,
    mut request: Request,
    next: Next,
) -> Response {
    let client_key = gatekeeper.client_key(&request);
    let outcome = {
        let admission = Admission {
            client_key: &client_key,
            path: request.uri().path(),
            authorization: request
                .headers()
                .get(header::AUTHORIZATION)
                .map(|v| v.to_str().unwrap_or_default()),
        };
        gatekeeper.run(&admission)
    };

    match outcome {
        Ok(ctx) => {
            metrics::record_admitted(ctx.subject().is_some());
            request.extensions_mut().insert(ctx);
            next.run(request).await
        }
        Err(rejection) => {
            metrics::record_rejected(rejection.reason());
            rejection.into_response()
        }
    }
}
