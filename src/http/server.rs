//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (panic guard, request ID, tracing, timeout, CORS, gatekeeper)
//! - Bind server to listener
//! - Run the rate limit sweeper alongside the server
//! - Drain in-flight requests on shutdown, bounded by a grace period

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use hyper::body::Incoming;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto;
use hyper_util::server::graceful::GracefulShutdown;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tower::Service;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatewayConfig;
use crate::gatekeeper::{gatekeeper_middleware, Gatekeeper};
use crate::health::HealthChecker;
use crate::http::handlers;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::response::panic_response;
use crate::http::websocket::ws_handler;
use crate::lifecycle::Shutdown;
use crate::security::cors::cors_layer;
use crate::security::rate_limit::{RateLimitSweeper, RateLimiter};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub health: HealthChecker,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
    limiter: Arc<RateLimiter>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig, health: HealthChecker) -> Self {
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limit));
        let gatekeeper = Arc::new(Gatekeeper::from_config(&config, limiter.clone()));

        tracing::info!(
            rate_limit_enabled = config.rate_limit.enabled,
            max_requests = config.rate_limit.max_requests,
            window_secs = config.rate_limit.window_secs,
            protected_routes = ?config.auth.protected_routes,
            "Gatekeeper configured"
        );

        let state = AppState { health };
        let router = Self::build_router(&config, state, gatekeeper);
        Self {
            router,
            config,
            limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    /// Layers added later wrap the earlier ones, so the panic guard is outermost.
    fn build_router(config: &GatewayConfig, state: AppState, gatekeeper: Arc<Gatekeeper>) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/ws", get(ws_handler))
            .route("/api/v1/ping", get(handlers::ping))
            .route("/api/v1/me", get(handlers::me))
            .with_state(state)
            .layer(middleware::from_fn_with_state(gatekeeper, gatekeeper_middleware))
            .layer(cors_layer(&config.cors))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                make_request_span(request)
            }))
            .layer(set_request_id_layer())
            .layer(CatchPanicLayer::custom(panic_response))
    }

    /// Run the server until `shutdown` fires, then allow in-flight requests
    /// the configured grace period. Connections still open after that are
    /// aborted before this returns.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        if self.config.rate_limit.enabled {
            let sweeper = RateLimitSweeper::new(
                self.limiter.clone(),
                Duration::from_secs(self.config.rate_limit.sweep_interval_secs),
            );
            tokio::spawn(sweeper.run(shutdown.subscribe()));
        }

        let builder = auto::Builder::new(TokioExecutor::new());
        let graceful = GracefulShutdown::new();
        let mut connections = JoinSet::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer) = match accepted {
                        Ok(accepted) => accepted,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to accept connection");
                            continue;
                        }
                    };

                    let router = self.router.clone();
                    let service = hyper::service::service_fn(move |mut request: Request<Incoming>| {
                        request.extensions_mut().insert(ConnectInfo(peer));
                        router.clone().call(request)
                    });
                    let conn = builder
                        .serve_connection_with_upgrades(TokioIo::new(stream), service)
                        .into_owned();
                    let conn = graceful.watch(conn);

                    connections.spawn(async move {
                        if let Err(e) = conn.await {
                            tracing::debug!(peer = %peer, error = %e, "Connection closed with error");
                        }
                    });
                }
                Some(_) = connections.join_next() => {}
                _ = shutdown.wait() => break,
            }
        }

        drop(listener);
        let grace = Duration::from_secs(self.config.timeouts.shutdown_grace_secs);
        tracing::info!(
            connections = connections.len(),
            grace_secs = grace.as_secs(),
            "Stopped accepting, draining connections"
        );

        tokio::select! {
            _ = graceful.shutdown() => tracing::info!("All connections drained"),
            _ = tokio::time::sleep(grace) => {
                tracing::warn!(
                    remaining = connections.len(),
                    grace_secs = grace.as_secs(),
                    "Grace period elapsed, dropping remaining connections"
                );
            }
        }

        connections.abort_all();
        while connections.join_next().await.is_some() {}

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}
