//! Shared utilities for integration and load testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rocket_gateway::config::GatewayConfig;
use rocket_gateway::health::{DependencyProbe, HealthChecker, ProbeError};
use rocket_gateway::http::HttpServer;
use rocket_gateway::lifecycle::Shutdown;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

pub const SECRET: &str = "s3cr3t";

/// Dependency stand-in with a fixed answer and optional latency.
pub struct FakeProbe {
    pub name: &'static str,
    pub up: bool,
    pub delay: Duration,
}

#[async_trait]
impl DependencyProbe for FakeProbe {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn ping(&self) -> Result<(), ProbeError> {
        tokio::time::sleep(self.delay).await;
        if self.up {
            Ok(())
        } else {
            Err(ProbeError::Unavailable("connection refused".into()))
        }
    }
}

pub fn fake_health(postgres_up: bool, redis_up: bool, delay: Duration) -> HealthChecker {
    HealthChecker::new(
        Arc::new(FakeProbe { name: "postgres", up: postgres_up, delay }),
        Arc::new(FakeProbe { name: "redis", up: redis_up, delay }),
        Duration::from_secs(2),
    )
}

/// Gateway config for tests: known secret, no metrics listener.
pub fn test_config(max_requests: u32) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.auth.jwt_secret = SECRET.into();
    config.rate_limit.max_requests = max_requests;
    config.observability.metrics_enabled = false;
    config
}

pub struct RunningGateway {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

impl RunningGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start a gateway on an ephemeral port.
pub async fn start_gateway(config: GatewayConfig, health: HealthChecker) -> RunningGateway {
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();

    let server = HttpServer::new(config, health);
    let task = tokio::spawn(server.run(listener, shutdown.clone()));

    RunningGateway { addr, shutdown, task }
}

/// Client that opens a fresh connection per request.
#[allow(dead_code)]
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
