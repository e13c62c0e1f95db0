//! Rocket API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ panic guard ─▶ request id ─▶ trace ─▶ timeout ─▶ CORS
//!                                                                       │
//!                                                                       ▼
//!                                    ┌───────────────── gatekeeper ─────────────────┐
//!                                    │  rate limiter ─▶ token verifier (protected)  │
//!                                    │        │                 │                   │
//!                                    │       429               401                  │
//!                                    └──────────────────────┬───────────────────────┘
//!                                                           ▼
//!                                         /health  /ws  /api/v1/ping  /api/v1/me
//! ```

use std::path::PathBuf;

use clap::Parser;

use rocket_gateway::config::load_config;
use rocket_gateway::http::HttpServer;
use rocket_gateway::lifecycle::{signals, startup, Shutdown};
use rocket_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "rocket-gateway")]
#[command(about = "HTTP gateway with rate limiting and bearer authentication", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;

    logging::init_logging(&config.observability);

    tracing::info!("rocket-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let health = startup::connect_dependencies(&config).await?;

    let listener = startup::bind_listener(&config).await?;
    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config, health);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
