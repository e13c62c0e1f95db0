//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_admitted_total` (counter): requests that reached a handler
//! - `gateway_requests_rejected_total` (counter): rejections by reason
//! - `gateway_rate_limit_entries` (gauge): clients tracked by the rate limiter
//! - `gateway_dependency_health` (gauge): 1=healthy, 0=unhealthy, per dependency
//! - `gateway_dependency_probe_seconds` (histogram): probe latency
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus scrape endpoint runs on its own listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and start its HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_admitted(protected: bool) {
    ::metrics::counter!(
        "gateway_requests_admitted_total",
        "protected" => if protected { "true" } else { "false" }
    )
    .increment(1);
}

pub fn record_rejected(reason: &'static str) {
    ::metrics::counter!("gateway_requests_rejected_total", "reason" => reason).increment(1);
}

pub fn record_rate_limit_entries(count: usize) {
    ::metrics::gauge!("gateway_rate_limit_entries").set(count as f64);
}

pub fn record_dependency_health(dependency: &'static str, healthy: bool, elapsed: Duration) {
    ::metrics::gauge!("gateway_dependency_health", "dependency" => dependency)
        .set(if healthy { 1.0 } else { 0.0 });
    ::metrics::histogram!("gateway_dependency_probe_seconds", "dependency" => dependency)
        .record(elapsed.as_secs_f64());
}
