//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_requests_total` (counter): node RPC calls by method, status
//! - `rpc_request_duration_seconds` (histogram): node RPC latency by method
//! - `exchange_outcomes_total` (counter): exchange attempts by policy, outcome
//! - `exchange_duration_seconds` (histogram): exchange latency by policy
//! - `api_requests_total` (counter): HTTP API requests by endpoint, status
//!
//! Without an installed recorder every call is a no-op, so the hook binary
//! pays nothing for them.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and serve `/metrics` on `addr`.
///
/// Must be called from inside a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())?;
    tracing::info!(address = %addr, "Prometheus exporter listening");
    Ok(())
}

pub fn record_rpc_call(method: &str, status: &'static str, start: Instant) {
    let method = method.to_string();
    counter!("rpc_requests_total", "method" => method.clone(), "status" => status).increment(1);
    histogram!("rpc_request_duration_seconds", "method" => method)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_exchange_outcome(policy: &'static str, outcome: &'static str, start: Instant) {
    counter!("exchange_outcomes_total", "policy" => policy, "outcome" => outcome).increment(1);
    histogram!("exchange_duration_seconds", "policy" => policy)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_api_request(endpoint: &str, status: u16) {
    counter!(
        "api_requests_total",
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
