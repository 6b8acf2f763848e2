//! Metrics collection and exposition.
//!
//! # Metrics
//! - `broadcast_requests_total` (counter): inbound broadcasts by method, status
//! - `broadcast_request_duration_seconds` (histogram): end-to-end latency
//! - `broadcast_attempts_total` (counter): delivery attempts by result
//! - `broadcast_endpoint_failures_total` (counter): endpoints that exhausted retries
//! - `broadcast_probe_total` (counter): liveness probes by result

use std::net::SocketAddr;
use std::time::Instant;

use axum::http::Method;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

/// Start the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Label value for an inbound method. Extension methods outside the usual
/// cache-invalidation verbs share one label to keep cardinality bounded.
pub fn method_label(method: &Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "HEAD" => "HEAD",
        "POST" => "POST",
        "PUT" => "PUT",
        "PATCH" => "PATCH",
        "DELETE" => "DELETE",
        "OPTIONS" => "OPTIONS",
        "PURGE" => "PURGE",
        "BAN" => "BAN",
        "REFRESH" => "REFRESH",
        _ => "other",
    }
}

pub fn record_request(method: &Method, status: u16, start: Instant) {
    let method = method_label(method);
    let status = status.to_string();
    counter!("broadcast_requests_total", "method" => method, "status" => status.clone())
        .increment(1);
    histogram!("broadcast_request_duration_seconds", "method" => method, "status" => status)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_attempt(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("broadcast_attempts_total", "result" => result).increment(1);
}

pub fn record_endpoint_failure() {
    counter!("broadcast_endpoint_failures_total").increment(1);
}

pub fn record_probe(healthy: bool) {
    let result = if healthy { "healthy" } else { "unhealthy" };
    counter!("broadcast_probe_total", "result" => result).increment(1);
}
