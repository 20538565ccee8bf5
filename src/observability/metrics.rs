//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): requests by status and outcome
//! - `proxy_request_duration_seconds` (histogram): end-to-end latency by outcome
//! - `proxy_origin_fetch_duration_seconds` (histogram): time to origin headers
//! - `proxy_pipelines_in_flight` (gauge): live pipeline tasks
//!
//! Recording is a no-op until [`init_metrics`] installs a recorder.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};
use std::net::SocketAddr;
use std::time::Instant;

/// Install the Prometheus recorder and its scrape listener on `addr`.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record one finished inbound request.
pub fn record_request(status: u16, outcome: &'static str, start: Instant) {
    counter!(
        "proxy_requests_total",
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!("proxy_request_duration_seconds", "outcome" => outcome)
        .record(start.elapsed().as_secs_f64());
}

/// Record how long the origin took to answer with headers.
pub fn record_origin_fetch(start: Instant, succeeded: bool) {
    let result = if succeeded { "ok" } else { "error" };
    histogram!("proxy_origin_fetch_duration_seconds", "result" => result)
        .record(start.elapsed().as_secs_f64());
}

pub fn record_in_flight(count: usize) {
    gauge!("proxy_pipelines_in_flight").set(count as f64);
}
