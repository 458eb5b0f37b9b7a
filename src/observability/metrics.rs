//! Metrics collection and exposition.
//!
//! # Metrics
//! - `anycast_health_state` (gauge): 1=healthy, 0=unhealthy or unknown
//! - `anycast_probe_total` (counter): probes by result
//! - `anycast_probe_duration_seconds` (histogram): probe latency
//! - `anycast_address_mutations_total` (counter): real mutations by op
//! - `anycast_convergence_failures_total` (counter): failed mutations by error kind
//! - `anycast_bound_addresses` (gauge): managed addresses bound after a cycle
//!
//! Recording is a no-op until a recorder is installed, so library code and
//! tests call these helpers unconditionally.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::health::HealthState;

/// Install the Prometheus recorder and its HTTP listener.
pub fn init_metrics(addr: SocketAddr) -> Result<(), metrics_exporter_prometheus::BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

pub fn record_probe(success: bool, elapsed: Duration) {
    let result = if success { "success" } else { "failure" };
    ::metrics::counter!("anycast_probe_total", "result" => result).increment(1);
    ::metrics::histogram!("anycast_probe_duration_seconds").record(elapsed.as_secs_f64());
}

pub fn record_health(state: HealthState) {
    let value = if state == HealthState::Healthy { 1.0 } else { 0.0 };
    ::metrics::gauge!("anycast_health_state").set(value);
}

pub fn record_mutation(op: &'static str) {
    ::metrics::counter!("anycast_address_mutations_total", "op" => op).increment(1);
}

pub fn record_convergence_failure(kind: &'static str) {
    ::metrics::counter!("anycast_convergence_failures_total", "kind" => kind).increment(1);
}

pub fn record_bound(count: usize) {
    ::metrics::gauge!("anycast_bound_addresses").set(count as f64);
}
