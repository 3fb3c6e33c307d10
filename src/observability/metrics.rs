//! Metrics collection and exposition.
//!
//! # Metrics
//! - `relay_settings_submissions_total` (counter): accepted submissions
//! - `relay_settings_saves_total` (counter): saves by outcome
//! - `relay_reinit_total` (counter): relay reinits by outcome
//!
//! Recording is a no-op until `init_metrics` installs the exporter.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "success"
    } else {
        "failure"
    }
}

pub fn record_submission() {
    metrics::counter!("relay_settings_submissions_total").increment(1);
}

pub fn record_save(ok: bool) {
    metrics::counter!("relay_settings_saves_total", "outcome" => outcome(ok)).increment(1);
}

pub fn record_reinit(ok: bool) {
    metrics::counter!("relay_reinit_total", "outcome" => outcome(ok)).increment(1);
}
