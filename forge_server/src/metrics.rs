//! Prometheus metrics for pipeline observability.

use metrics::counter;

/// Initialize metrics exporter (Prometheus).
pub fn init_metrics() {
    let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    if let Err(e) = builder.install() {
        tracing::warn!("Failed to install Prometheus exporter: {}", e);
    }
}

/// Record a dispatched build job.
pub fn job_dispatched(platform: &str) {
    counter!("forge_jobs_dispatched_total", "platform" => platform.to_string()).increment(1);
}

/// Record an inbound CI callback by kind.
pub fn callback_received(kind: &str) {
    counter!("forge_callbacks_total", "kind" => kind.to_string()).increment(1);
}

/// Record a job state transition.
pub fn job_status_changed(status: &str) {
    counter!("forge_jobs_total", "status" => status.to_string()).increment(1);
}

/// Record a manifest pull and whether it updated the link.
pub fn manifest_polled(updated: bool) {
    let outcome = if updated { "updated" } else { "no_update" };
    counter!("forge_manifest_polls_total", "outcome" => outcome).increment(1);
}

/// Record a job swept to FAILED after exceeding the stuck TTL.
pub fn job_timed_out() {
    counter!("forge_jobs_timed_out_total").increment(1);
}
