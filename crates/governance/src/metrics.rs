//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use contact_router_core::{Error, Result};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::configuration(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Count a finished text turn by the path that produced its decision.
pub fn track_text_turn(path: &str) {
    metrics::counter!("router_text_turns_total", "path" => path.to_string()).increment(1);
}

/// Count a finished voice stream by outcome kind.
pub fn track_stream_outcome(kind: &str) {
    metrics::counter!("router_stream_outcomes_total", "outcome" => kind.to_string()).increment(1);
}

/// Count an answer cache lookup.
pub fn track_cache(hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!("router_answer_cache_lookups_total", "result" => result).increment(1);
}

/// Count a corpus update attempt.
pub fn track_feedback(ok: bool) {
    let result = if ok { "ok" } else { "failed" };
    metrics::counter!("router_feedback_updates_total", "result" => result).increment(1);
}
