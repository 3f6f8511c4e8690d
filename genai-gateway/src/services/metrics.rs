//! Prometheus metrics for the gateway.
//!
//! HTTP-level counters come from the shared middleware; this module adds
//! provider-specific series and the `/metrics` rendering.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use service_core::error::AppError;
use std::sync::OnceLock;
use std::time::Duration;

/// Global handle to the Prometheus recorder.
pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Must be called once at startup.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
        AppError::InternalError(anyhow::anyhow!("failed to install Prometheus recorder: {}", e))
    })?;

    METRICS_HANDLE
        .set(handle)
        .map_err(|_| AppError::InternalError(anyhow::anyhow!("metrics already initialized")))
}

/// Current metrics in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized".to_string())
}

/// Record the outcome of one provider call.
pub fn record_generation(endpoint: &'static str, outcome: &'static str, latency: Duration) {
    counter!("genai_requests_total", "endpoint" => endpoint, "outcome" => outcome).increment(1);
    histogram!("genai_provider_latency_seconds", "endpoint" => endpoint)
        .record(latency.as_secs_f64());
}

pub fn record_tokens(endpoint: &'static str, input_tokens: i32, output_tokens: i32) {
    counter!("genai_tokens_total", "endpoint" => endpoint, "direction" => "input")
        .increment(input_tokens.max(0) as u64);
    counter!("genai_tokens_total", "endpoint" => endpoint, "direction" => "output")
        .increment(output_tokens.max(0) as u64);
}
