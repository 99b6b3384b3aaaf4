//! Prometheus request metrics.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};

/// Namespace prefixed to every exported metric.
pub(crate) const METRICS_NAMESPACE: &str = "weatherwear";
/// Path serving the text exposition format.
pub(crate) const METRICS_PATH: &str = "/metrics";

/// Request metrics middleware exposing [`METRICS_PATH`].
///
/// # Errors
///
/// Returns [`std::io::Error`] when the collectors cannot be registered.
pub(crate) fn build_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new(METRICS_NAMESPACE)
        .endpoint(METRICS_PATH)
        .build()
        .map_err(|err| std::io::Error::other(format!("Prometheus metrics setup failed: {err}")))
}
