//! Prometheus metrics recorder and `/metrics` endpoint handler.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

/// Render Prometheus text format from the installed recorder.
pub fn render(handle: &PrometheusHandle) -> String {
    handle.render()
}

// Metric name constants to avoid typos across handlers.

/// Events ingested total (counter, labels: agent, ok).
pub const INGEST_EVENTS_TOTAL: &str = "ingest_events_total";
/// Ingest errors total (counter, labels: kind).
pub const INGEST_ERRORS_TOTAL: &str = "ingest_errors_total";
/// Ingest duration seconds (histogram).
pub const INGEST_DURATION_SECONDS: &str = "ingest_duration_seconds";
/// Query requests total (counter, labels: endpoint).
pub const QUERY_REQUESTS_TOTAL: &str = "query_requests_total";
/// Query errors total (counter, labels: endpoint, kind).
pub const QUERY_ERRORS_TOTAL: &str = "query_errors_total";
/// Query duration seconds (histogram, labels: endpoint).
pub const QUERY_DURATION_SECONDS: &str = "query_duration_seconds";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_and_render() {
        // Build a recorder + handle (no global install to avoid test conflicts).
        let handle = PrometheusBuilder::new().build_recorder().handle();
        let output = handle.render();
        assert!(output.is_empty() || output.contains('#') || output.contains('\n'));
    }

    #[test]
    fn metric_constants_are_snake_case() {
        let names = [
            INGEST_EVENTS_TOTAL,
            INGEST_ERRORS_TOTAL,
            INGEST_DURATION_SECONDS,
            QUERY_REQUESTS_TOTAL,
            QUERY_ERRORS_TOTAL,
            QUERY_DURATION_SECONDS,
        ];
        for name in names {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '_'),
                "metric name '{name}' must be snake_case"
            );
        }
    }
}
