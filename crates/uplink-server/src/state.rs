//! Shared handler state.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use uplink_events::EventStore;
use uplink_settings::UplinkSettings;

/// State available to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The event store (ingestion and query paths).
    pub store: Arc<EventStore>,
    /// Settings snapshot taken at startup.
    pub settings: Arc<UplinkSettings>,
    /// Handle for rendering `/metrics`. `None` in tests that skip the
    /// global recorder.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Assemble state from its parts.
    pub fn new(
        store: Arc<EventStore>,
        settings: Arc<UplinkSettings>,
        metrics: Option<PrometheusHandle>,
    ) -> Self {
        Self {
            store,
            settings,
            metrics,
        }
    }
}
