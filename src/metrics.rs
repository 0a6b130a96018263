use axum::{routing::get, Router};
use metrics::gauge;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Prometheus exporter for the decision/fallback counters emitted by the
/// analysis pipeline (`sentinel_decisions_total`,
/// `sentinel_adapter_fallbacks_total`).
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Call once, from the binary; the
    /// counters are no-ops when no recorder is installed (tests).
    pub fn init(delivery_failure_rate: f32) -> Self {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .expect("prometheus: install recorder");

        // Static gauge exposing the configured chaos knob.
        gauge!("sentinel_delivery_failure_rate").set(delivery_failure_rate as f64);

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
