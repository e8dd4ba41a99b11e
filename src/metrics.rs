use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder and register the engine's series
    /// so they show up on `/metrics` before the first increment.
    pub fn init() -> Self {
        // Use default buckets to avoid API differences across crate versions.
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "analytics_requests_total",
            "Analytics snapshot requests served."
        );
        describe_counter!(
            "analytics_skipped_records_total",
            "Feedback records skipped during aggregation (rating out of range)."
        );
        describe_counter!("classify_requests_total", "Sentiment classification calls.");

        Self { handle }
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
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
