// src/metrics.rs
use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

/// One-time metrics registration (so series show up on /metrics).
pub fn ensure_pipeline_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "fetch_attempts_total",
            "Transport attempts across all cascade tiers."
        );
        describe_counter!("fetch_failures_total", "Failed transport attempts.");
        describe_counter!(
            "ingest_live_total",
            "Notice ingestions served from the live source."
        );
        describe_counter!(
            "ingest_fallback_total",
            "Notice ingestions served from the static fallback dataset."
        );
        describe_counter!("parse_records_total", "Raw records extracted from sources.");
        describe_counter!(
            "parse_dropped_total",
            "Records dropped during validation (bad title etc.)."
        );
        describe_histogram!("parse_ms", "Source parse time in milliseconds.");
        describe_counter!("analysis_jobs_total", "Asynchronous analysis jobs started.");
        describe_counter!("analysis_polls_total", "Job status polls issued.");
        describe_counter!("analysis_jobs_ready_total", "Jobs that reached ready.");
        describe_counter!(
            "analysis_jobs_failed_total",
            "Jobs the remote reported failed."
        );
        describe_counter!(
            "analysis_jobs_timeout_total",
            "Jobs abandoned after the polling budget."
        );
        describe_counter!("ingest_chunks_total", "Chunks produced for storage.");
        describe_counter!(
            "ingest_store_errors_total",
            "Knowledge store handoffs that failed (fire-and-report)."
        );
    });
}

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Initialize the Prometheus recorder.
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();
        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");
        ensure_pipeline_metrics_described();
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
