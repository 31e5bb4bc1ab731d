//! Prometheus metrics wiring. Grounded on the teacher's
//! `server::metrics::init_metrics`/`metrics_handler` pair (referenced from
//! its `http::create_router`), built on the same `metrics` +
//! `metrics-exporter-prometheus` crates.

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Installs the global Prometheus recorder and returns the handle used by
/// `metrics_handler` to render the scrape text.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

pub async fn metrics_handler(axum::Extension(handle): axum::Extension<PrometheusHandle>) -> impl IntoResponse {
    handle.render()
}
