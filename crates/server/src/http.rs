//! Router assembly: the `/novasonic` upgrade, health/readiness, and the
//! Prometheus scrape endpoint. Grounded on the teacher's
//! `server::http::{create_router, build_cors_layer}`.

use axum::extract::State;
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::metrics::metrics_handler;
use crate::websocket::{WebSocketHandlerState, upgrade};

pub fn create_router(
    ws_state: Arc<WebSocketHandlerState>,
    metrics_handle: PrometheusHandle,
    cors_origins: &[String],
) -> Router {
    Router::new()
        .route("/novasonic", get(upgrade))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(Extension(metrics_handle))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(cors_origins))
        .with_state(ws_state)
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        tracing::warn!("no CORS origins configured, allowing all origins");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!(%origin, "invalid CORS origin, ignoring");
                None
            })
        })
        .collect();

    if parsed.is_empty() {
        tracing::error!("all configured CORS origins were invalid, allowing all origins");
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

async fn health_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn readiness_check(State(state): State<Arc<WebSocketHandlerState>>) -> impl IntoResponse {
    let active = state.supervisor.active_sessions();
    Json(serde_json::json!({ "ready": true, "active_sessions": active }))
}
