//! Operational endpoints: liveness and Prometheus scrape.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use ledger::InventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use reservations::ReservationStore;
use serde::Serialize;

use crate::routes::products::AppState;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub storage: &'static str,
}

/// GET /health — reports liveness and which storage backends are wired in.
pub async fn health<L, R>(State(state): State<Arc<AppState<L, R>>>) -> Json<HealthResponse>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    Json(HealthResponse {
        status: "ok",
        storage: state.storage,
    })
}

/// GET /metrics — renders the Prometheus exposition format.
pub async fn metrics(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)],
        handle.render(),
    )
}
