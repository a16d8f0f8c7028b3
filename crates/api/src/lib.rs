//! HTTP API server for the marketplace purchase engine.
//!
//! Exposes product listing, cart and purchase endpoints over the engine in the
//! `purchase` crate, with structured logging (tracing) and Prometheus metrics.

pub mod caller;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use ledger::InventoryLedger;
use metrics_exporter_prometheus::PrometheusHandle;
use purchase::{CatalogService, PurchaseConfig, PurchaseOrchestrator};
use reservations::ReservationStore;
use tower_http::trace::TraceLayer;

use routes::products::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<L, R>(state: Arc<AppState<L, R>>, metrics_handle: PrometheusHandle) -> Router
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::ops::metrics))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::ops::health::<L, R>))
        .route("/products", post(routes::products::create::<L, R>))
        .route(
            "/products/{id}",
            get(routes::products::get::<L, R>)
                .put(routes::products::update::<L, R>)
                .delete(routes::products::delete::<L, R>),
        )
        .route("/products/{id}/cart", post(routes::products::add_to_cart::<L, R>))
        .route("/products/{id}/buy", post(routes::products::buy::<L, R>))
        .with_state(state)
        .merge(metrics_router)
        .layer(TraceLayer::new_for_http())
}

/// Wires the catalog and the orchestrator over the same ledger.
pub fn create_state<L, R>(
    ledger: L,
    reservations: R,
    config: PurchaseConfig,
    storage: &'static str,
) -> Arc<AppState<L, R>>
where
    L: InventoryLedger + Clone,
    R: ReservationStore,
{
    Arc::new(AppState {
        catalog: CatalogService::new(ledger.clone()),
        orchestrator: PurchaseOrchestrator::with_config(ledger, reservations, config),
        storage,
    })
}
