//! Product, cart and purchase endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::ProductId;
use ledger::{InventoryLedger, NewProduct, Product, ProductPatch};
use purchase::{CatalogService, PurchaseOrchestrator};
use reservations::ReservationStore;
use serde::Serialize;

use crate::caller::Caller;
use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<L: InventoryLedger, R: ReservationStore> {
    pub orchestrator: PurchaseOrchestrator<L, R>,
    pub catalog: CatalogService<L>,
    /// Human-readable name of the wired storage backends.
    pub storage: &'static str,
}

// -- Response types --

#[derive(Serialize)]
pub struct ProductIdResponse {
    pub id: ProductId,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

// -- Handlers --

/// POST /products — list a new product owned by the caller.
#[tracing::instrument(skip(state, caller, body))]
pub async fn create<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    Caller(caller): Caller,
    body: Result<Json<NewProduct>, JsonRejection>,
) -> Result<(StatusCode, Json<ProductIdResponse>), ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Json(req) = body?;
    let id = state.catalog.create_product(req, &caller).await?;
    Ok((StatusCode::CREATED, Json(ProductIdResponse { id })))
}

/// GET /products/{id} — fetch a single product.
#[tracing::instrument(skip(state))]
pub async fn get<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Product>, ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Path(id) = path?;
    let product = state.catalog.get_product(ProductId::new(id)).await?;
    Ok(Json(product))
}

/// PUT /products/{id} — apply a partial update; only the owning seller may do so.
#[tracing::instrument(skip(state, caller, body))]
pub async fn update<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<ProductIdResponse>, ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Path(id) = path?;
    let Json(patch) = body?;
    let id = state
        .catalog
        .update_product(&patch, ProductId::new(id), &caller)
        .await?;
    Ok(Json(ProductIdResponse { id }))
}

/// DELETE /products/{id} — remove a product owned by the caller.
#[tracing::instrument(skip(state, caller))]
pub async fn delete<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Path(id) = path?;
    state
        .catalog
        .delete_product(ProductId::new(id), &caller)
        .await?;
    Ok(Json(MessageResponse {
        message: "Product deleted successfully",
    }))
}

/// POST /products/{id}/cart — reserve the product in the caller's cart.
#[tracing::instrument(skip(state, caller))]
pub async fn add_to_cart<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Path(id) = path?;
    state
        .orchestrator
        .add_to_cart(ProductId::new(id), &caller)
        .await?;
    Ok(Json(MessageResponse {
        message: "Product added to cart",
    }))
}

/// POST /products/{id}/buy — buy one unit of a product in the caller's cart.
#[tracing::instrument(skip(state, caller))]
pub async fn buy<L, R>(
    State(state): State<Arc<AppState<L, R>>>,
    Caller(caller): Caller,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError>
where
    L: InventoryLedger + 'static,
    R: ReservationStore + 'static,
{
    let Path(id) = path?;
    state
        .orchestrator
        .buy_product(ProductId::new(id), &caller)
        .await?;
    Ok(Json(MessageResponse {
        message: "Product purchased",
    }))
}
