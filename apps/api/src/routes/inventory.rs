//! School stock: items, movements and low-stock alerts.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::inventory::{InventoryItem, ItemUpdate, NewItem, NewMovement, StockMovement};
use shikkha_core::Page;

use super::Paged;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/items/{id}/movements", get(list_movements).post(record_movement))
        .route("/low-stock", get(low_stock))
}

#[derive(Debug, Default, Deserialize)]
struct ItemQuery {
    category: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/inventory/items?category=
async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<ItemQuery>,
) -> ApiResult<ApiResponse<Vec<InventoryItem>>> {
    auth.require(Resource::Inventory, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let items = state
        .db
        .inventory()
        .list_items(&school, query.category.as_deref(), Page::new(query.limit, query.offset))
        .await?;
    Ok(ApiResponse::ok(items))
}

/// POST /api/inventory/items
async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewItem>,
) -> ApiResult<ApiResponse<InventoryItem>> {
    auth.require(Resource::Inventory, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let item = state.db.inventory().create_item(&school, &new, Some(auth.id())).await?;
    Ok(ApiResponse::created(item))
}

/// GET /api/inventory/items/{id}
async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<InventoryItem>> {
    auth.require(Resource::Inventory, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let item = state
        .db
        .inventory()
        .get_item(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Item not found: {id}")))?;
    Ok(ApiResponse::ok(item))
}

/// PUT /api/inventory/items/{id}
///
/// Quantity changes go through movements, not here.
async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<ItemUpdate>,
) -> ApiResult<ApiResponse<InventoryItem>> {
    auth.require(Resource::Inventory, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let item = state.db.inventory().update_item(&school, &id, &update).await?;
    Ok(ApiResponse::ok(item))
}

/// DELETE /api/inventory/items/{id}
async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Inventory, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.inventory().delete_item(&school, &id).await?;
    Ok(ApiResponse::message("Item deleted"))
}

/// POST /api/inventory/items/{id}/movements
async fn record_movement(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(movement): Body<NewMovement>,
) -> ApiResult<ApiResponse<StockMovement>> {
    auth.require(Resource::Inventory, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let row = state
        .db
        .inventory()
        .record_movement(&school, &id, &movement, Some(auth.id()))
        .await?;
    Ok(ApiResponse::created(row))
}

/// GET /api/inventory/items/{id}/movements
async fn list_movements(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(paged): Params<Paged>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Vec<StockMovement>>> {
    auth.require(Resource::Inventory, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let rows = state.db.inventory().movements(&school, &id, paged.page()).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/inventory/low-stock
async fn low_stock(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
) -> ApiResult<ApiResponse<Vec<InventoryItem>>> {
    auth.require(Resource::Inventory, Action::Read)?;
    let school = auth.school(scope.requested())?;

    Ok(ApiResponse::ok(state.db.inventory().low_stock(&school).await?))
}
