//! Fee receipts.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{FeeReceipt, NewFeeReceipt, Page};

use super::current_school;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/receipts", get(list_receipts).post(create_receipt))
        .route("/receipts/{id}", get(get_receipt))
}

/// POST /api/fees/receipts
async fn create_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewFeeReceipt>,
) -> ApiResult<ApiResponse<FeeReceipt>> {
    auth.require(Resource::Fees, Action::Create)?;
    let school = current_school(&state, &auth, &scope).await?;

    let receipt = state.db.fees().create(&school, &new, Some(auth.id())).await?;
    Ok(ApiResponse::created(receipt))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    student_id: Option<String>,
    /// Billing month, `YYYY-MM`.
    month: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/fees/receipts?student_id=&month=
async fn list_receipts(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<ListQuery>,
) -> ApiResult<ApiResponse<Vec<FeeReceipt>>> {
    auth.require(Resource::Fees, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let receipts = state
        .db
        .fees()
        .list(
            &school,
            query.student_id.as_deref(),
            query.month.as_deref(),
            Page::new(query.limit, query.offset),
        )
        .await?;
    Ok(ApiResponse::ok(receipts))
}

/// GET /api/fees/receipts/{id}
async fn get_receipt(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<FeeReceipt>> {
    auth.require(Resource::Fees, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let receipt = state
        .db
        .fees()
        .get_by_id(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Receipt not found: {id}")))?;
    Ok(ApiResponse::ok(receipt))
}
