use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{AdmitCard, AdmitCardBatchRequest, AdmitCardBatchResponse, Page};

use super::current_school;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_admit_cards))
        .route("/generate", post(generate))
}

/// POST /api/admit-cards/generate
///
/// Charges one admit card per student; a reprint charges again.
async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(request): Body<AdmitCardBatchRequest>,
) -> ApiResult<ApiResponse<AdmitCardBatchResponse>> {
    auth.require(Resource::AdmitCards, Action::Create)?;
    let school = current_school(&state, &auth, &scope).await?;

    let batch = state.db.admit_cards().generate(&school, &request, Some(auth.id())).await?;
    Ok(ApiResponse::created(batch))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    exam_name: Option<String>,
    exam_year: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/admit-cards?exam_name=&exam_year=
async fn list_admit_cards(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<ListQuery>,
) -> ApiResult<ApiResponse<Vec<AdmitCard>>> {
    auth.require(Resource::AdmitCards, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let cards = state
        .db
        .admit_cards()
        .list(
            &school,
            query.exam_name.as_deref(),
            query.exam_year,
            Page::new(query.limit, query.offset),
        )
        .await?;
    Ok(ApiResponse::ok(cards))
}
