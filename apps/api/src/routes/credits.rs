//! Credit balance, ledger and purchases.

use axum::extract::State;
use axum::routing::{get, post};
use axum::Router;
use shikkha_core::access::{Action, Resource};
use shikkha_core::credits::{
    AddCreditsRequest, CreditBalance, CreditPackage, CreditTransaction, CreditTransactionKind,
    PurchaseRequest, PACKAGES,
};
use shikkha_db::LedgerEntry;

use super::Paged;
use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/balance", get(balance))
        .route("/transactions", get(transactions))
        .route("/packages", get(packages))
        .route("/add", post(add_credits))
        .route("/purchase", post(purchase))
}

/// GET /api/credits/balance
async fn balance(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
) -> ApiResult<ApiResponse<CreditBalance>> {
    auth.require(Resource::Credits, Action::Read)?;
    let school = auth.school(scope.requested())?;

    Ok(ApiResponse::ok(state.db.credits().balance(&school).await?))
}

/// GET /api/credits/transactions
async fn transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(paged): Params<Paged>,
) -> ApiResult<ApiResponse<Vec<CreditTransaction>>> {
    auth.require(Resource::Credits, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let rows = state.db.credits().transactions(&school, paged.page()).await?;
    Ok(ApiResponse::ok(rows))
}

/// GET /api/credits/packages
async fn packages(auth: AuthUser) -> ApiResult<ApiResponse<Vec<CreditPackage>>> {
    auth.require(Resource::Credits, Action::Read)?;
    Ok(ApiResponse::ok(PACKAGES.to_vec()))
}

/// POST /api/credits/add
///
/// Developer grant, recorded in the ledger as an adjustment.
async fn add_credits(
    State(state): State<AppState>,
    auth: AuthUser,
    Body(request): Body<AddCreditsRequest>,
) -> ApiResult<ApiResponse<CreditTransaction>> {
    auth.require(Resource::Credits, Action::Manage)?;
    request.validate()?;

    state.db.schools().require(&request.school_id).await?;
    let row = state
        .db
        .credits()
        .add(
            &request.school_id,
            request.amount,
            CreditTransactionKind::Adjustment,
            LedgerEntry {
                reference: None,
                description: request.description.as_deref(),
                created_by: Some(auth.id()),
            },
        )
        .await?;
    Ok(ApiResponse::created(row))
}

/// POST /api/credits/purchase
async fn purchase(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(request): Body<PurchaseRequest>,
) -> ApiResult<ApiResponse<CreditTransaction>> {
    auth.require(Resource::Credits, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let row = state
        .db
        .credits()
        .purchase(&school, &request.package_code, Some(auth.id()))
        .await?;
    Ok(ApiResponse::created(row))
}
