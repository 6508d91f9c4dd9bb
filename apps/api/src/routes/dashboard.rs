use axum::extract::State;
use axum::routing::get;
use axum::Router;
use shikkha_core::access::{Action, Resource};
use shikkha_core::DashboardStats;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/stats", get(stats))
}

/// GET /api/dashboard/stats
async fn stats(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
) -> ApiResult<ApiResponse<DashboardStats>> {
    auth.require(Resource::Dashboard, Action::Read)?;
    let school = auth.school(scope.requested())?;

    Ok(ApiResponse::ok(state.db.dashboard().stats(&school).await?))
}
