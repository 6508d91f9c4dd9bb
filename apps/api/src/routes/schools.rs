//! School management. Developers manage every school; admins read and
//! update their own.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{NewSchool, Role, School, SchoolUpdate};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Body, Params};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_schools).post(create_school))
        .route("/{id}", get(get_school).put(update_school))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    include_inactive: bool,
}

/// GET /api/schools
async fn list_schools(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(query): Params<ListQuery>,
) -> ApiResult<ApiResponse<Vec<School>>> {
    auth.require(Resource::Schools, Action::Read)?;

    if auth.role() == Role::Developer {
        let schools = state.db.schools().list(query.include_inactive).await?;
        return Ok(ApiResponse::ok(schools));
    }

    let own = auth.school(None)?;
    let school = state.db.schools().require(&own).await?;
    Ok(ApiResponse::ok(vec![school]))
}

/// POST /api/schools
async fn create_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Body(new): Body<NewSchool>,
) -> ApiResult<ApiResponse<School>> {
    auth.require(Resource::Schools, Action::Create)?;
    new.validate()?;

    let school = state.db.schools().create(&new).await?;
    Ok(ApiResponse::created(school))
}

/// GET /api/schools/{id}
async fn get_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<School>> {
    auth.require(Resource::Schools, Action::Read)?;
    let id = auth.school(Some(&id))?;

    Ok(ApiResponse::ok(state.db.schools().require(&id).await?))
}

/// PUT /api/schools/{id}
async fn update_school(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Body(update): Body<SchoolUpdate>,
) -> ApiResult<ApiResponse<School>> {
    auth.require(Resource::Schools, Action::Update)?;
    let id = auth.school(Some(&id))?;
    update.validate()?;

    Ok(ApiResponse::ok(state.db.schools().update(&id, &update).await?))
}
