//! Teacher records.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{NewTeacher, Page, Teacher, TeacherUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_teachers).post(create_teacher))
        .route("/{id}", get(get_teacher).put(update_teacher).delete(delete_teacher))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    include_inactive: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/teachers
async fn list_teachers(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<ListQuery>,
) -> ApiResult<ApiResponse<Vec<Teacher>>> {
    auth.require(Resource::Teachers, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let page = Page::new(query.limit, query.offset);
    let teachers = state.db.teachers().list(&school, query.include_inactive, page).await?;
    Ok(ApiResponse::ok(teachers))
}

/// POST /api/teachers
async fn create_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewTeacher>,
) -> ApiResult<ApiResponse<Teacher>> {
    auth.require(Resource::Teachers, Action::Create)?;
    let school = auth.school(scope.requested())?;
    new.validate()?;

    let teacher = state.db.teachers().create(&school, &new).await?;
    Ok(ApiResponse::created(teacher))
}

/// GET /api/teachers/{id}
async fn get_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Teacher>> {
    auth.require(Resource::Teachers, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let teacher = state
        .db
        .teachers()
        .get_by_id(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Teacher not found: {id}")))?;
    Ok(ApiResponse::ok(teacher))
}

/// PUT /api/teachers/{id}
async fn update_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<TeacherUpdate>,
) -> ApiResult<ApiResponse<Teacher>> {
    auth.require(Resource::Teachers, Action::Update)?;
    let school = auth.school(scope.requested())?;
    update.validate()?;

    let teacher = state.db.teachers().update(&school, &id, &update).await?;
    Ok(ApiResponse::ok(teacher))
}

/// DELETE /api/teachers/{id}
async fn delete_teacher(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Teachers, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.teachers().deactivate(&school, &id).await?;
    Ok(ApiResponse::message("Teacher deactivated"))
}
