//! Student records. Admins write; teachers read.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{NewStudent, Student, StudentFilter, StudentUpdate};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_student))
        .route("/{id}", get(get_student).put(update_student).delete(delete_student))
}

/// GET /api/students?class=&section=&search=
async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(filter): Params<StudentFilter>,
) -> ApiResult<ApiResponse<Vec<Student>>> {
    auth.require(Resource::Students, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let students = state.db.students().list(&school, &filter).await?;
    Ok(ApiResponse::ok(students))
}

/// POST /api/students
async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewStudent>,
) -> ApiResult<ApiResponse<Student>> {
    auth.require(Resource::Students, Action::Create)?;
    let school = auth.school(scope.requested())?;
    new.validate()?;

    let student = state.db.students().create(&school, &new).await?;
    Ok(ApiResponse::created(student))
}

/// GET /api/students/{id}
async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<Student>> {
    auth.require(Resource::Students, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let student = state
        .db
        .students()
        .get_by_id(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Student not found: {id}")))?;
    Ok(ApiResponse::ok(student))
}

/// PUT /api/students/{id}
async fn update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<StudentUpdate>,
) -> ApiResult<ApiResponse<Student>> {
    auth.require(Resource::Students, Action::Update)?;
    let school = auth.school(scope.requested())?;
    update.validate()?;

    let student = state.db.students().update(&school, &id, &update).await?;
    Ok(ApiResponse::ok(student))
}

/// DELETE /api/students/{id}
///
/// Deactivates the record; issued documents and receipts keep pointing at it.
async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Students, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.students().deactivate(&school, &id).await?;
    Ok(ApiResponse::message("Student deactivated"))
}
