//! Self-service views for the student, parent and teacher portals.
//!
//! Each view is reached through the account's linked record, never through a
//! caller-supplied id, and only within the school named in the token.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use shikkha_core::transport::TransportAssignment;
use shikkha_core::{AdmitCard, FeeReceipt, Role, Student, Teacher};

use super::Paged;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::Params;
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/parent/children", get(parent_children))
        .route("/student/profile", get(student_profile))
        .route("/student/admit-cards", get(student_admit_cards))
        .route("/student/fees", get(student_fees))
        .route("/teacher/profile", get(teacher_profile))
}

#[derive(Debug, Serialize)]
struct StudentProfile {
    student: Student,
    transport: Option<TransportAssignment>,
}

async fn linked_student(state: &AppState, auth: &AuthUser) -> ApiResult<Student> {
    auth.require_role(Role::Student)?;
    state
        .db
        .students()
        .by_user(&auth.school(None)?, auth.id())
        .await?
        .ok_or_else(|| ApiError::not_found("No student record is linked to this account"))
}

/// GET /api/portal/parent/children
async fn parent_children(State(state): State<AppState>, auth: AuthUser) -> ApiResult<ApiResponse<Vec<Student>>> {
    auth.require_role(Role::Parent)?;
    let school_id = auth.school(None)?;
    let children = state.db.students().children_of(&school_id, auth.id()).await?;
    Ok(ApiResponse::ok(children))
}

/// GET /api/portal/student/profile
async fn student_profile(State(state): State<AppState>, auth: AuthUser) -> ApiResult<ApiResponse<StudentProfile>> {
    let student = linked_student(&state, &auth).await?;
    let transport = state.db.transport().for_student(&student.school_id, &student.id).await?;
    Ok(ApiResponse::ok(StudentProfile { student, transport }))
}

/// GET /api/portal/student/admit-cards
async fn student_admit_cards(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<ApiResponse<Vec<AdmitCard>>> {
    let student = linked_student(&state, &auth).await?;
    let cards = state.db.admit_cards().for_student(&student.school_id, &student.id).await?;
    Ok(ApiResponse::ok(cards))
}

/// GET /api/portal/student/fees
async fn student_fees(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(paged): Params<Paged>,
) -> ApiResult<ApiResponse<Vec<FeeReceipt>>> {
    let student = linked_student(&state, &auth).await?;
    let receipts = state
        .db
        .fees()
        .list(&student.school_id, Some(&student.id), None, paged.page())
        .await?;
    Ok(ApiResponse::ok(receipts))
}

/// GET /api/portal/teacher/profile
async fn teacher_profile(State(state): State<AppState>, auth: AuthUser) -> ApiResult<ApiResponse<Teacher>> {
    auth.require_role(Role::Teacher)?;
    let teacher = state
        .db
        .teachers()
        .by_user(&auth.school(None)?, auth.id())
        .await?
        .ok_or_else(|| ApiError::not_found("No teacher record is linked to this account"))?;
    Ok(ApiResponse::ok(teacher))
}
