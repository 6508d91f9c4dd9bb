//! Notices. Every role reads what its audience allows; admins and teachers
//! publish.

use axum::extract::{Path, State};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use shikkha_core::access::{Action, Resource};
use shikkha_core::{NewNotification, NotificationView, Page};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_notifications).post(create_notification))
        .route("/unread-count", get(unread_count))
        .route("/{id}/read", post(mark_read))
        .route("/{id}", delete(delete_notification))
}

#[derive(Debug, Default, Deserialize)]
struct ListQuery {
    #[serde(default)]
    unread_only: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Debug, Serialize)]
struct UnreadCount {
    count: i64,
}

/// GET /api/notifications?unread_only=
async fn list_notifications(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<ListQuery>,
) -> ApiResult<ApiResponse<Vec<NotificationView>>> {
    auth.require(Resource::Notifications, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let rows = state
        .db
        .notifications()
        .list_for(&school, &auth.principal, query.unread_only, Page::new(query.limit, query.offset))
        .await?;
    Ok(ApiResponse::ok(rows))
}

/// POST /api/notifications
async fn create_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewNotification>,
) -> ApiResult<ApiResponse<NotificationView>> {
    auth.require(Resource::Notifications, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let created = state.db.notifications().create(&school, &new, Some(auth.id())).await?;
    Ok(ApiResponse::created(created))
}

/// GET /api/notifications/unread-count
async fn unread_count(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
) -> ApiResult<ApiResponse<UnreadCount>> {
    auth.require(Resource::Notifications, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let count = state.db.notifications().unread_count(&school, &auth.principal).await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

/// POST /api/notifications/{id}/read
async fn mark_read(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Notifications, Action::Read)?;
    let school = auth.school(scope.requested())?;

    state.db.notifications().mark_read(&school, &auth.principal, &id).await?;
    Ok(ApiResponse::message("Marked as read"))
}

/// DELETE /api/notifications/{id}
async fn delete_notification(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Notifications, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.notifications().delete(&school, &id).await?;
    Ok(ApiResponse::message("Notification deleted"))
}
