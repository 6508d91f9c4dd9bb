//! Portal accounts.

use axum::extract::State;
use axum::routing::get;
use axum::Router;
use shikkha_core::access::{Action, Resource};
use shikkha_core::{NewUser, Role, User};

use crate::auth::{hash_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users).post(create_user))
}

/// GET /api/users
///
/// Developers without `?school_id=` see every account.
async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
) -> ApiResult<ApiResponse<Vec<User>>> {
    auth.require(Resource::Users, Action::Read)?;

    let school = match (auth.role(), scope.requested()) {
        (Role::Developer, None) => None,
        (_, requested) => Some(auth.school(requested)?),
    };

    let users = state.db.users().list(school.as_deref()).await?;
    Ok(ApiResponse::ok(users))
}

/// POST /api/users
async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Body(new): Body<NewUser>,
) -> ApiResult<ApiResponse<User>> {
    auth.require(Resource::Users, Action::Create)?;
    new.validate()?;

    let school = if !new.role.requires_school() {
        if auth.role() != Role::Developer {
            return Err(ApiError::Forbidden("Only developers can create developer accounts".to_string()));
        }
        None
    } else {
        Some(auth.school(new.school_id.as_deref())?)
    };

    let hash = hash_password(&new.password)?;
    let user = state.db.users().create(school.as_deref(), &new, &hash).await?;
    Ok(ApiResponse::created(user))
}
