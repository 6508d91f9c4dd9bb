//! Login, token refresh, logout and the current user.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use shikkha_core::{LoginRequest, User};
use tracing::{info, warn};

use crate::auth::{session_cookie, verify_password, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::Body;
use crate::response::ApiResponse;
use crate::state::AppState;

const BAD_CREDENTIALS: &str = "Invalid email or password";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Debug, Serialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user: User,
    /// Portal the client should open.
    pub redirect: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

fn issue_session(state: &AppState, user: User) -> ApiResult<impl IntoResponse> {
    let access_token = state.jwt.generate_access_token(&user)?;
    let refresh_token = state.jwt.generate_refresh_token(&user)?;
    let cookie = session_cookie(
        &state.config.cookie_name,
        &access_token,
        state.jwt.access_lifetime_secs(),
        !state.config.is_development(),
    );

    let session = Session {
        access_token,
        refresh_token,
        token_type: "Bearer",
        expires_in: state.jwt.access_lifetime_secs(),
        redirect: user.portal().home_path(),
        user,
    };
    Ok(([(SET_COOKIE, cookie)], ApiResponse::ok(session)))
}

/// POST /api/auth/login
async fn login(State(state): State<AppState>, Body(request): Body<LoginRequest>) -> ApiResult<impl IntoResponse> {
    request.validate()?;

    let Some(credentials) = state.db.users().find_credentials(&request.email).await? else {
        warn!("Login for unknown email");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    };

    if !verify_password(&request.password, &credentials.password_hash) {
        warn!(user_id = %credentials.user.id, "Login with wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }
    if !credentials.user.is_active {
        return Err(ApiError::Forbidden("Account is disabled".to_string()));
    }

    state.db.users().record_login(&credentials.user.id).await?;
    info!(user_id = %credentials.user.id, role = %credentials.user.role, "User logged in");

    issue_session(&state, credentials.user)
}

/// POST /api/auth/refresh
///
/// Exchanges a refresh token for a new pair. The user is reloaded so a
/// disabled account or a changed role takes effect.
async fn refresh(
    State(state): State<AppState>,
    Body(request): Body<RefreshRequest>,
) -> ApiResult<impl IntoResponse> {
    let claims = state.jwt.validate_refresh_token(&request.refresh_token)?;

    let user = state
        .db
        .users()
        .get_by_id(&claims.sub)
        .await?
        .filter(|u| u.is_active)
        .ok_or_else(|| ApiError::unauthorized("Account no longer active"))?;

    issue_session(&state, user)
}

/// POST /api/auth/logout
async fn logout(State(state): State<AppState>, auth: AuthUser) -> impl IntoResponse {
    info!(user_id = %auth.id(), "User logged out");
    let cookie = session_cookie(&state.config.cookie_name, "", 0, !state.config.is_development());
    ([(SET_COOKIE, cookie)], ApiResponse::message("Logged out"))
}

/// GET /api/auth/me
async fn me(State(state): State<AppState>, auth: AuthUser) -> ApiResult<ApiResponse<User>> {
    let user = state
        .db
        .users()
        .get_by_id(auth.id())
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(ApiResponse::ok(user))
}
