//! Error types for the API.
//!
//! ## Status Mapping
//! ```text
//! ValidationError ──────────────────────────────► 400
//! missing / bad token ──────────────────────────► 401
//! CoreError::Forbidden ─────────────────────────► 403
//! DbError::NotFound ────────────────────────────► 404
//! DbError::UniqueViolation / ForeignKey ────────► 409
//! credits, stock, seats, copies, check ─────────► 422
//! everything else ──────────────────────────────► 500 (details logged only)
//! ```
//!
//! Every error renders as `{ "error": "<message>" }`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use shikkha_core::{CoreError, ValidationError};
use shikkha_db::DbError;
use tracing::error;

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unprocessable(String),

    #[error("Internal server error")]
    Internal(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            error!(detail = %detail, "Request failed");
        }
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            CoreError::Forbidden(msg) => ApiError::Forbidden(msg),
            CoreError::UnknownPackage(_) | CoreError::UnknownDocumentKind(_) | CoreError::CreditOverflow => {
                ApiError::BadRequest(err.to_string())
            }
            CoreError::InsufficientCredits { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::NoCopiesAvailable { .. }
            | CoreError::AlreadyReturned(_)
            | CoreError::RouteFull { .. }
            | CoreError::Template(_) => ApiError::Unprocessable(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::Conflict(err.to_string())
            }
            DbError::CheckViolation { .. } => ApiError::Unprocessable(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_map_to_status() {
        let err: ApiError = DbError::Domain(CoreError::InsufficientCredits {
            required: 80,
            available: 50,
        })
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let err: ApiError = DbError::not_found("Student", "s-1").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("email", "a@b.com").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = ValidationError::required("name").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: ApiError = CoreError::Forbidden("no".to_string()).into();
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err: ApiError = DbError::QueryFailed("relation \"users\" does not exist".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "Internal server error");
    }
}
