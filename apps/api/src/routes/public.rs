//! Unauthenticated endpoints: the document catalogue, school profiles and
//! serial verification for printed documents.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Router;
use shikkha_core::documents::{catalogue, DocumentTypeInfo};
use shikkha_core::{DocumentVerification, PublicSchoolProfile};

use crate::error::{ApiError, ApiResult};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/document-types", get(document_types))
        .route("/schools/{id}", get(school_profile))
        .route("/documents/verify/{serial}", get(verify_document))
}

/// GET /api/public/document-types
async fn document_types() -> ApiResponse<Vec<DocumentTypeInfo>> {
    ApiResponse::ok(catalogue())
}

/// GET /api/public/schools/{id}
///
/// Inactive schools are reported as missing.
async fn school_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<PublicSchoolProfile>> {
    let school = state
        .db
        .schools()
        .get_by_id(&id)
        .await?
        .filter(|s| s.is_active)
        .ok_or_else(|| ApiError::not_found(format!("School not found: {id}")))?;
    Ok(ApiResponse::ok(school.into()))
}

/// GET /api/public/documents/verify/{serial}
async fn verify_document(
    State(state): State<AppState>,
    Path(serial): Path<String>,
) -> ApiResult<ApiResponse<DocumentVerification>> {
    let verification = state
        .db
        .documents()
        .verify(&serial)
        .await?
        .ok_or_else(|| ApiError::not_found("No document with this serial number"))?;
    Ok(ApiResponse::ok(verification))
}
