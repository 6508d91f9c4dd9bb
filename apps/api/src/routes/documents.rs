//! Document catalogue, templates, generation and history.
//!
//! ## Generation
//! ```text
//! POST /api/documents/generate
//!     │
//!     ├── policy: Documents/Create
//!     ├── load school (letterhead + serial code)
//!     ▼
//! db.documents().generate()   charge + serials + rows, one transaction
//!     │
//!     ▼
//! { documents: [{ document, rendered }], credits_charged, balance_after }
//! ```

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::documents::{catalogue, DocumentTypeInfo};
use shikkha_core::{
    DocumentKind, DocumentTemplate, GenerateDocumentsRequest, GenerateDocumentsResponse,
    GeneratedDocument, NewTemplate, Page, TemplateUpdate,
};
use shikkha_db::HistoryFilter;

use super::current_school;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/types", get(list_types))
        .route("/templates", get(list_templates).post(create_template))
        .route(
            "/templates/{id}",
            get(get_template).put(update_template).delete(delete_template),
        )
        .route("/generate", post(generate))
        .route("/history", get(history))
        .route("/{id}", get(get_document))
}

/// GET /api/documents/types
async fn list_types(_auth: AuthUser) -> ApiResponse<Vec<DocumentTypeInfo>> {
    ApiResponse::ok(catalogue())
}

// =============================================================================
// Templates
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct TemplateQuery {
    kind: Option<DocumentKind>,
}

/// GET /api/documents/templates?kind=
async fn list_templates(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<TemplateQuery>,
) -> ApiResult<ApiResponse<Vec<DocumentTemplate>>> {
    auth.require(Resource::Templates, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let templates = state.db.templates().list(&school, query.kind).await?;
    Ok(ApiResponse::ok(templates))
}

/// POST /api/documents/templates
async fn create_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewTemplate>,
) -> ApiResult<ApiResponse<DocumentTemplate>> {
    auth.require(Resource::Templates, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let template = state.db.templates().create(&school, &new).await?;
    Ok(ApiResponse::created(template))
}

/// GET /api/documents/templates/{id}
async fn get_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<DocumentTemplate>> {
    auth.require(Resource::Templates, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let template = state
        .db
        .templates()
        .get_by_id(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Template not found: {id}")))?;
    Ok(ApiResponse::ok(template))
}

/// PUT /api/documents/templates/{id}
async fn update_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<TemplateUpdate>,
) -> ApiResult<ApiResponse<DocumentTemplate>> {
    auth.require(Resource::Templates, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let template = state.db.templates().update(&school, &id, &update).await?;
    Ok(ApiResponse::ok(template))
}

/// DELETE /api/documents/templates/{id}
async fn delete_template(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Templates, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.db.templates().delete(&school, &id).await?;
    Ok(ApiResponse::message("Template deleted"))
}

// =============================================================================
// Generation & History
// =============================================================================

/// POST /api/documents/generate
async fn generate(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(request): Body<GenerateDocumentsRequest>,
) -> ApiResult<ApiResponse<GenerateDocumentsResponse>> {
    auth.require(Resource::Documents, Action::Create)?;
    let school = current_school(&state, &auth, &scope).await?;

    let response = state.db.documents().generate(&school, &request, Some(auth.id())).await?;
    Ok(ApiResponse::created(response))
}

#[derive(Debug, Default, Deserialize)]
struct HistoryQuery {
    kind: Option<DocumentKind>,
    student_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/documents/history?kind=&student_id=
async fn history(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<HistoryQuery>,
) -> ApiResult<ApiResponse<Vec<GeneratedDocument>>> {
    auth.require(Resource::Documents, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let filter = HistoryFilter {
        kind: query.kind,
        student_id: query.student_id,
        page: Page::new(query.limit, query.offset),
    };
    let documents = state.db.documents().history(&school, &filter).await?;
    Ok(ApiResponse::ok(documents))
}

/// GET /api/documents/{id}
async fn get_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<GeneratedDocument>> {
    auth.require(Resource::Documents, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let document = state
        .db
        .documents()
        .get_by_id(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Document not found: {id}")))?;
    Ok(ApiResponse::ok(document))
}
