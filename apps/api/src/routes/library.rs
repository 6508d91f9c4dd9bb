//! Library catalogue and loans.
//!
//! Loan period and late fine come from configuration (see
//! [`AppState::library`]).

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use shikkha_core::access::{Action, Resource};
use shikkha_core::library::{BookIssue, BookUpdate, IssueBookRequest, LibraryBook, NewBook};
use shikkha_core::Page;
use shikkha_db::IssueStatus;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Body, Params, SchoolScope};
use crate::response::ApiResponse;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route("/books/{id}", get(get_book).put(update_book).delete(delete_book))
        .route("/issues", get(list_issues).post(issue_book))
        .route("/issues/{id}/return", post(return_book))
}

// =============================================================================
// Books
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct BookQuery {
    /// Title, author or ISBN.
    search: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/library/books?search=
async fn list_books(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<BookQuery>,
) -> ApiResult<ApiResponse<Vec<LibraryBook>>> {
    auth.require(Resource::Library, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let books = state
        .library()
        .list_books(&school, query.search.as_deref(), Page::new(query.limit, query.offset))
        .await?;
    Ok(ApiResponse::ok(books))
}

/// POST /api/library/books
async fn create_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(new): Body<NewBook>,
) -> ApiResult<ApiResponse<LibraryBook>> {
    auth.require(Resource::Library, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let book = state.library().create_book(&school, &new).await?;
    Ok(ApiResponse::created(book))
}

/// GET /api/library/books/{id}
async fn get_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<LibraryBook>> {
    auth.require(Resource::Library, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let book = state
        .library()
        .get_book(&school, &id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Book not found: {id}")))?;
    Ok(ApiResponse::ok(book))
}

/// PUT /api/library/books/{id}
async fn update_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
    Body(update): Body<BookUpdate>,
) -> ApiResult<ApiResponse<LibraryBook>> {
    auth.require(Resource::Library, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let book = state.library().update_book(&school, &id, &update).await?;
    Ok(ApiResponse::ok(book))
}

/// DELETE /api/library/books/{id}
///
/// A book with loan history cannot be deleted (409).
async fn delete_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<()>> {
    auth.require(Resource::Library, Action::Delete)?;
    let school = auth.school(scope.requested())?;

    state.library().delete_book(&school, &id).await?;
    Ok(ApiResponse::message("Book deleted"))
}

// =============================================================================
// Loans
// =============================================================================

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusParam {
    #[default]
    All,
    Open,
    Overdue,
}

impl From<StatusParam> for IssueStatus {
    fn from(param: StatusParam) -> Self {
        match param {
            StatusParam::All => IssueStatus::All,
            StatusParam::Open => IssueStatus::Open,
            StatusParam::Overdue => IssueStatus::Overdue,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IssueQuery {
    #[serde(default)]
    status: StatusParam,
    borrower_id: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// GET /api/library/issues?status=open|overdue|all&borrower_id=
async fn list_issues(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Params(query): Params<IssueQuery>,
) -> ApiResult<ApiResponse<Vec<BookIssue>>> {
    auth.require(Resource::Library, Action::Read)?;
    let school = auth.school(scope.requested())?;

    let issues = state
        .library()
        .list_issues(
            &school,
            query.status.into(),
            query.borrower_id.as_deref(),
            Page::new(query.limit, query.offset),
        )
        .await?;
    Ok(ApiResponse::ok(issues))
}

/// POST /api/library/issues
async fn issue_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Body(request): Body<IssueBookRequest>,
) -> ApiResult<ApiResponse<BookIssue>> {
    auth.require(Resource::Library, Action::Create)?;
    let school = auth.school(scope.requested())?;

    let issue = state.library().issue(&school, &request).await?;
    Ok(ApiResponse::created(issue))
}

/// POST /api/library/issues/{id}/return
///
/// The late fine, if any, is on the returned loan.
async fn return_book(
    State(state): State<AppState>,
    auth: AuthUser,
    Params(scope): Params<SchoolScope>,
    Path(id): Path<String>,
) -> ApiResult<ApiResponse<BookIssue>> {
    auth.require(Resource::Library, Action::Update)?;
    let school = auth.school(scope.requested())?;

    let issue = state.library().return_book(&school, &id).await?;
    Ok(ApiResponse::ok(issue))
}
