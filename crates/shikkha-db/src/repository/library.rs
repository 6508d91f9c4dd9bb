//! # Library Repository
//!
//! Books and loans. Copy counts move only inside the transaction that
//! writes the loan, so `available_copies` always equals
//! `total_copies - open loans`.

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::new_id;
use shikkha_core::library::{
    check_issuable, check_returnable, resize_copies, BookIssue, BookUpdate, BorrowerKind,
    IssueBookRequest, LibraryBook, LibraryPolicy, NewBook,
};
use shikkha_core::Page;

const BOOK_COLUMNS: &str = r#"
    id, school_id, title, author, isbn, category, total_copies, available_copies,
    shelf, created_at, updated_at
"#;

const ISSUE_COLUMNS: &str = r#"
    id, school_id, book_id, borrower_kind, borrower_id, issued_at, due_date,
    returned_at, fine_paisa
"#;

/// Filter for loan listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IssueStatus {
    #[default]
    All,
    /// Not yet returned.
    Open,
    /// Not returned and past the due date.
    Overdue,
}

/// Repository for library database operations.
#[derive(Debug, Clone)]
pub struct LibraryRepository {
    pool: PgPool,
    policy: LibraryPolicy,
}

impl LibraryRepository {
    pub fn new(pool: PgPool) -> Self {
        LibraryRepository {
            pool,
            policy: LibraryPolicy::default(),
        }
    }

    /// Uses a non-default loan period or fine.
    pub fn with_policy(mut self, policy: LibraryPolicy) -> Self {
        self.policy = policy;
        self
    }

    // =========================================================================
    // Books
    // =========================================================================

    pub async fn get_book(&self, school_id: &str, id: &str) -> DbResult<Option<LibraryBook>> {
        let book = sqlx::query_as::<_, LibraryBook>(&format!(
            "SELECT {BOOK_COLUMNS} FROM library_books WHERE school_id = $1 AND id = $2"
        ))
        .bind(school_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Books by title; `search` matches title, author or ISBN.
    pub async fn list_books(&self, school_id: &str, search: Option<&str>, page: Page) -> DbResult<Vec<LibraryBook>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s));

        let books = sqlx::query_as::<_, LibraryBook>(&format!(
            r#"
            SELECT {BOOK_COLUMNS} FROM library_books
            WHERE school_id = $1
              AND ($2::text IS NULL OR title ILIKE $2 OR author ILIKE $2 OR isbn ILIKE $2)
            ORDER BY title, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(pattern)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Adds a title with all copies on the shelf.
    pub async fn create_book(&self, school_id: &str, new: &NewBook) -> DbResult<LibraryBook> {
        new.validate()?;

        let book = sqlx::query_as::<_, LibraryBook>(&format!(
            r#"
            INSERT INTO library_books (id, school_id, title, author, isbn, category, total_copies, available_copies, shelf)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(new.title.trim())
        .bind(&new.author)
        .bind(new.isbn.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(&new.category)
        .bind(new.total_copies)
        .bind(&new.shelf)
        .fetch_one(&self.pool)
        .await?;

        info!(school_id = %school_id, book_id = %book.id, copies = book.total_copies, "Book added");
        Ok(book)
    }

    /// Updates a book. Changing `total_copies` keeps loaned copies on loan.
    pub async fn update_book(&self, school_id: &str, id: &str, update: &BookUpdate) -> DbResult<LibraryBook> {
        update.validate()?;

        let mut tx = self.pool.begin().await?;

        let current = lock_book(&mut *tx, school_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Book", id))?;

        let (total, available) = match update.total_copies {
            Some(new_total) => resize_copies(&current, new_total)?,
            None => (current.total_copies, current.available_copies),
        };

        let book = sqlx::query_as::<_, LibraryBook>(&format!(
            r#"
            UPDATE library_books SET
                title = COALESCE($3, title),
                author = COALESCE($4, author),
                isbn = COALESCE($5, isbn),
                category = COALESCE($6, category),
                total_copies = $7,
                available_copies = $8,
                shelf = COALESCE($9, shelf),
                updated_at = now()
            WHERE school_id = $1 AND id = $2
            RETURNING {BOOK_COLUMNS}
            "#
        ))
        .bind(school_id)
        .bind(id)
        .bind(update.title.as_deref().map(str::trim))
        .bind(&update.author)
        .bind(&update.isbn)
        .bind(&update.category)
        .bind(total)
        .bind(available)
        .bind(&update.shelf)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(school_id = %school_id, book_id = %id, "Book updated");
        Ok(book)
    }

    /// Removes a book. Books with loan history cannot be removed.
    pub async fn delete_book(&self, school_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM library_books WHERE school_id = $1 AND id = $2")
            .bind(school_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Book", id));
        }
        info!(school_id = %school_id, book_id = %id, "Book removed");
        Ok(())
    }

    // =========================================================================
    // Loans
    // =========================================================================

    /// Lends a copy of a book.
    ///
    /// ## Errors
    /// - `CoreError::NoCopiesAvailable` when every copy is out
    /// - `DbError::NotFound` for an unknown book or borrower
    pub async fn issue(&self, school_id: &str, request: &IssueBookRequest) -> DbResult<BookIssue> {
        request.validate()?;

        let today = Utc::now().date_naive();
        let due_date = self.policy.due_date(today, request.due_date)?;

        let mut tx = self.pool.begin().await?;

        ensure_borrower(&mut *tx, school_id, request.borrower_kind, &request.borrower_id).await?;

        let taken: Option<String> = sqlx::query_scalar(
            r#"
            UPDATE library_books
            SET available_copies = available_copies - 1, updated_at = now()
            WHERE school_id = $1 AND id = $2 AND available_copies > 0
            RETURNING id
            "#,
        )
        .bind(school_id)
        .bind(&request.book_id)
        .fetch_optional(&mut *tx)
        .await?;

        if taken.is_none() {
            let book = lock_book(&mut *tx, school_id, &request.book_id)
                .await?
                .ok_or_else(|| DbError::not_found("Book", request.book_id.as_str()))?;
            check_issuable(&book)?;
            return Err(DbError::TransactionFailed(
                "book copies changed during issue".to_string(),
            ));
        }

        let issue = sqlx::query_as::<_, BookIssue>(&format!(
            r#"
            INSERT INTO book_issues (id, school_id, book_id, borrower_kind, borrower_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(new_id())
        .bind(school_id)
        .bind(&request.book_id)
        .bind(request.borrower_kind)
        .bind(&request.borrower_id)
        .bind(due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            school_id = %school_id,
            book_id = %issue.book_id,
            borrower = %issue.borrower_id,
            due = %issue.due_date,
            "Book issued"
        );
        Ok(issue)
    }

    /// Takes a book back and records any overdue fine.
    pub async fn return_book(&self, school_id: &str, issue_id: &str) -> DbResult<BookIssue> {
        let mut tx = self.pool.begin().await?;

        let open = sqlx::query_as::<_, BookIssue>(&format!(
            "SELECT {ISSUE_COLUMNS} FROM book_issues WHERE school_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(school_id)
        .bind(issue_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Book issue", issue_id))?;

        check_returnable(&open)?;

        let fine = self.policy.fine(open.due_date, Utc::now().date_naive());

        let issue = sqlx::query_as::<_, BookIssue>(&format!(
            r#"
            UPDATE book_issues SET returned_at = now(), fine_paisa = $2
            WHERE id = $1
            RETURNING {ISSUE_COLUMNS}
            "#
        ))
        .bind(issue_id)
        .bind(fine.paisa())
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE library_books
            SET available_copies = available_copies + 1, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(&issue.book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(school_id = %school_id, issue_id = %issue_id, fine = %fine, "Book returned");
        Ok(issue)
    }

    /// Loans, most recent first.
    pub async fn list_issues(
        &self,
        school_id: &str,
        status: IssueStatus,
        borrower_id: Option<&str>,
        page: Page,
    ) -> DbResult<Vec<BookIssue>> {
        let status_clause = match status {
            IssueStatus::All => "TRUE",
            IssueStatus::Open => "returned_at IS NULL",
            IssueStatus::Overdue => "returned_at IS NULL AND due_date < CURRENT_DATE",
        };
        debug!(school_id = %school_id, ?status, "Listing book issues");

        let issues = sqlx::query_as::<_, BookIssue>(&format!(
            r#"
            SELECT {ISSUE_COLUMNS} FROM book_issues
            WHERE school_id = $1
              AND {status_clause}
              AND ($2::text IS NULL OR borrower_id = $2)
            ORDER BY issued_at DESC, id
            LIMIT $3 OFFSET $4
            "#
        ))
        .bind(school_id)
        .bind(borrower_id)
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(issues)
    }
}

async fn lock_book(conn: &mut PgConnection, school_id: &str, id: &str) -> DbResult<Option<LibraryBook>> {
    let book = sqlx::query_as::<_, LibraryBook>(&format!(
        "SELECT {BOOK_COLUMNS} FROM library_books WHERE school_id = $1 AND id = $2 FOR UPDATE"
    ))
    .bind(school_id)
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(book)
}

async fn ensure_borrower(
    conn: &mut PgConnection,
    school_id: &str,
    kind: BorrowerKind,
    borrower_id: &str,
) -> DbResult<()> {
    let (table, entity) = match kind {
        BorrowerKind::Student => ("students", "Student"),
        BorrowerKind::Teacher => ("teachers", "Teacher"),
    };

    let found: Option<String> = sqlx::query_scalar(&format!(
        "SELECT id FROM {table} WHERE school_id = $1 AND id = $2 AND is_active"
    ))
    .bind(school_id)
    .bind(borrower_id)
    .fetch_optional(&mut *conn)
    .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(DbError::not_found(entity, borrower_id)),
    }
}
