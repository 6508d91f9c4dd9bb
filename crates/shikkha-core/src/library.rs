//! # Library Module
//!
//! Books, loans and overdue fines.
//!
//! ## Loan Lifecycle
//! ```text
//!   issue                               return
//!     │ available_copies > 0 ?             │ returned_at is NULL ?
//!     ▼                                    ▼
//!  ┌────────┐  due_date = issued + 14d  ┌────────┐
//!  │ issued │ ─────────────────────────►│returned│  fine = overdue days × ৳5
//!  └────────┘                           └────────┘
//!  available_copies - 1                 available_copies + 1
//! ```

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_isbn, validate_name, validate_optional_name, validate_positive, validate_uuid,
    ValidationResult,
};
use crate::{DEFAULT_FINE_PER_DAY_PAISA, DEFAULT_LOAN_DAYS};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct LibraryBook {
    pub id: String,
    pub school_id: String,
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub total_copies: i32,
    pub available_copies: i32,
    pub shelf: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl LibraryBook {
    pub fn copies_on_loan(&self) -> i32 {
        self.total_copies - self.available_copies
    }
}

/// Who borrowed a book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BorrowerKind {
    Student,
    Teacher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct BookIssue {
    pub id: String,
    pub school_id: String,
    pub book_id: String,
    pub borrower_kind: BorrowerKind,
    pub borrower_id: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub due_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub returned_at: Option<DateTime<Utc>>,
    #[ts(type = "number")]
    pub fine_paisa: i64,
}

impl BookIssue {
    pub fn is_returned(&self) -> bool {
        self.returned_at.is_some()
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.is_returned() && today > self.due_date
    }
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewBook {
    pub title: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub total_copies: i32,
    pub shelf: Option<String>,
}

impl NewBook {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("title", &self.title)?;
        validate_optional_name("author", self.author.as_deref())?;
        validate_optional_name("category", self.category.as_deref())?;
        if let Some(isbn) = self.isbn.as_deref().filter(|s| !s.trim().is_empty()) {
            validate_isbn(isbn)?;
        }
        validate_positive("total_copies", self.total_copies as i64)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    pub category: Option<String>,
    pub total_copies: Option<i32>,
    pub shelf: Option<String>,
}

impl BookUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(title) = &self.title {
            validate_name("title", title)?;
        }
        if let Some(isbn) = self.isbn.as_deref().filter(|s| !s.trim().is_empty()) {
            validate_isbn(isbn)?;
        }
        if let Some(total) = self.total_copies {
            validate_positive("total_copies", total as i64)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct IssueBookRequest {
    pub book_id: String,
    pub borrower_kind: BorrowerKind,
    pub borrower_id: String,
    /// Defaults to the policy's loan period.
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
}

impl IssueBookRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_uuid("book_id", &self.book_id)?;
        validate_uuid("borrower_id", &self.borrower_id)
    }
}

// =============================================================================
// Rules
// =============================================================================

/// Per-school lending rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LibraryPolicy {
    pub loan_days: i64,
    pub fine_per_day: Money,
}

impl Default for LibraryPolicy {
    fn default() -> Self {
        LibraryPolicy {
            loan_days: DEFAULT_LOAN_DAYS,
            fine_per_day: Money::from_paisa(DEFAULT_FINE_PER_DAY_PAISA),
        }
    }
}

impl LibraryPolicy {
    /// Due date for a loan starting `issued_on`.
    ///
    /// A requested date before the issue day is rejected.
    pub fn due_date(&self, issued_on: NaiveDate, requested: Option<NaiveDate>) -> CoreResult<NaiveDate> {
        match requested {
            Some(due) if due < issued_on => {
                Err(ValidationError::invalid("due_date", "must not be before the issue date").into())
            }
            Some(due) => Ok(due),
            None => Ok(issued_on + Duration::days(self.loan_days)),
        }
    }

    /// Fine owed when a book due on `due` comes back on `returned_on`.
    pub fn fine(&self, due: NaiveDate, returned_on: NaiveDate) -> Money {
        let overdue_days = (returned_on - due).num_days().max(0);
        self.fine_per_day.multiply_quantity(overdue_days)
    }
}

/// A book can be issued only while a copy is on the shelf.
pub fn check_issuable(book: &LibraryBook) -> CoreResult<()> {
    if book.available_copies <= 0 {
        return Err(CoreError::NoCopiesAvailable {
            title: book.title.clone(),
        });
    }
    Ok(())
}

/// A loan can be returned once.
pub fn check_returnable(issue: &BookIssue) -> CoreResult<()> {
    if issue.is_returned() {
        return Err(CoreError::AlreadyReturned(issue.id.clone()));
    }
    Ok(())
}

/// New `(total, available)` after changing a book's total copies.
///
/// Copies currently on loan stay on loan, so the total may not drop below them.
pub fn resize_copies(book: &LibraryBook, new_total: i32) -> CoreResult<(i32, i32)> {
    let on_loan = book.copies_on_loan();
    if new_total < on_loan {
        return Err(ValidationError::OutOfRange {
            field: "total_copies".to_string(),
            min: on_loan as i64,
            max: i32::MAX as i64,
        }
        .into());
    }
    Ok((new_total, new_total - on_loan))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn book(total: i32, available: i32) -> LibraryBook {
        LibraryBook {
            id: "b-1".to_string(),
            school_id: "s-1".to_string(),
            title: "Amar Bornomala".to_string(),
            author: None,
            isbn: None,
            category: None,
            total_copies: total,
            available_copies: available,
            shelf: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn issue(returned: bool) -> BookIssue {
        BookIssue {
            id: "i-1".to_string(),
            school_id: "s-1".to_string(),
            book_id: "b-1".to_string(),
            borrower_kind: BorrowerKind::Student,
            borrower_id: "st-1".to_string(),
            issued_at: Utc::now(),
            due_date: day(15),
            returned_at: returned.then(Utc::now),
            fine_paisa: 0,
        }
    }

    #[test]
    fn test_default_policy() {
        let policy = LibraryPolicy::default();
        assert_eq!(policy.loan_days, 14);
        assert_eq!(policy.fine_per_day, Money::from_taka(5));
        assert_eq!(policy.due_date(day(1), None).unwrap(), day(15));
    }

    #[test]
    fn test_requested_due_date() {
        let policy = LibraryPolicy::default();
        assert_eq!(policy.due_date(day(1), Some(day(8))).unwrap(), day(8));
        assert_eq!(policy.due_date(day(1), Some(day(1))).unwrap(), day(1));
        assert!(policy.due_date(day(10), Some(day(9))).is_err());
    }

    #[test]
    fn test_fines() {
        let policy = LibraryPolicy::default();
        assert_eq!(policy.fine(day(15), day(14)), Money::zero());
        assert_eq!(policy.fine(day(15), day(15)), Money::zero());
        assert_eq!(policy.fine(day(15), day(18)), Money::from_taka(15));

        let strict = LibraryPolicy {
            loan_days: 7,
            fine_per_day: Money::from_taka(10),
        };
        assert_eq!(strict.fine(day(1), day(11)), Money::from_taka(100));
    }

    #[test]
    fn test_issuable() {
        assert!(check_issuable(&book(3, 1)).is_ok());
        assert!(matches!(
            check_issuable(&book(3, 0)),
            Err(CoreError::NoCopiesAvailable { .. })
        ));
    }

    #[test]
    fn test_returnable() {
        assert!(check_returnable(&issue(false)).is_ok());
        assert!(matches!(
            check_returnable(&issue(true)),
            Err(CoreError::AlreadyReturned(_))
        ));
    }

    #[test]
    fn test_overdue() {
        let open = issue(false);
        assert!(!open.is_overdue(day(15)));
        assert!(open.is_overdue(day(16)));
        assert!(!issue(true).is_overdue(day(20)));
    }

    #[test]
    fn test_resize_copies() {
        // 5 copies, 2 on loan
        let b = book(5, 3);
        assert_eq!(resize_copies(&b, 8).unwrap(), (8, 6));
        assert_eq!(resize_copies(&b, 2).unwrap(), (2, 0));
        assert!(resize_copies(&b, 1).is_err());
    }

    #[test]
    fn test_new_book_validation() {
        let ok = NewBook {
            title: "Pather Panchali".to_string(),
            author: Some("Bibhutibhushan Bandyopadhyay".to_string()),
            isbn: Some("978-0-306-40615-7".to_string()),
            category: Some("Novel".to_string()),
            total_copies: 3,
            shelf: Some("B-2".to_string()),
        };
        assert!(ok.validate().is_ok());
        assert!(NewBook { isbn: Some("123".to_string()), ..ok.clone() }.validate().is_err());
        assert!(NewBook { total_copies: 0, ..ok.clone() }.validate().is_err());
        assert!(NewBook { title: String::new(), ..ok }.validate().is_err());
    }
}
