//! # Database Error Types
//!
//! Error types for database operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  PostgreSQL error (sqlx::Error)      CoreError (business rule)          │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError (this module) ← SQLSTATE mapped, domain errors wrapped        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (shikkha-api) ← HTTP status + `{ "error": ... }`             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use shikkha_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found (or not visible to the caller's school).
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate student or teacher code within a school
    /// - Duplicate user email, EIIN, vehicle registration
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Referencing a student, route or user that doesn't exist
    /// - Deleting a student who still has fee receipts
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, copies out of range).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// A business rule rejected the operation inside a transaction.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a UniqueViolation error.
    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Maps a unique violation on `constraint` to a friendlier duplicate error.
    ///
    /// Repositories call this after an insert so the message names the
    /// business key rather than the index.
    pub fn on_duplicate(self, field: &str, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// SQLSTATE 23505              → DbError::UniqueViolation (constraint name)
/// SQLSTATE 23503              → DbError::ForeignKeyViolation
/// SQLSTATE 23514              → DbError::CheckViolation
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                match db_err.code().as_deref() {
                    Some("23505") => DbError::UniqueViolation {
                        field: constraint,
                        value: "unknown".to_string(),
                    },
                    Some("23503") => DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    },
                    Some("23514") => DbError::CheckViolation {
                        message: format!("{} ({})", db_err.message(), constraint),
                    },
                    _ => DbError::QueryFailed(db_err.message().to_string()),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<shikkha_core::ValidationError> for DbError {
    fn from(err: shikkha_core::ValidationError) -> Self {
        DbError::Domain(err.into())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Student", "st-1");
        assert_eq!(err.to_string(), "Student not found: st-1");
    }

    #[test]
    fn test_on_duplicate_renames_field() {
        let err = DbError::duplicate("students_school_id_student_code_key", "unknown")
            .on_duplicate("student_code", "STU-001");
        assert_eq!(err.to_string(), "Duplicate student_code: 'STU-001' already exists");

        let untouched = DbError::PoolExhausted.on_duplicate("student_code", "STU-001");
        assert!(matches!(untouched, DbError::PoolExhausted));
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err: DbError = CoreError::InsufficientCredits {
            required: 10,
            available: 3,
        }
        .into();
        assert_eq!(err.to_string(), "Insufficient credits: required 10, available 3");
    }
}
