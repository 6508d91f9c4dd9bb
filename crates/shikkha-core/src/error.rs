//! # Error Types
//!
//! Domain-specific error types for shikkha-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shikkha-core errors (this file)                                       │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shikkha-db errors (separate crate)                                    │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  API errors (apps/api)                                                 │
//! │  └── ApiError         - What the React client sees ({ "error": … })   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations or domain logic failures.
/// The API layer maps each variant to an HTTP status.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The school does not have enough credits for the requested documents.
    ///
    /// ## User Workflow
    /// ```text
    /// Generate 40 admit cards (cost 2 each = 80)
    ///      │
    ///      ▼
    /// Balance check: available = 50
    ///      │
    ///      ▼
    /// InsufficientCredits { required: 80, available: 50 }
    ///      │
    ///      ▼
    /// UI shows: "Need 80 credits, 50 available. Buy a package."
    /// ```
    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    /// Credit arithmetic overflowed (absurd batch size or amount).
    #[error("Credit amount overflow")]
    CreditOverflow,

    /// Unknown credit package code.
    #[error("Unknown credit package: {0}")]
    UnknownPackage(String),

    /// Unknown document type slug.
    #[error("Unknown document type: {0}")]
    UnknownDocumentKind(String),

    /// Template failed to parse or render.
    #[error("Template error: {0}")]
    Template(String),

    /// Not enough stock for an outgoing inventory movement.
    #[error("Insufficient stock for {item}: available {available}, requested {requested}")]
    InsufficientStock {
        item: String,
        available: i64,
        requested: i64,
    },

    /// No copies of the book are on the shelf.
    #[error("No available copies of '{title}'")]
    NoCopiesAvailable { title: String },

    /// The book issue was already returned.
    #[error("Book issue {0} has already been returned")]
    AlreadyReturned(String),

    /// The transport route has no free seats.
    #[error("Route {route} is full (capacity {capacity})")]
    RouteFull { route: String, capacity: i64 },

    /// The caller's role may not perform the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before any SQL runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid phone, invalid ISBN).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientCredits {
            required: 80,
            available: 50,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient credits: required 80, available 50"
        );

        let err = CoreError::RouteFull {
            route: "Mirpur-10".to_string(),
            capacity: 40,
        };
        assert_eq!(err.to_string(), "Route Mirpur-10 is full (capacity 40)");
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(ValidationError::required("name").to_string(), "name is required");
        assert_eq!(
            ValidationError::invalid("phone", "must be 11 digits").to_string(),
            "phone has invalid format: must be 11 digits"
        );
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("eiin").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
