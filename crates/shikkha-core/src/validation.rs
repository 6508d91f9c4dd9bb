//! # Validation Module
//!
//! Input validation for Shikkha request DTOs.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: React forms (zod)                                            │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler (Rust)                                          │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── THIS MODULE: field rules, called from `New*::validate()`          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: PostgreSQL                                                   │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE (school_id, student_code) etc.                             │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shikkha_core::validation::{validate_bd_mobile, validate_eiin};
//!
//! assert!(validate_bd_mobile("guardian_phone", "01712345678").is_ok());
//! assert!(validate_eiin("108254").is_ok());
//! ```

use uuid::Uuid;

use crate::error::ValidationError;
use crate::{MAX_BATCH_SIZE, MAX_NAME_LEN, MIN_PASSWORD_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates that a field is present after trimming.
pub fn validate_required(field: &str, value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(())
}

/// Validates a person, school, book or item name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters (counted as chars, so Bangla names are not penalised)
///
/// ## Example
/// ```rust
/// use shikkha_core::validation::validate_name;
///
/// assert!(validate_name("name", "Rahim Uddin").is_ok());
/// assert!(validate_name("name_bn", "রহিম উদ্দিন").is_ok());
/// assert!(validate_name("name", "   ").is_err());
/// ```
pub fn validate_name(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;
    validate_max_len(field, value, MAX_NAME_LEN)
}

/// Validates an optional name; `None` and blank strings pass.
pub fn validate_optional_name(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_max_len(field, v, MAX_NAME_LEN),
        _ => Ok(()),
    }
}

fn validate_max_len(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    if value.trim().chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }
    Ok(())
}

/// Validates a class name such as "Class 8", "SSC" or "অষ্টম".
pub fn validate_class_name(value: &str) -> ValidationResult<()> {
    validate_required("class_name", value)?;
    validate_max_len("class_name", value, 50)
}

/// Validates a short business code (student code, teacher code, shelf).
///
/// Letters, digits, hyphens and slashes; at most 50 characters.
pub fn validate_code(field: &str, value: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required(field, value)?;
    validate_max_len(field, value, 50)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '/' || c == '_')
    {
        return Err(ValidationError::invalid(
            field,
            "must contain only letters, numbers, hyphens, slashes and underscores",
        ));
    }
    Ok(())
}

// =============================================================================
// Contact Validators
// =============================================================================

/// Normalizes a Bangladeshi mobile number to its 11-digit local form.
///
/// Accepts `01XXXXXXXXX`, `+8801XXXXXXXXX` and `8801XXXXXXXXX`, with spaces
/// or hyphens. Operator prefixes are 013-019.
///
/// ## Example
/// ```rust
/// use shikkha_core::validation::normalize_bd_mobile;
///
/// assert_eq!(normalize_bd_mobile("+880 1712-345678").as_deref(), Some("01712345678"));
/// assert_eq!(normalize_bd_mobile("01212345678"), None);
/// ```
pub fn normalize_bd_mobile(value: &str) -> Option<String> {
    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    let local = digits
        .strip_prefix("+88")
        .or_else(|| digits.strip_prefix("88"))
        .unwrap_or(digits.as_str());

    let bytes = local.as_bytes();
    let valid = bytes.len() == 11
        && bytes.iter().all(u8::is_ascii_digit)
        && bytes[0] == b'0'
        && bytes[1] == b'1'
        && (b'3'..=b'9').contains(&bytes[2]);

    valid.then(|| local.to_string())
}

/// Validates a Bangladeshi mobile number.
pub fn validate_bd_mobile(field: &str, value: &str) -> ValidationResult<()> {
    validate_required(field, value)?;
    normalize_bd_mobile(value)
        .map(|_| ())
        .ok_or_else(|| ValidationError::invalid(field, "must be a Bangladeshi mobile number (01XXXXXXXXX)"))
}

/// Validates an optional mobile number.
pub fn validate_optional_mobile(field: &str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_bd_mobile(field, v),
        _ => Ok(()),
    }
}

/// Validates the shape of an email address.
///
/// ## Rules
/// - Exactly one `@`
/// - Non-empty local part
/// - Domain contains a dot that is neither first nor last
pub fn validate_email(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    validate_required("email", value)?;
    validate_max_len("email", value, 254)?;

    let mut parts = value.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(d), None) => (l, d),
        _ => return Err(ValidationError::invalid("email", "must contain a single @")),
    };

    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..");
    if local.is_empty() || !domain_ok || value.chars().any(char::is_whitespace) {
        return Err(ValidationError::invalid("email", "is not a valid address"));
    }
    Ok(())
}

/// Validates an optional email.
pub fn validate_optional_email(value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => validate_email(v),
        _ => Ok(()),
    }
}

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an EIIN (exactly 6 ASCII digits).
pub fn validate_eiin(value: &str) -> ValidationResult<()> {
    let value = value.trim();
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationError::invalid("eiin", "must be exactly 6 digits"));
    }
    Ok(())
}

/// Validates a UUID string.
pub fn validate_uuid(field: &str, value: &str) -> ValidationResult<()> {
    Uuid::parse_str(value.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::invalid(field, "must be a UUID"))
}

/// Validates an ISBN-10 or ISBN-13, including its checksum.
///
/// ## Checksums
/// ```text
/// ISBN-10: Σ (10 - i) × dᵢ ≡ 0 (mod 11), last digit may be 'X' (= 10)
/// ISBN-13: Σ dᵢ × (1 if i even else 3) ≡ 0 (mod 10)
/// ```
///
/// ## Example
/// ```rust
/// use shikkha_core::validation::validate_isbn;
///
/// assert!(validate_isbn("0-306-40615-2").is_ok());
/// assert!(validate_isbn("978-0-306-40615-7").is_ok());
/// assert!(validate_isbn("978-0-306-40615-8").is_err());
/// ```
pub fn validate_isbn(value: &str) -> ValidationResult<()> {
    let chars: Vec<char> = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .collect();

    let ok = match chars.len() {
        10 => {
            let mut sum = 0u32;
            for (i, c) in chars.iter().enumerate() {
                let digit = match (i, c) {
                    (9, 'X') | (9, 'x') => 10,
                    (_, c) => match c.to_digit(10) {
                        Some(d) => d,
                        None => return Err(isbn_error()),
                    },
                };
                sum += (10 - i as u32) * digit;
            }
            sum % 11 == 0
        }
        13 => {
            let mut sum = 0u32;
            for (i, c) in chars.iter().enumerate() {
                let digit = c.to_digit(10).ok_or_else(isbn_error)?;
                sum += if i % 2 == 0 { digit } else { digit * 3 };
            }
            sum % 10 == 0
        }
        _ => false,
    };

    if ok {
        Ok(())
    } else {
        Err(isbn_error())
    }
}

fn isbn_error() -> ValidationError {
    ValidationError::invalid("isbn", "must be a valid ISBN-10 or ISBN-13")
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a value is strictly positive.
pub fn validate_positive(field: &str, value: i64) -> ValidationResult<()> {
    if value <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a value is within an inclusive range.
pub fn validate_range(field: &str, value: i64, min: i64, max: i64) -> ValidationResult<()> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
        });
    }
    Ok(())
}

/// Validates a class roll number (1-9999).
pub fn validate_roll_number(roll: i32) -> ValidationResult<()> {
    validate_range("roll_number", roll as i64, 1, 9999)
}

/// Validates an amount of paisa is not negative.
pub fn validate_amount(field: &str, paisa: i64) -> ValidationResult<()> {
    if paisa < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Validates the number of documents in one generation request.
pub fn validate_batch_size(count: usize) -> ValidationResult<()> {
    if count == 0 {
        return Err(ValidationError::required("student_ids"));
    }
    validate_range("student_ids", count as i64, 1, MAX_BATCH_SIZE as i64)
}

// =============================================================================
// Misc Validators
// =============================================================================

/// Validates password strength: at least 8 characters, not all whitespace.
pub fn validate_password(value: &str) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::required("password"));
    }
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LEN,
        });
    }
    Ok(())
}

const BLOOD_GROUPS: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

/// Validates an optional blood group (A+, O-, AB+, ...).
pub fn validate_blood_group(value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if !v.trim().is_empty() => {
            let v = v.trim().to_uppercase();
            if BLOOD_GROUPS.contains(&v.as_str()) {
                Ok(())
            } else {
                Err(ValidationError::NotAllowed {
                    field: "blood_group".to_string(),
                    allowed: BLOOD_GROUPS.iter().map(|s| s.to_string()).collect(),
                })
            }
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("name", "Karim").is_ok());
        assert!(validate_name("name", "").is_err());
        assert!(validate_name("name", &"ক".repeat(200)).is_ok());
        assert!(matches!(
            validate_name("name", &"a".repeat(201)),
            Err(ValidationError::TooLong { max: 200, .. })
        ));
        assert!(validate_optional_name("name_bn", None).is_ok());
        assert!(validate_optional_name("name_bn", Some("")).is_ok());
    }

    #[test]
    fn test_validate_code() {
        assert!(validate_code("student_code", "STU-2026/001").is_ok());
        assert!(validate_code("student_code", "STU 1").is_err());
        assert!(validate_code("student_code", "").is_err());
    }

    #[test]
    fn test_bd_mobile() {
        assert_eq!(normalize_bd_mobile("01712345678").as_deref(), Some("01712345678"));
        assert_eq!(normalize_bd_mobile("+8801912345678").as_deref(), Some("01912345678"));
        assert_eq!(normalize_bd_mobile("8801312345678").as_deref(), Some("01312345678"));
        assert_eq!(normalize_bd_mobile("0171-234-5678").as_deref(), Some("01712345678"));

        assert!(normalize_bd_mobile("01212345678").is_none());
        assert!(normalize_bd_mobile("0171234567").is_none());
        assert!(normalize_bd_mobile("02712345678").is_none());
        assert!(normalize_bd_mobile("0171234567a").is_none());

        assert!(validate_bd_mobile("phone", "").is_err());
        assert!(validate_optional_mobile("phone", None).is_ok());
        assert!(validate_optional_mobile("phone", Some("123")).is_err());
    }

    #[test]
    fn test_email() {
        assert!(validate_email("head@school.edu.bd").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b@c.com").is_err());
        assert!(validate_email("@school.bd").is_err());
        assert!(validate_email("x@localhost").is_err());
        assert!(validate_email("x@.com").is_err());
        assert!(validate_email("x y@school.bd").is_err());
        assert!(validate_optional_email(None).is_ok());
    }

    #[test]
    fn test_eiin() {
        assert!(validate_eiin("108254").is_ok());
        assert!(validate_eiin(" 108254 ").is_ok());
        assert!(validate_eiin("10825").is_err());
        assert!(validate_eiin("1082545").is_err());
        assert!(validate_eiin("10825a").is_err());
    }

    #[test]
    fn test_isbn() {
        assert!(validate_isbn("0306406152").is_ok());
        assert!(validate_isbn("0-8044-2957-X").is_ok());
        assert!(validate_isbn("9780306406157").is_ok());
        assert!(validate_isbn("0306406153").is_err());
        assert!(validate_isbn("12345").is_err());
        assert!(validate_isbn("978030640615A").is_err());
    }

    #[test]
    fn test_uuid() {
        assert!(validate_uuid("id", "550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("id", "not-a-uuid").is_err());
    }

    #[test]
    fn test_numbers() {
        assert!(validate_positive("amount", 1).is_ok());
        assert!(validate_positive("amount", 0).is_err());
        assert!(validate_roll_number(1).is_ok());
        assert!(validate_roll_number(0).is_err());
        assert!(validate_roll_number(10_000).is_err());
        assert!(validate_amount("fee", 0).is_ok());
        assert!(validate_amount("fee", -1).is_err());
        assert!(validate_batch_size(0).is_err());
        assert!(validate_batch_size(MAX_BATCH_SIZE).is_ok());
        assert!(validate_batch_size(MAX_BATCH_SIZE + 1).is_err());
    }

    #[test]
    fn test_password_and_blood_group() {
        assert!(validate_password("s3cret-pass").is_ok());
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
        assert!(validate_password("        ").is_err());

        assert!(validate_blood_group(Some("ab+")).is_ok());
        assert!(validate_blood_group(Some("C+")).is_err());
        assert!(validate_blood_group(None).is_ok());
    }
}
