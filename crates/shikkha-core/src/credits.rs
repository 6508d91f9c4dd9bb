//! # Credits Module
//!
//! The credit ledger: every generated document costs credits, schools buy
//! credits in packages, and every balance change leaves one ledger row.
//!
//! ## Ledger Invariant
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  credit_balances                  credit_transactions                   │
//! │  ┌──────────────────────┐         ┌──────────────────────────────────┐  │
//! │  │ current_credits 420  │◄────────│ spend   -80  balance_after 420   │  │
//! │  │ used_credits     80  │         │ purchase +500 balance_after 500  │  │
//! │  └──────────────────────┘         └──────────────────────────────────┘  │
//! │                                                                         │
//! │  • balance and ledger row are written in ONE database transaction      │
//! │  • spend is `UPDATE ... WHERE current_credits >= cost`, never a         │
//! │    read-then-write, so two admins cannot overdraw the same school       │
//! │  • current_credits is never negative                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The functions here compute the same transitions in memory; the db layer
//! mirrors them in SQL.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::documents::DocumentKind;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{validate_positive, validate_range, ValidationResult};

// =============================================================================
// Credits
// =============================================================================

/// A non-negative number of credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS)]
#[serde(transparent)]
#[ts(export)]
pub struct Credits(i64);

impl Credits {
    /// Creates a credit amount, rejecting negatives.
    pub fn new(value: i64) -> CoreResult<Self> {
        if value < 0 {
            return Err(ValidationError::OutOfRange {
                field: "credits".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into());
        }
        Ok(Credits(value))
    }

    #[inline]
    pub const fn zero() -> Self {
        Credits(0)
    }

    #[inline]
    pub const fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Credits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Transaction Kind
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CreditTransactionKind {
    /// Package bought by the school or credits granted by a developer.
    Purchase,
    /// Debit for generated documents.
    Spend,
    /// Credits returned for a failed generation.
    Refund,
    /// Manual correction by a developer (may be negative).
    Adjustment,
}

impl CreditTransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditTransactionKind::Purchase => "purchase",
            CreditTransactionKind::Spend => "spend",
            CreditTransactionKind::Refund => "refund",
            CreditTransactionKind::Adjustment => "adjustment",
        }
    }
}

// =============================================================================
// Ledger Rows
// =============================================================================

/// Current balance of a school (`credit_balances` row).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditBalance {
    pub school_id: String,
    #[ts(type = "number")]
    pub current_credits: i64,
    #[ts(type = "number")]
    pub used_credits: i64,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One ledger entry (`credit_transactions` row).
///
/// `amount` is signed: positive for purchases and refunds, negative for spends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CreditTransaction {
    pub id: String,
    pub school_id: String,
    pub kind: CreditTransactionKind,
    #[ts(type = "number")]
    pub amount: i64,
    #[ts(type = "number")]
    pub balance_after: i64,
    /// Package code, document batch id, ...
    pub reference: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Packages
// =============================================================================

/// A purchasable bundle of credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CreditPackage {
    pub code: &'static str,
    pub name: &'static str,
    pub credits: i64,
    pub price_paisa: i64,
}

impl CreditPackage {
    pub fn price(&self) -> Money {
        Money::from_paisa(self.price_paisa)
    }
}

pub const PACKAGES: [CreditPackage; 3] = [
    CreditPackage {
        code: "starter",
        name: "Starter",
        credits: 500,
        price_paisa: 50_000,
    },
    CreditPackage {
        code: "standard",
        name: "Standard",
        credits: 2_000,
        price_paisa: 180_000,
    },
    CreditPackage {
        code: "premium",
        name: "Premium",
        credits: 5_000,
        price_paisa: 400_000,
    },
];

/// Looks up a package by code (case-insensitive).
pub fn find_package(code: &str) -> CoreResult<CreditPackage> {
    let wanted = code.trim().to_lowercase();
    PACKAGES
        .into_iter()
        .find(|p| p.code == wanted)
        .ok_or_else(|| CoreError::UnknownPackage(code.to_string()))
}

// =============================================================================
// Ledger Math
// =============================================================================

/// Total cost of generating `count` documents of `kind`.
pub fn charge_for(kind: DocumentKind, count: usize) -> CoreResult<Credits> {
    let count = i64::try_from(count).map_err(|_| CoreError::CreditOverflow)?;
    kind.credit_cost()
        .checked_mul(count)
        .map(Credits)
        .ok_or(CoreError::CreditOverflow)
}

/// Balance after spending `cost`.
///
/// ## Errors
/// `CoreError::InsufficientCredits` when `cost > balance`.
pub fn apply_spend(balance: Credits, cost: Credits) -> CoreResult<Credits> {
    if cost.0 > balance.0 {
        return Err(CoreError::InsufficientCredits {
            required: cost.0,
            available: balance.0,
        });
    }
    Ok(Credits(balance.0 - cost.0))
}

/// Balance after adding `amount` purchased credits. `amount` must be positive.
pub fn apply_purchase(balance: Credits, amount: i64) -> CoreResult<Credits> {
    validate_positive("amount", amount)?;
    balance
        .0
        .checked_add(amount)
        .map(Credits)
        .ok_or(CoreError::CreditOverflow)
}

// =============================================================================
// Requests
// =============================================================================

/// `POST /api/credits/add` (developer grants credits to a school).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AddCreditsRequest {
    pub school_id: String,
    #[ts(type = "number")]
    pub amount: i64,
    pub description: Option<String>,
}

impl AddCreditsRequest {
    pub fn validate(&self) -> ValidationResult<()> {
        crate::validation::validate_uuid("school_id", &self.school_id)?;
        validate_positive("amount", self.amount)?;
        validate_range("amount", self.amount, 1, crate::MAX_CREDIT_GRANT)
    }
}

/// `POST /api/credits/purchase` (admin buys a package).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PurchaseRequest {
    pub package_code: String,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credits_never_negative() {
        assert!(Credits::new(-1).is_err());
        assert_eq!(Credits::new(0).unwrap(), Credits::zero());
        assert_eq!(Credits::new(42).unwrap().value(), 42);
    }

    #[test]
    fn test_charge_for() {
        assert_eq!(charge_for(DocumentKind::AdmitCard, 40).unwrap().value(), 40);
        assert_eq!(charge_for(DocumentKind::StudentIdCard, 40).unwrap().value(), 80);
        assert_eq!(charge_for(DocumentKind::TransferCertificate, 0).unwrap(), Credits::zero());
        assert!(matches!(
            charge_for(DocumentKind::TransferCertificate, usize::MAX),
            Err(CoreError::CreditOverflow)
        ));
    }

    #[test]
    fn test_apply_spend() {
        let balance = Credits::new(100).unwrap();
        assert_eq!(apply_spend(balance, Credits::new(100).unwrap()).unwrap(), Credits::zero());
        assert_eq!(apply_spend(balance, Credits::new(30).unwrap()).unwrap().value(), 70);

        match apply_spend(Credits::new(50).unwrap(), Credits::new(80).unwrap()) {
            Err(CoreError::InsufficientCredits { required, available }) => {
                assert_eq!(required, 80);
                assert_eq!(available, 50);
            }
            other => panic!("expected InsufficientCredits, got {:?}", other),
        }
    }

    #[test]
    fn test_apply_purchase() {
        let balance = Credits::new(10).unwrap();
        assert_eq!(apply_purchase(balance, 500).unwrap().value(), 510);
        assert!(apply_purchase(balance, 0).is_err());
        assert!(apply_purchase(balance, -5).is_err());
        assert!(matches!(
            apply_purchase(Credits::new(i64::MAX).unwrap(), 1),
            Err(CoreError::CreditOverflow)
        ));
    }

    #[test]
    fn test_packages() {
        let starter = find_package("starter").unwrap();
        assert_eq!(starter.credits, 500);
        assert_eq!(starter.price().to_string(), "৳500.00");

        let standard = find_package("STANDARD").unwrap();
        assert_eq!(standard.credits, 2_000);
        assert_eq!(standard.price().to_string(), "৳1,800.00");

        let premium = find_package("premium").unwrap();
        assert_eq!(premium.credits, 5_000);
        assert_eq!(premium.price_paisa, 400_000);

        assert!(matches!(find_package("gold"), Err(CoreError::UnknownPackage(_))));
    }

    #[test]
    fn test_add_credits_request_validation() {
        let ok = AddCreditsRequest {
            school_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            amount: 1000,
            description: None,
        };
        assert!(ok.validate().is_ok());

        let zero = AddCreditsRequest { amount: 0, ..ok.clone() };
        assert!(zero.validate().is_err());

        let bad_school = AddCreditsRequest {
            school_id: "school-1".to_string(),
            ..ok
        };
        assert!(bad_school.validate().is_err());
    }

    #[test]
    fn test_transaction_kind_serde() {
        assert_eq!(
            serde_json::to_string(&CreditTransactionKind::Purchase).unwrap(),
            "\"purchase\""
        );
        assert_eq!(CreditTransactionKind::Spend.as_str(), "spend");
    }
}
