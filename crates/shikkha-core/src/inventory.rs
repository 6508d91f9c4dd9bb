//! # Inventory Module
//!
//! School stores (chalk, furniture, lab equipment) and their stock movements.
//!
//! ```text
//! movement    effect on quantity      guard
//! ────────    ──────────────────      ─────────────────────────
//! in          quantity + n            n > 0
//! out         quantity - n            n > 0, result >= 0
//! adjust      quantity = n            n >= 0 (stock count)
//!
//! low stock:  quantity <= min_quantity
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::validation::{
    validate_amount, validate_name, validate_optional_name, validate_positive, ValidationResult,
};

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct InventoryItem {
    pub id: String,
    pub school_id: String,
    pub name: String,
    pub category: Option<String>,
    /// "pcs", "box", "ream", ...
    pub unit: String,
    #[ts(type = "number")]
    pub quantity: i64,
    #[ts(type = "number")]
    pub min_quantity: i64,
    #[ts(type = "number")]
    pub unit_price_paisa: i64,
    pub location: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn is_low_stock(&self) -> bool {
        is_low_stock(self.quantity, self.min_quantity)
    }

    /// Value of the stock on hand.
    pub fn stock_value(&self) -> Money {
        Money::from_paisa(self.unit_price_paisa).multiply_quantity(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "text", rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    In,
    Out,
    /// Physical count; sets the absolute quantity.
    Adjust,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub school_id: String,
    pub item_id: String,
    pub kind: MovementKind,
    #[ts(type = "number")]
    pub quantity: i64,
    /// Quantity on hand after the movement.
    #[ts(type = "number")]
    pub balance_after: i64,
    pub note: Option<String>,
    pub created_by: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Requests
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewItem {
    pub name: String,
    pub category: Option<String>,
    pub unit: Option<String>,
    #[serde(default)]
    #[ts(type = "number")]
    pub quantity: i64,
    #[serde(default)]
    #[ts(type = "number")]
    pub min_quantity: i64,
    #[serde(default)]
    #[ts(type = "number")]
    pub unit_price_paisa: i64,
    pub location: Option<String>,
}

impl NewItem {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name)?;
        validate_optional_name("category", self.category.as_deref())?;
        validate_amount("quantity", self.quantity)?;
        validate_amount("min_quantity", self.min_quantity)?;
        validate_amount("unit_price_paisa", self.unit_price_paisa)
    }
}

/// Item metadata update. Quantity changes go through movements.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    #[ts(type = "number | null")]
    pub min_quantity: Option<i64>,
    #[ts(type = "number | null")]
    pub unit_price_paisa: Option<i64>,
    pub location: Option<String>,
}

impl ItemUpdate {
    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_name("name", name)?;
        }
        if let Some(min) = self.min_quantity {
            validate_amount("min_quantity", min)?;
        }
        if let Some(price) = self.unit_price_paisa {
            validate_amount("unit_price_paisa", price)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewMovement {
    pub kind: MovementKind,
    #[ts(type = "number")]
    pub quantity: i64,
    pub note: Option<String>,
}

impl NewMovement {
    pub fn validate(&self) -> ValidationResult<()> {
        match self.kind {
            MovementKind::In | MovementKind::Out => validate_positive("quantity", self.quantity),
            MovementKind::Adjust => validate_amount("quantity", self.quantity),
        }
    }
}

// =============================================================================
// Rules
// =============================================================================

pub fn is_low_stock(quantity: i64, min_quantity: i64) -> bool {
    quantity <= min_quantity
}

/// Quantity on hand after applying a movement.
///
/// ## Errors
/// - `CoreError::InsufficientStock` if an `out` would go below zero
/// - `CoreError::Validation` for non-positive in/out or negative adjust
pub fn apply_movement(item: &str, current: i64, kind: MovementKind, qty: i64) -> CoreResult<i64> {
    match kind {
        MovementKind::In => {
            validate_positive("quantity", qty)?;
            current
                .checked_add(qty)
                .ok_or_else(|| ValidationError::invalid("quantity", "is too large").into())
        }
        MovementKind::Out => {
            validate_positive("quantity", qty)?;
            if qty > current {
                return Err(CoreError::InsufficientStock {
                    item: item.to_string(),
                    available: current,
                    requested: qty,
                });
            }
            Ok(current - qty)
        }
        MovementKind::Adjust => {
            validate_amount("quantity", qty)?;
            Ok(qty)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_in() {
        assert_eq!(apply_movement("Chalk", 10, MovementKind::In, 5).unwrap(), 15);
        assert!(apply_movement("Chalk", 10, MovementKind::In, 0).is_err());
        assert!(apply_movement("Chalk", i64::MAX, MovementKind::In, 1).is_err());
    }

    #[test]
    fn test_movement_out() {
        assert_eq!(apply_movement("Chalk", 10, MovementKind::Out, 10).unwrap(), 0);
        match apply_movement("Chalk", 3, MovementKind::Out, 5) {
            Err(CoreError::InsufficientStock {
                item,
                available,
                requested,
            }) => {
                assert_eq!(item, "Chalk");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
        assert!(apply_movement("Chalk", 3, MovementKind::Out, -1).is_err());
    }

    #[test]
    fn test_movement_adjust() {
        assert_eq!(apply_movement("Bench", 40, MovementKind::Adjust, 37).unwrap(), 37);
        assert_eq!(apply_movement("Bench", 40, MovementKind::Adjust, 0).unwrap(), 0);
        assert!(apply_movement("Bench", 40, MovementKind::Adjust, -1).is_err());
    }

    #[test]
    fn test_low_stock() {
        assert!(is_low_stock(5, 5));
        assert!(is_low_stock(0, 0));
        assert!(!is_low_stock(6, 5));
    }

    #[test]
    fn test_item_value() {
        let item = InventoryItem {
            id: "i".to_string(),
            school_id: "s".to_string(),
            name: "A4 Paper".to_string(),
            category: None,
            unit: "ream".to_string(),
            quantity: 12,
            min_quantity: 20,
            unit_price_paisa: 45_000,
            location: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(item.is_low_stock());
        assert_eq!(item.stock_value().to_string(), "৳5,400.00");
    }

    #[test]
    fn test_new_movement_validation() {
        let out = NewMovement {
            kind: MovementKind::Out,
            quantity: 0,
            note: None,
        };
        assert!(out.validate().is_err());
        let adjust = NewMovement {
            kind: MovementKind::Adjust,
            quantity: 0,
            note: None,
        };
        assert!(adjust.validate().is_ok());
    }
}
