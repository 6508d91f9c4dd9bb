//! # Money Module
//!
//! Provides the `Money` type for Bangladeshi Taka amounts.
//!
//! ## Why Integer Paisa?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Tuition split three ways:                                              │
//! │    ৳1000 / 3 = ৳333.33 (×3 = ৳999.99)  → Lost 1 paisa!                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Paisa (1 Taka = 100 paisa)                       │
//! │    100000 paisa / 3 = 33333 paisa (×3 = 99999 paisa)                    │
//! │    We KNOW we lost 1 paisa, and handle it explicitly                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shikkha_core::money::Money;
//!
//! let tuition = Money::from_paisa(150_000); // ৳1,500.00
//! let yearly = tuition * 12;
//! assert_eq!(yearly.to_string(), "৳18,000.00");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in paisa (1/100 Taka).
///
/// ## Where Money is Used
/// ```text
/// FeeReceipt.amount_paisa ──► waiver ──► net amount ──► printed receipt
/// CreditPackage.price_paisa ──► purchase record
/// BookIssue.fine_paisa ◄── overdue days × daily rate
/// InventoryItem.unit_price_paisa × quantity ──► stock value
/// TransportRoute.monthly_fee_paisa
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from paisa.
    ///
    /// ## Example
    /// ```rust
    /// use shikkha_core::money::Money;
    ///
    /// let fee = Money::from_paisa(125_050);
    /// assert_eq!(fee.paisa(), 125_050);
    /// ```
    #[inline]
    pub const fn from_paisa(paisa: i64) -> Self {
        Money(paisa)
    }

    /// Creates a Money value from whole Taka.
    #[inline]
    pub const fn from_taka(taka: i64) -> Self {
        Money(taka * 100)
    }

    /// Returns the value in paisa.
    #[inline]
    pub const fn paisa(&self) -> i64 {
        self.0
    }

    /// Returns the whole-Taka portion.
    #[inline]
    pub const fn taka(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the paisa portion (always 0-99).
    #[inline]
    pub const fn paisa_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use shikkha_core::money::Money;
    ///
    /// let daily_fine = Money::from_taka(5);
    /// assert_eq!(daily_fine.multiply_quantity(3).paisa(), 1500);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a percentage waiver and returns the remaining amount.
    ///
    /// ## Arguments
    /// * `waiver_bps` - Waiver in basis points (5000 = 50% scholarship)
    ///
    /// ## Example
    /// ```rust
    /// use shikkha_core::money::Money;
    ///
    /// let tuition = Money::from_taka(1500);
    /// let net = tuition.apply_waiver(5000);
    /// assert_eq!(net.paisa(), 75_000);
    /// ```
    pub fn apply_waiver(&self, waiver_bps: u32) -> Money {
        let waived = (self.0 as i128 * waiver_bps as i128 + 5000) / 10000;
        Money::from_paisa(self.0 - waived as i64)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Displays Taka with South Asian digit grouping (lakh/crore).
///
/// `123456789` paisa → `৳12,34,567.89`
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(
            f,
            "{}৳{}.{:02}",
            sign,
            group_lakh(self.taka().unsigned_abs()),
            self.paisa_part()
        )
    }
}

/// Groups digits the Bangladeshi way: last three, then pairs.
fn group_lakh(value: u64) -> String {
    let digits = value.to_string();
    if digits.len() <= 3 {
        return digits;
    }

    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 2 {
        groups.push(&head[end - 2..end]);
        end -= 2;
    }
    groups.push(&head[..end]);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_paisa() {
        let money = Money::from_paisa(125_050);
        assert_eq!(money.paisa(), 125_050);
        assert_eq!(money.taka(), 1250);
        assert_eq!(money.paisa_part(), 50);
        assert_eq!(Money::from_taka(20).paisa(), 2000);
    }

    #[test]
    fn test_display_lakh_grouping() {
        assert_eq!(Money::from_paisa(0).to_string(), "৳0.00");
        assert_eq!(Money::from_paisa(50_000).to_string(), "৳500.00");
        assert_eq!(Money::from_paisa(125_050).to_string(), "৳1,250.50");
        assert_eq!(Money::from_paisa(123_456_789).to_string(), "৳12,34,567.89");
        assert_eq!(Money::from_taka(10_000_000).to_string(), "৳1,00,00,000.00");
        assert_eq!(Money::from_paisa(-550).to_string(), "-৳5.50");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_taka(10);
        let b = Money::from_taka(5);

        assert_eq!((a + b).paisa(), 1500);
        assert_eq!((a - b).paisa(), 500);
        assert_eq!((a * 3).paisa(), 3000);

        let mut total = Money::zero();
        total += a;
        total += b;
        assert_eq!(total, Money::from_taka(15));
    }

    #[test]
    fn test_waiver() {
        let tuition = Money::from_taka(1500);
        assert_eq!(tuition.apply_waiver(0), tuition);
        assert_eq!(tuition.apply_waiver(10_000), Money::zero());
        assert_eq!(tuition.apply_waiver(2500).paisa(), 112_500);
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_paisa(1).is_positive());
        assert!(Money::from_paisa(-1).is_negative());
    }

    #[test]
    fn test_division_precision_loss_documented() {
        let total = Money::from_taka(1000);
        let one_third = Money::from_paisa(total.paisa() / 3);
        let reconstructed = one_third * 3;

        assert_eq!((total - reconstructed).paisa(), 1);
    }
}
