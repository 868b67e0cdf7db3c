//! # Quantity Value Object
//!
//! Non-negative share quantity.
//!
//! Quantities are decimal because the amount→quantity conversion of the
//! negotiation form produces fractional shares rounded to two places.
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::value_objects::{Price, Quantity};
//!
//! let price: Price = "40".parse().unwrap();
//! let amount: Price = "100".parse().unwrap();
//!
//! let qty = Quantity::for_amount(amount, price).unwrap();
//! assert_eq!(qty.to_string(), "2.5");
//! ```

use super::arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic, round_cents};
use super::price::Price;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A validated, non-negative share quantity.
///
/// # Invariants
///
/// - Quantity is always >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Quantity(Decimal);

impl Quantity {
    /// Zero quantity constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a quantity from an f64 value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative or not finite.
    #[must_use = "this returns a Result that should be handled"]
    pub fn new(value: f64) -> ArithmeticResult<Self> {
        let decimal =
            Decimal::try_from(value).map_err(|_| ArithmeticError::InvalidValue("invalid float"))?;
        Self::from_decimal(decimal)
    }

    /// Creates a quantity from a Decimal value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative.
    #[must_use = "this returns a Result that should be handled"]
    pub fn from_decimal(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue("quantity cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Number of shares `amount` buys at `price_per_share`.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::DivisionByZero` for a zero price.
    pub fn for_amount(amount: Price, price_per_share: Price) -> ArithmeticResult<Self> {
        Self::from_decimal(amount.get().safe_div(price_per_share.get())?)
    }

    /// Returns the inner Decimal value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Returns true if the quantity is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Rounds to two decimal places.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(round_cents(self.0))
    }

    /// Returns true if `min <= self <= max`.
    #[must_use]
    pub fn is_within(self, min: Self, max: Self) -> bool {
        self >= min && self <= max
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl TryFrom<Decimal> for Quantity {
    type Error = ArithmeticError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Quantity> for Decimal {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl FromStr for Quantity {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|_| ArithmeticError::InvalidValue("invalid decimal"))?;
        Self::from_decimal(decimal)
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ZERO
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn negative_rejected() {
        assert!(Quantity::new(-1.0).is_err());
    }

    #[test]
    fn for_amount_divides() {
        let qty = Quantity::for_amount("250".parse().unwrap(), "50".parse().unwrap()).unwrap();
        assert_eq!(qty.get(), Decimal::new(5, 0));
    }

    #[test]
    fn for_amount_zero_price() {
        let result = Quantity::for_amount("250".parse().unwrap(), Price::ZERO);
        assert_eq!(result, Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn is_within_is_inclusive() {
        let min: Quantity = "10".parse().unwrap();
        let max: Quantity = "100".parse().unwrap();
        assert!(min.is_within(min, max));
        assert!(max.is_within(min, max));
        assert!(!"100.01".parse::<Quantity>().unwrap().is_within(min, max));
        assert!(!"9.99".parse::<Quantity>().unwrap().is_within(min, max));
    }

    #[test]
    fn display_drops_trailing_zeros() {
        let qty = Quantity::from_decimal(Decimal::new(1000, 2)).unwrap();
        assert_eq!(qty.to_string(), "10");
    }
}
