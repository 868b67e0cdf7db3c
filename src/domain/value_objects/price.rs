//! # Price Value Object
//!
//! Non-negative USD price with checked arithmetic.
//!
//! [`Price`] is used both for a per-share price and for monetary totals
//! (`quantity × pricePerShare`).
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::value_objects::{Price, Quantity};
//!
//! let price: Price = "50".parse().unwrap();
//! let qty: Quantity = "12.5".parse().unwrap();
//!
//! let total = price.amount_for(qty).unwrap();
//! assert_eq!(total.to_string(), "625");
//! ```

use super::arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic, round_cents};
use super::quantity::Quantity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// A validated, non-negative USD price.
///
/// # Invariants
///
/// - Price is always >= 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// Zero price constant.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a price from an f64 value.
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

    /// Creates a price from a Decimal value.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::InvalidValue` if the value is negative.
    #[must_use = "this returns a Result that should be handled"]
    pub fn from_decimal(value: Decimal) -> ArithmeticResult<Self> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(ArithmeticError::InvalidValue("price cannot be negative"));
        }
        Ok(Self(value))
    }

    /// Returns the inner Decimal value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> Decimal {
        self.0
    }

    /// Returns true if the price is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Returns true if the price is strictly positive.
    #[inline]
    #[must_use]
    pub fn is_positive(self) -> bool {
        !self.0.is_zero() && self.0.is_sign_positive()
    }

    /// Total amount for `quantity` shares at this per-share price.
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticError::Overflow` if the product overflows.
    #[must_use = "this returns the result of the operation, without modifying the original"]
    pub fn amount_for(self, quantity: Quantity) -> ArithmeticResult<Self> {
        Ok(Self(self.0.safe_mul(quantity.get())?))
    }

    /// Rounds to whole cents.
    #[must_use]
    pub fn round_cents(self) -> Self {
        Self(round_cents(self.0))
    }

    /// Formats with exactly two decimal places (`"1250.00"`).
    #[must_use]
    pub fn to_fixed2(self) -> String {
        format!("{:.2}", round_cents(self.0))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl PartialOrd for Price {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = ArithmeticError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::from_decimal(value)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl FromStr for Price {
    type Err = ArithmeticError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|_| ArithmeticError::InvalidValue("invalid decimal"))?;
        Self::from_decimal(decimal)
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}
