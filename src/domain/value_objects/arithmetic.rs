//! # Checked Arithmetic
//!
//! Overflow-safe arithmetic helpers for [`Decimal`] values.
//!
//! Prices, quantities and amounts are all decimal; every operation that
//! can overflow or divide by zero goes through [`CheckedArithmetic`].

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

/// Error raised by checked arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// Result exceeds the representable range.
    #[error("arithmetic overflow")]
    Overflow,

    /// Result fell below the representable range.
    #[error("arithmetic underflow")]
    Underflow,

    /// Divisor was zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Input or result violates a value constraint.
    #[error("invalid value: {0}")]
    InvalidValue(&'static str),
}

/// Result type for arithmetic operations.
pub type ArithmeticResult<T> = Result<T, ArithmeticError>;

/// Checked arithmetic operations.
pub trait CheckedArithmetic: Sized {
    /// Adds, failing on overflow.
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Subtracts, failing on overflow.
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Multiplies, failing on overflow.
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self>;

    /// Divides, failing on a zero divisor or overflow.
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self>;
}

impl CheckedArithmetic for Decimal {
    #[inline]
    fn safe_add(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_add(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_sub(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_sub(rhs).ok_or(ArithmeticError::Underflow)
    }

    #[inline]
    fn safe_mul(self, rhs: Self) -> ArithmeticResult<Self> {
        self.checked_mul(rhs).ok_or(ArithmeticError::Overflow)
    }

    #[inline]
    fn safe_div(self, rhs: Self) -> ArithmeticResult<Self> {
        if rhs.is_zero() {
            return Err(ArithmeticError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(ArithmeticError::Overflow)
    }
}

/// Rounds to two decimal places, half away from zero.
///
/// Matches how amounts and derived quantities are displayed.
///
/// # Examples
///
/// ```
/// use p2p_escrow::domain::value_objects::arithmetic::round_cents;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_cents(Decimal::new(12345, 3)).to_string(), "12.35");
/// ```
#[must_use]
pub fn round_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
