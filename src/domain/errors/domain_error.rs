//! # Domain Errors
//!
//! Typed domain error definitions.
//!
//! # Error Code Ranges
//!
//! - **1000-1999**: Validation errors
//! - **2000-2999**: State errors
//! - **4000-4999**: Arithmetic errors
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::errors::DomainError;
//!
//! let error = DomainError::InvalidPrice("price must be positive".to_string());
//! assert_eq!(error.code(), 1001);
//! ```

use crate::domain::value_objects::arithmetic::ArithmeticError;
use crate::domain::value_objects::{Quantity, TradeStatus};
use thiserror::Error;

/// Domain-level error with numeric error codes.
///
/// | Range | Category |
/// |-------|----------|
/// | 1000-1999 | Validation errors |
/// | 2000-2999 | State errors |
/// | 4000-4999 | Arithmetic errors |
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    // ========================================================================
    // Validation Errors (1000-1999)
    // ========================================================================
    /// Invalid price value.
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    /// Invalid quantity value.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// Requested quantity outside the offer's bounds.
    #[error("Quantity must be between {min} and {max} shares")]
    QuantityOutOfRange {
        /// Offer minimum.
        min: Quantity,
        /// Offer maximum.
        max: Quantity,
    },

    /// Invalid symbol format.
    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Invalid timestamp.
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Payment method is listed but not supported.
    #[error("{0} is currently unavailable. Please select another payment method.")]
    PaymentMethodUnavailable(String),

    /// A buyer submitted without choosing a payment method.
    #[error("Please select a payment method")]
    PaymentMethodRequired,

    /// Crypto was chosen but the transfer was not acknowledged.
    #[error("Please confirm you have sent the crypto payment")]
    PaymentNotAcknowledged,

    /// Buyer and seller flags are inconsistent.
    #[error("invalid role flags: {0}")]
    InvalidRole(String),

    /// Generic validation error.
    #[error("validation error: {0}")]
    ValidationError(String),

    // ========================================================================
    // State Errors (2000-2999)
    // ========================================================================
    /// Backward or post-terminal status change attempted.
    #[error("invalid state transition from {from} to {to}")]
    InvalidStateTransition {
        /// The current status.
        from: TradeStatus,
        /// The attempted target status.
        to: TradeStatus,
    },

    /// An observation carried different static terms than the tracked trade.
    #[error("trade terms changed: {0}")]
    TermsChanged(String),

    // ========================================================================
    // Arithmetic Errors (4000-4999)
    // ========================================================================
    /// Arithmetic overflow.
    #[error("arithmetic overflow")]
    Overflow,

    /// Arithmetic underflow.
    #[error("arithmetic underflow")]
    Underflow,

    /// Division by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Invalid arithmetic value.
    #[error("invalid arithmetic value: {0}")]
    InvalidArithmeticValue(String),
}

impl DomainError {
    /// Returns the numeric error code.
    ///
    /// ```
    /// use p2p_escrow::domain::errors::DomainError;
    ///
    /// assert_eq!(DomainError::InvalidPrice("test".to_string()).code(), 1001);
    /// assert_eq!(DomainError::Overflow.code(), 4001);
    /// ```
    #[must_use]
    pub const fn code(&self) -> u16 {
        match self {
            Self::InvalidPrice(_) => 1001,
            Self::InvalidQuantity(_) => 1002,
            Self::QuantityOutOfRange { .. } => 1003,
            Self::InvalidSymbol(_) => 1004,
            Self::InvalidId(_) => 1005,
            Self::InvalidTimestamp(_) => 1006,
            Self::PaymentMethodUnavailable(_) => 1007,
            Self::PaymentMethodRequired => 1008,
            Self::PaymentNotAcknowledged => 1009,
            Self::InvalidRole(_) => 1010,
            Self::ValidationError(_) => 1099,

            Self::InvalidStateTransition { .. } => 2001,
            Self::TermsChanged(_) => 2002,

            Self::Overflow => 4001,
            Self::Underflow => 4002,
            Self::DivisionByZero => 4003,
            Self::InvalidArithmeticValue(_) => 4004,
        }
    }

    /// Returns the error category name.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self.code() {
            1000..=1999 => "validation",
            2000..=2999 => "state",
            4000..=4999 => "arithmetic",
            _ => "unknown",
        }
    }

    /// Returns true if this is a validation error.
    #[inline]
    #[must_use]
    pub const fn is_validation_error(&self) -> bool {
        matches!(self.code(), 1000..=1999)
    }

    /// Returns true if this is a state error.
    #[inline]
    #[must_use]
    pub const fn is_state_error(&self) -> bool {
        matches!(self.code(), 2000..=2999)
    }

    /// Returns true if this is an arithmetic error.
    #[inline]
    #[must_use]
    pub const fn is_arithmetic_error(&self) -> bool {
        matches!(self.code(), 4000..=4999)
    }
}

impl From<ArithmeticError> for DomainError {
    fn from(err: ArithmeticError) -> Self {
        match err {
            ArithmeticError::Overflow => Self::Overflow,
            ArithmeticError::Underflow => Self::Underflow,
            ArithmeticError::DivisionByZero => Self::DivisionByZero,
            ArithmeticError::InvalidValue(msg) => Self::InvalidArithmeticValue(msg.to_string()),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
