//! # Value Objects
//!
//! Immutable types with validation and domain semantics.
//!
//! ## Identity Types
//!
//! - [`TradeId`], [`OfferId`], [`UserId`]: opaque server-assigned identifiers
//!
//! ## Numeric Types
//!
//! - [`Price`]: non-negative USD price or amount
//! - [`Quantity`]: non-negative share quantity
//!
//! ## Arithmetic
//!
//! - [`ArithmeticError`]: Error type for arithmetic failures
//! - [`CheckedArithmetic`]: Trait for safe arithmetic operations
//!
//! ## Domain Enums
//!
//! - [`OfferType`]: BUY, SELL or SWAP
//! - [`TradeRole`]: the observing user's side
//! - [`PaymentMethod`]: escrow funding method
//!
//! ## State Types
//!
//! - [`TradeStatus`]: trade lifecycle state machine

pub mod arithmetic;
pub mod enums;
pub mod ids;
pub mod price;
pub mod quantity;
pub mod symbol;
pub mod timestamp;
pub mod trade_status;

pub use arithmetic::{ArithmeticError, ArithmeticResult, CheckedArithmetic, round_cents};
pub use enums::{OfferType, ParseEnumError, PaymentMethod, TradeRole};
pub use ids::{OfferId, TradeId, UserId};
pub use price::Price;
pub use quantity::Quantity;
pub use symbol::{StockSymbol, SymbolError};
pub use timestamp::Timestamp;
pub use trade_status::{ParseTradeStatusError, TradeStatus};
