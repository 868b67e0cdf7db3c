//! # Use Cases
//!
//! Screen-level workflows of the trade lifecycle.
//!
//! - [`InitiateTradeUseCase`]: negotiation form → new trade
//! - [`TradeView`]: open trade with polling, countdown and actions
//! - [`ConfirmCompletion`]: fund-then-complete review page

pub mod confirm_completion;
pub mod initiate_trade;
pub mod trade_view;

pub use confirm_completion::{ConfirmCompletion, ReviewState};
pub use initiate_trade::{INITIATE_FAILED, INITIATE_OK, InitiateTradeUseCase, InitiationOutcome};
pub use trade_view::{
    AvailableActions, CONFIRM_RECEIPT_UNAVAILABLE, TradeDisplay, TradeView, TradeViewDeps,
};
