//! # Application Layer
//!
//! Lifecycle services and screen-level use cases on top of the domain.
//!
//! ## Use Cases
//!
//! - [`InitiateTradeUseCase`]: submit a negotiated offer
//! - [`TradeView`]: follow and act on an open trade
//! - [`ConfirmCompletion`]: fund-then-complete review
//!
//! ## Services
//!
//! - [`TradeSessionStore`]: monotonic local trade state
//! - [`PaymentCoordinator`]: the four escrow commands
//! - [`CountdownMonitor`] and [`StatusPoller`]: background loops
//!
//! [`AppContext`] wires all of it for one signed-in session.

pub mod app_context;
pub mod dto;
pub mod error;
pub mod ports;
pub mod services;
pub mod use_cases;

pub use app_context::{AppContext, AppContextBuilder, Session};
pub use error::{ApplicationError, ApplicationResult};
pub use services::{
    CountdownMonitor, EventBus, NegotiationForm, PaymentCoordinator, StatusPoller,
    TradeSessionStore, TradeTimings,
};
pub use use_cases::{ConfirmCompletion, InitiateTradeUseCase, TradeView};
