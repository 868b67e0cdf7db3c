//! # Domain Events
//!
//! Events emitted during the trade lifecycle. They are published on the
//! in-process event bus and consumed by views such as balance displays.
//!
//! - `TradeInitiated`: escrow server accepted a new trade
//! - `TradeStatusChanged`: a trade moved forward
//! - `TradeExpired`: the settlement window elapsed client-side
//! - `BalanceUpdated`: the user's balance was refreshed

pub mod domain_event;
pub mod trade_events;

pub use domain_event::{DomainEvent, EventMetadata};
pub use trade_events::{BalanceUpdated, TradeExpired, TradeInitiated, TradeStatusChanged};
