//! # Trade Events
//!
//! Events raised while a trade is negotiated, funded and settled.

use super::domain_event::{DomainEvent, EventMetadata};
use crate::domain::entities::UserProfile;
use crate::domain::value_objects::{Quantity, StockSymbol, Timestamp, TradeId, TradeStatus};
use serde::{Deserialize, Serialize};

/// The escrow server accepted an initiate-trade command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeInitiated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Server-assigned trade id.
    pub trade_id: TradeId,
    /// Traded stock.
    pub stock_symbol: StockSymbol,
    /// Traded quantity.
    pub quantity: Quantity,
}

impl TradeInitiated {
    /// Creates the event stamped now.
    #[must_use]
    pub fn new(trade_id: TradeId, stock_symbol: StockSymbol, quantity: Quantity) -> Self {
        Self {
            metadata: EventMetadata::now(),
            trade_id,
            stock_symbol,
            quantity,
        }
    }
}

impl DomainEvent for TradeInitiated {
    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn trade_id(&self) -> Option<&TradeId> {
        Some(&self.trade_id)
    }

    fn event_name(&self) -> &'static str {
        "TradeInitiated"
    }
}

/// A server observation moved a trade forward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeStatusChanged {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Trade concerned.
    pub trade_id: TradeId,
    /// Previous status.
    pub from: TradeStatus,
    /// New status.
    pub to: TradeStatus,
}

impl TradeStatusChanged {
    /// Creates the event stamped now.
    #[must_use]
    pub fn new(trade_id: TradeId, from: TradeStatus, to: TradeStatus) -> Self {
        Self {
            metadata: EventMetadata::now(),
            trade_id,
            from,
            to,
        }
    }

    /// Returns true if the trade reached a terminal status.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.to.is_terminal()
    }
}

impl DomainEvent for TradeStatusChanged {
    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn trade_id(&self) -> Option<&TradeId> {
        Some(&self.trade_id)
    }

    fn event_name(&self) -> &'static str {
        "TradeStatusChanged"
    }
}

/// The settlement window elapsed on a non-terminal trade.
///
/// Client-predicted; the server remains authoritative for the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeExpired {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Trade concerned.
    pub trade_id: TradeId,
    /// End of the settlement window.
    pub expired_at: Timestamp,
}

impl TradeExpired {
    /// Creates the event stamped now.
    #[must_use]
    pub fn new(trade_id: TradeId, expired_at: Timestamp) -> Self {
        Self {
            metadata: EventMetadata::now(),
            trade_id,
            expired_at,
        }
    }
}

impl DomainEvent for TradeExpired {
    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn trade_id(&self) -> Option<&TradeId> {
        Some(&self.trade_id)
    }

    fn event_name(&self) -> &'static str {
        "TradeExpired"
    }
}

/// The user's balance was re-read after funding escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdated {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Fresh profile, balance included.
    pub user: UserProfile,
}

impl BalanceUpdated {
    /// Creates the event stamped now.
    #[must_use]
    pub fn new(user: UserProfile) -> Self {
        Self {
            metadata: EventMetadata::now(),
            user,
        }
    }
}

impl DomainEvent for BalanceUpdated {
    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    fn trade_id(&self) -> Option<&TradeId> {
        None
    }

    fn event_name(&self) -> &'static str {
        "BalanceUpdated"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_changed_terminal_flag() {
        let event = TradeStatusChanged::new(
            TradeId::new("t-1"),
            TradeStatus::PaymentSent,
            TradeStatus::Completed,
        );
        assert!(event.is_terminal());
        assert_eq!(event.event_name(), "TradeStatusChanged");
        assert_eq!(event.trade_id().unwrap().as_str(), "t-1");
    }

    #[test]
    fn balance_event_has_no_trade() {
        let event = BalanceUpdated::new(UserProfile::default());
        assert!(event.trade_id().is_none());
        assert_ne!(event.event_id(), BalanceUpdated::new(UserProfile::default()).event_id());
    }
}
