//! # Event Bus
//!
//! In-process typed pub/sub over `tokio::sync::broadcast`.
//!
//! Publishers never block and never fail because nobody listens; a lagging
//! subscriber loses the oldest events instead of slowing publishers down.

use crate::domain::events::{
    BalanceUpdated, DomainEvent, TradeExpired, TradeInitiated, TradeStatusChanged,
};
use tokio::sync::broadcast;
use tracing::trace;

/// Default channel capacity.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Events published on the application bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// A trade was created.
    TradeInitiated(TradeInitiated),
    /// A trade moved forward.
    TradeStatusChanged(TradeStatusChanged),
    /// A trade's settlement window elapsed.
    TradeExpired(TradeExpired),
    /// The user's balance was refreshed.
    BalanceUpdated(BalanceUpdated),
}

impl AppEvent {
    /// Stable event name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::TradeInitiated(e) => e.event_name(),
            Self::TradeStatusChanged(e) => e.event_name(),
            Self::TradeExpired(e) => e.event_name(),
            Self::BalanceUpdated(e) => e.event_name(),
        }
    }
}

/// Broadcast bus for [`AppEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl EventBus {
    /// Creates a bus holding up to `capacity` undelivered events per subscriber.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(16));
        Self { tx }
    }

    /// Publishes an event; returns the number of subscribers reached.
    pub fn publish(&self, event: AppEvent) -> usize {
        let name = event.name();
        let delivered = self.tx.send(event).unwrap_or(0);
        trace!(event = name, delivered, "event published");
        delivered
    }

    /// Subscribes to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::UserProfile;

    #[tokio::test]
    async fn publish_subscribe_roundtrip() {
        let bus = EventBus::default();
        let mut rx = bus.subscribe();
        let event = AppEvent::BalanceUpdated(BalanceUpdated::new(UserProfile::default()));
        assert_eq!(bus.publish(event.clone()), 1);
        assert_eq!(rx.recv().await.unwrap(), event);
    }

    #[test]
    fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(4);
        let event = AppEvent::BalanceUpdated(BalanceUpdated::new(UserProfile::default()));
        assert_eq!(bus.publish(event), 0);
    }
}
