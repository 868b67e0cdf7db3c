//! # Trade Session Store
//!
//! Locally known state of the trade being viewed.
//!
//! Three writers feed the store: command responses (through a refetch),
//! background polls and the countdown. All of them go through
//! [`TradeSessionStore::apply`] or [`TradeSessionStore::mark_expired`],
//! which take the write lock, so status changes are serialized and always
//! follow the forward-only precedence of [`Trade::observe_status`].
//!
//! Readers get snapshots. Status changes are also pushed on a `watch`
//! channel so the poller and countdown can stop as soon as any writer
//! applies a terminal status.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::event_bus::{AppEvent, EventBus};
use crate::domain::entities::{ObservationOutcome, Trade};
use crate::domain::events::{TradeExpired, TradeStatusChanged};
use crate::domain::value_objects::{Timestamp, TradeId, TradeStatus};
use std::fmt;
use std::sync::Arc;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info, warn};

/// Command currently awaiting a server response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingIntent {
    /// Buyer funds escrow.
    ConfirmPayment,
    /// Buyer reports an external payment.
    MarkPaymentSent,
    /// Escrow release.
    Complete,
    /// Cancellation.
    Cancel,
}

impl fmt::Display for PendingIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ConfirmPayment => "confirm-payment",
            Self::MarkPaymentSent => "payment-sent",
            Self::Complete => "complete",
            Self::Cancel => "cancel",
        };
        f.write_str(s)
    }
}

/// Snapshot of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Last applied observation; `None` until the first load.
    pub trade: Option<Trade>,
    /// In-flight command, if any.
    pub intent: Option<PendingIntent>,
    /// Settlement window elapsed while non-terminal.
    pub expired: bool,
}

impl SessionState {
    /// Current status, once loaded.
    #[must_use]
    pub fn status(&self) -> Option<TradeStatus> {
        self.trade.as_ref().map(Trade::status)
    }

    /// Returns true once a terminal status has been applied.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.trade.as_ref().is_some_and(Trade::is_terminal)
    }
}

/// What an applied observation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// First observation of the session.
    Seeded(TradeStatus),
    /// Observation merged into the known trade.
    Observed(ObservationOutcome),
}

impl Applied {
    /// Returns true if the status changed or was set for the first time.
    #[must_use]
    pub fn changed_status(&self) -> bool {
        match self {
            Self::Seeded(_) => true,
            Self::Observed(outcome) => outcome.is_advanced(),
        }
    }
}

/// State of one trade for the lifetime of its view.
pub struct TradeSessionStore {
    trade_id: TradeId,
    state: Arc<RwLock<SessionState>>,
    status_tx: watch::Sender<Option<TradeStatus>>,
    bus: EventBus,
}

impl fmt::Debug for TradeSessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TradeSessionStore")
            .field("trade_id", &self.trade_id)
            .field("status", &*self.status_tx.borrow())
            .finish_non_exhaustive()
    }
}

impl TradeSessionStore {
    /// Empty session for `trade_id`.
    #[must_use]
    pub fn new(trade_id: TradeId, bus: EventBus) -> Self {
        let (status_tx, _) = watch::channel(None);
        Self {
            trade_id,
            state: Arc::new(RwLock::new(SessionState::default())),
            status_tx,
            bus,
        }
    }

    /// Session seeded with an already known trade.
    #[must_use]
    pub fn seeded(trade: Trade, bus: EventBus) -> Self {
        let (status_tx, _) = watch::channel(Some(trade.status()));
        Self {
            trade_id: trade.id().clone(),
            state: Arc::new(RwLock::new(SessionState {
                trade: Some(trade),
                ..SessionState::default()
            })),
            status_tx,
            bus,
        }
    }

    /// Trade this session tracks.
    #[inline]
    #[must_use]
    pub fn trade_id(&self) -> &TradeId {
        &self.trade_id
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Copy of the current trade.
    pub async fn trade(&self) -> Option<Trade> {
        self.state.read().await.trade.clone()
    }

    /// Current status, once loaded.
    pub async fn status(&self) -> Option<TradeStatus> {
        self.state.read().await.status()
    }

    /// Returns true once a terminal status has been applied.
    pub async fn is_terminal(&self) -> bool {
        self.state.read().await.is_terminal()
    }

    /// Returns true if the countdown declared the trade expired.
    pub async fn is_expired(&self) -> bool {
        self.state.read().await.expired
    }

    /// Receiver of status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<Option<TradeStatus>> {
        self.status_tx.subscribe()
    }

    /// Applies a server observation.
    ///
    /// The first observation seeds the session. Later ones go through the
    /// forward-only precedence; stale ones are ignored. A status change is
    /// published as [`TradeStatusChanged`].
    ///
    /// # Errors
    ///
    /// Returns a domain error if the observation is for another trade or
    /// reports different static terms. The session is left unchanged.
    pub async fn apply(&self, observed: Trade) -> ApplicationResult<Applied> {
        if observed.id() != &self.trade_id {
            return Err(ApplicationError::invalid_state(format!(
                "observation for {} applied to session {}",
                observed.id(),
                self.trade_id
            )));
        }

        let mut state = self.state.write().await;
        let Some(current) = state.trade.as_mut() else {
            let status = observed.status();
            info!(trade_id = %self.trade_id, %status, "trade session loaded");
            state.trade = Some(observed);
            self.status_tx.send_replace(Some(status));
            return Ok(Applied::Seeded(status));
        };

        let outcome = current.observe(&observed).map_err(|err| {
            warn!(trade_id = %self.trade_id, error = %err, "observation rejected");
            ApplicationError::from(err)
        })?;

        match outcome {
            ObservationOutcome::Advanced { from, to } => {
                info!(trade_id = %self.trade_id, %from, %to, "trade status advanced");
                self.status_tx.send_replace(Some(to));
                self.bus
                    .publish(AppEvent::TradeStatusChanged(TradeStatusChanged::new(
                        self.trade_id.clone(),
                        from,
                        to,
                    )));
            }
            ObservationOutcome::Stale { current, observed } => {
                debug!(trade_id = %self.trade_id, %current, %observed, "stale observation ignored");
            }
            ObservationOutcome::Unchanged => {}
        }
        Ok(Applied::Observed(outcome))
    }

    /// Records the command awaiting a response.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` if the trade is not loaded or is terminal.
    pub async fn begin_intent(&self, intent: PendingIntent) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        match state.trade.as_ref() {
            None => Err(ApplicationError::invalid_state(format!(
                "trade {} is not loaded",
                self.trade_id
            ))),
            Some(trade) if trade.is_terminal() => Err(ApplicationError::invalid_state(format!(
                "trade {} is already {}",
                self.trade_id,
                trade.status()
            ))),
            Some(_) => {
                debug!(trade_id = %self.trade_id, %intent, "intent recorded");
                state.intent = Some(intent);
                Ok(())
            }
        }
    }

    /// Clears the in-flight command.
    pub async fn end_intent(&self) {
        self.state.write().await.intent = None;
    }

    /// Declares the settlement window elapsed.
    ///
    /// Only a loaded, non-terminal, not yet expired trade can expire; the
    /// first successful call publishes [`TradeExpired`] and returns true.
    pub async fn mark_expired(&self, expired_at: Timestamp) -> bool {
        let mut state = self.state.write().await;
        if state.expired || state.trade.as_ref().is_none_or(Trade::is_terminal) {
            return false;
        }
        state.expired = true;
        info!(trade_id = %self.trade_id, %expired_at, "settlement window elapsed");
        self.bus.publish(AppEvent::TradeExpired(TradeExpired::new(
            self.trade_id.clone(),
            expired_at,
        )));
        true
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::TradeTerms;
    use crate::domain::value_objects::{PaymentMethod, StockSymbol, TradeRole};

    fn trade_with(status: TradeStatus) -> Trade {
        let terms = TradeTerms::new(
            StockSymbol::new("MSFT").unwrap(),
            "5".parse().unwrap(),
            "300".parse().unwrap(),
            PaymentMethod::CashBalance,
        )
        .unwrap();
        Trade::from_parts(
            TradeId::new("s-1"),
            terms,
            status,
            TradeRole::Buyer,
            Timestamp::from_secs(1_700_000_000).unwrap(),
            None,
        )
    }

    mod apply {
        use super::*;

        #[tokio::test]
        async fn first_observation_seeds() {
            let store = TradeSessionStore::new(TradeId::new("s-1"), EventBus::default());
            let applied = store.apply(trade_with(TradeStatus::Pending)).await.unwrap();
            assert_eq!(applied, Applied::Seeded(TradeStatus::Pending));
            assert_eq!(store.status().await, Some(TradeStatus::Pending));
        }

        #[tokio::test]
        async fn forward_observation_publishes_change() {
            let bus = EventBus::default();
            let mut rx = bus.subscribe();
            let store = TradeSessionStore::seeded(trade_with(TradeStatus::Pending), bus);

            let applied = store.apply(trade_with(TradeStatus::Accepted)).await.unwrap();
            assert!(applied.changed_status());

            match rx.recv().await.unwrap() {
                AppEvent::TradeStatusChanged(e) => {
                    assert_eq!(e.from, TradeStatus::Pending);
                    assert_eq!(e.to, TradeStatus::Accepted);
                }
                other => panic!("unexpected event {other:?}"),
            }
        }

        #[tokio::test]
        async fn late_non_terminal_after_terminal_is_ignored() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Pending),
                EventBus::default(),
            );
            store.apply(trade_with(TradeStatus::Completed)).await.unwrap();
            let applied = store.apply(trade_with(TradeStatus::PaymentSent)).await.unwrap();
            assert!(!applied.changed_status());
            assert_eq!(store.status().await, Some(TradeStatus::Completed));
        }

        #[tokio::test]
        async fn other_trade_is_rejected() {
            let store = TradeSessionStore::new(TradeId::new("other"), EventBus::default());
            assert!(store.apply(trade_with(TradeStatus::Pending)).await.is_err());
            assert!(store.trade().await.is_none());
        }

        #[tokio::test]
        async fn watch_sees_latest_status() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Pending),
                EventBus::default(),
            );
            let rx = store.subscribe_status();
            store.apply(trade_with(TradeStatus::Cancelled)).await.unwrap();
            assert_eq!(*rx.borrow(), Some(TradeStatus::Cancelled));
        }
    }

    mod expiry {
        use super::*;

        #[tokio::test]
        async fn expires_once() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Pending),
                EventBus::default(),
            );
            let at = Timestamp::now();
            assert!(store.mark_expired(at).await);
            assert!(!store.mark_expired(at).await);
            assert!(store.is_expired().await);
        }

        #[tokio::test]
        async fn terminal_trade_never_expires() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Completed),
                EventBus::default(),
            );
            assert!(!store.mark_expired(Timestamp::now()).await);
        }

        #[tokio::test]
        async fn unloaded_trade_never_expires() {
            let store = TradeSessionStore::new(TradeId::new("s-1"), EventBus::default());
            assert!(!store.mark_expired(Timestamp::now()).await);
        }
    }

    mod intent {
        use super::*;

        #[tokio::test]
        async fn rejected_on_terminal() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Failed),
                EventBus::default(),
            );
            assert!(store.begin_intent(PendingIntent::Cancel).await.is_err());
        }

        #[tokio::test]
        async fn recorded_and_cleared() {
            let store = TradeSessionStore::seeded(
                trade_with(TradeStatus::Accepted),
                EventBus::default(),
            );
            store
                .begin_intent(PendingIntent::MarkPaymentSent)
                .await
                .unwrap();
            assert_eq!(
                store.snapshot().await.intent,
                Some(PendingIntent::MarkPaymentSent)
            );
            store.end_intent().await;
            assert!(store.snapshot().await.intent.is_none());
        }
    }
}
