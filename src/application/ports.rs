//! # Ports
//!
//! Traits the application layer drives. Infrastructure provides the
//! adapters: a REST client for the escrow server, an EmailJS sink, and
//! in-memory doubles.

use crate::application::dto::{
    CompletionParties, InitiateTradeRequest, InitiatedTrade, OfferFilter, OfferPage,
};
use crate::application::error::ApplicationResult;
use crate::application::services::notification::TradeNotification;
use crate::domain::entities::{Offer, Trade, UserProfile};
use crate::domain::value_objects::{OfferId, Timestamp, TradeId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;

/// Commands and queries against the escrow server.
#[async_trait]
pub trait EscrowApi: Send + Sync + fmt::Debug {
    /// Creates a trade from an offer.
    async fn initiate_trade(&self, request: &InitiateTradeRequest)
    -> ApplicationResult<InitiatedTrade>;

    /// Fetches the current state of a trade.
    async fn get_trade(&self, id: &TradeId) -> ApplicationResult<Trade>;

    /// Buyer funds escrow (cash debit or asset lock).
    async fn confirm_payment(&self, id: &TradeId) -> ApplicationResult<()>;

    /// Buyer reports an external payment as sent.
    async fn mark_payment_sent(&self, id: &TradeId) -> ApplicationResult<()>;

    /// Releases escrow and settles the trade.
    async fn complete_trade(&self, id: &TradeId) -> ApplicationResult<CompletionParties>;

    /// Cancels a non-terminal trade.
    async fn cancel_trade(&self, id: &TradeId, reason: &str) -> ApplicationResult<()>;
}

/// Read-only access to the offer catalog.
#[async_trait]
pub trait OfferCatalog: Send + Sync + fmt::Debug {
    /// Lists one page of offers.
    async fn list_offers(&self, filter: &OfferFilter) -> ApplicationResult<OfferPage>;

    /// Fetches one offer.
    async fn get_offer(&self, id: &OfferId) -> ApplicationResult<Offer>;
}

/// Access to the signed-in user's profile.
#[async_trait]
pub trait ProfileApi: Send + Sync + fmt::Debug {
    /// Fetches the profile, balance included.
    async fn get_profile(&self) -> ApplicationResult<UserProfile>;
}

/// Outbound notification delivery (email).
#[async_trait]
pub trait NotificationSink: Send + Sync + fmt::Debug {
    /// Delivers one notification.
    async fn send(&self, notification: &TradeNotification) -> ApplicationResult<()>;
}

/// Asks the user to confirm a destructive action.
#[async_trait]
pub trait Confirmer: Send + Sync + fmt::Debug {
    /// Returns true if the user accepted `prompt`.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmer that accepts every prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Source of wall-clock time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant.
    fn now(&self) -> Timestamp;
}

/// The system wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::now()
    }
}

/// Wall clock driven by tokio's timer.
///
/// Starts at a fixed instant and advances with `tokio::time`, so a paused
/// runtime moves it deterministically.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    /// Clock reading `start` now.
    #[must_use]
    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            base: start.as_datetime(),
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Timestamp {
        let elapsed = chrono::Duration::from_std(self.started.elapsed())
            .unwrap_or(chrono::Duration::zero());
        Timestamp::from_datetime(self.base).saturating_add(elapsed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let start = Timestamp::from_secs(1_700_000_000).unwrap();
        let clock = TokioClock::starting_at(start);
        assert_eq!(clock.now(), start);
        tokio::time::sleep(Duration::from_secs(90)).await;
        assert_eq!(clock.now().signed_duration_since(start).num_seconds(), 90);
    }

    #[tokio::test]
    async fn auto_confirm_accepts() {
        assert!(AutoConfirm.confirm("Are you sure?").await);
    }
}
