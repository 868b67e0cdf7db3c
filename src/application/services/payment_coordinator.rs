//! # Escrow Payment Coordinator
//!
//! Drives the four trade commands: confirm payment, mark payment sent,
//! complete, cancel.
//!
//! Every command follows the same discipline:
//!
//! 1. Take the view's [`ActionGuard`] permit; a second command while one is
//!    in flight is refused locally.
//! 2. Record the pending intent in the session.
//! 3. Issue the request. Its result is the command's result (fail closed).
//! 4. Refetch the trade and apply the authoritative observation, whether
//!    the request succeeded or not. A failed refetch is only logged.
//! 5. Spawn secondary effects (balance refresh, notifications). They are
//!    never awaited and their failures are only logged (fail open).
//!
//! The permit is released on drop, so the controls re-enable on every path.

use crate::application::dto::CompletionParties;
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::{AutoConfirm, Confirmer, EscrowApi, NotificationSink, ProfileApi};
use crate::application::services::action_guard::ActionGuard;
use crate::application::services::event_bus::{AppEvent, EventBus};
use crate::application::services::notification::{TradeNotification, dispatch_best_effort};
use crate::application::services::redirect::{RedirectReason, RedirectScheduler, Route};
use crate::application::services::side_effects::SideEffects;
use crate::application::services::trade_session::{PendingIntent, TradeSessionStore};
use crate::domain::events::BalanceUpdated;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Toast after a successful confirm-payment.
pub const CONFIRM_PAYMENT_OK: &str = "Payment confirmed! Funds/stocks deducted.";
/// Toast after a failed confirm-payment without server message.
pub const CONFIRM_PAYMENT_FAILED: &str = "Failed to confirm payment. Please try again.";
/// Toast after a successful payment-sent.
pub const MARK_SENT_OK: &str = "Payment marked as sent. Waiting for seller confirmation.";
/// Toast after a failed payment-sent without server message.
pub const MARK_SENT_FAILED: &str = "Failed to update payment status.";
/// Toast after a failed completion without server message.
pub const COMPLETE_FAILED: &str = "Failed to complete trade";
/// Cancellation confirmation prompt.
pub const CANCEL_PROMPT: &str = "Are you sure you want to cancel this trade?";
/// Reason sent with a user cancellation.
pub const CANCEL_REASON: &str = "User cancelled";
/// Toast after a successful cancellation.
pub const CANCEL_OK: &str = "Trade cancelled successfully.";
/// Toast after a failed cancellation without server message.
pub const CANCEL_FAILED: &str = "Failed to cancel trade.";

/// Result of a cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The server accepted the cancellation.
    Cancelled,
    /// The user declined the confirmation prompt; nothing was sent.
    Declined,
}

/// Issues trade commands for one session.
#[derive(Debug, Clone)]
pub struct PaymentCoordinator {
    api: Arc<dyn EscrowApi>,
    profiles: Arc<dyn ProfileApi>,
    notifications: Arc<dyn NotificationSink>,
    confirmer: Arc<dyn Confirmer>,
    store: Arc<TradeSessionStore>,
    guard: ActionGuard,
    bus: EventBus,
    side_effects: SideEffects,
    admin_recipient: Option<String>,
    cancel_redirect: Option<(Arc<RedirectScheduler>, Duration)>,
}

impl PaymentCoordinator {
    /// Creates a coordinator that confirms every prompt automatically and
    /// sends no admin notices.
    #[must_use]
    pub fn new(
        api: Arc<dyn EscrowApi>,
        profiles: Arc<dyn ProfileApi>,
        notifications: Arc<dyn NotificationSink>,
        store: Arc<TradeSessionStore>,
        bus: EventBus,
    ) -> Self {
        Self {
            api,
            profiles,
            notifications,
            confirmer: Arc::new(AutoConfirm),
            store,
            guard: ActionGuard::new(),
            bus,
            side_effects: SideEffects::new(),
            admin_recipient: None,
            cancel_redirect: None,
        }
    }

    /// Uses `confirmer` for destructive prompts.
    #[must_use]
    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    /// Shares an existing in-flight guard.
    #[must_use]
    pub fn with_guard(mut self, guard: ActionGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Collects side effects in `side_effects`.
    #[must_use]
    pub fn with_side_effects(mut self, side_effects: SideEffects) -> Self {
        self.side_effects = side_effects;
        self
    }

    /// Sends cancellation notices to `admin`.
    #[must_use]
    pub fn with_admin_recipient(mut self, admin: Option<String>) -> Self {
        self.admin_recipient = admin;
        self
    }

    /// Leaves the trade view `delay` after a successful cancellation.
    #[must_use]
    pub fn with_cancel_redirect(mut self, redirects: Arc<RedirectScheduler>, delay: Duration) -> Self {
        self.cancel_redirect = Some((redirects, delay));
        self
    }

    /// The in-flight guard.
    #[inline]
    #[must_use]
    pub fn guard(&self) -> &ActionGuard {
        &self.guard
    }

    /// The side-effect set.
    #[inline]
    #[must_use]
    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    // ========== Commands ==========

    /// Buyer funds escrow.
    ///
    /// On success the user's balance is re-read in the background and
    /// broadcast as [`BalanceUpdated`].
    ///
    /// # Errors
    ///
    /// - `ActionInFlight` while another command runs
    /// - `InvalidState` for an unloaded or terminal trade
    /// - the server or transport error of the request
    #[instrument(skip(self), fields(trade_id = %self.store.trade_id()))]
    pub async fn confirm_payment(&self) -> ApplicationResult<()> {
        let id = self.store.trade_id().clone();
        self.run(PendingIntent::ConfirmPayment, || self.api.confirm_payment(&id))
            .await?;
        self.spawn_balance_refresh().await;
        Ok(())
    }

    /// Buyer reports an external payment as sent.
    ///
    /// # Errors
    ///
    /// Same as [`confirm_payment`](Self::confirm_payment).
    #[instrument(skip(self), fields(trade_id = %self.store.trade_id()))]
    pub async fn mark_payment_sent(&self) -> ApplicationResult<()> {
        let id = self.store.trade_id().clone();
        self.run(PendingIntent::MarkPaymentSent, || {
            self.api.mark_payment_sent(&id)
        })
        .await
    }

    /// Releases escrow.
    ///
    /// On success the counterparty is notified in the background. The
    /// recipient comes from the completion response: the seller when the
    /// completing user is the buyer, the buyer otherwise.
    ///
    /// # Errors
    ///
    /// Same as [`confirm_payment`](Self::confirm_payment).
    #[instrument(skip(self), fields(trade_id = %self.store.trade_id()))]
    pub async fn complete_trade(&self) -> ApplicationResult<CompletionParties> {
        let id = self.store.trade_id().clone();
        let before = self.store.trade().await;
        let parties = self
            .run(PendingIntent::Complete, || self.api.complete_trade(&id))
            .await?;

        if let Some(trade) = before {
            let (email, name) = parties.counterparty(trade.user_is_buyer());
            match email.filter(|e| !e.trim().is_empty()) {
                Some(email) => {
                    let notification = TradeNotification::completion(email, name, &trade);
                    self.spawn_notification(notification).await;
                }
                None => warn!(trade_id = %id, "completion response carries no counterparty email"),
            }
        }
        Ok(parties)
    }

    /// Cancels the trade after the user confirms [`CANCEL_PROMPT`].
    ///
    /// # Errors
    ///
    /// Same as [`confirm_payment`](Self::confirm_payment). Declining the
    /// prompt is not an error.
    #[instrument(skip(self), fields(trade_id = %self.store.trade_id()))]
    pub async fn cancel_trade(&self, reason: &str) -> ApplicationResult<CancelOutcome> {
        if self.guard.is_busy() {
            return Err(ApplicationError::ActionInFlight(PendingIntent::Cancel.to_string()));
        }
        if !self.confirmer.confirm(CANCEL_PROMPT).await {
            info!(trade_id = %self.store.trade_id(), "cancellation declined");
            return Ok(CancelOutcome::Declined);
        }

        let id = self.store.trade_id().clone();
        let before = self.store.trade().await;
        self.run(PendingIntent::Cancel, || async {
            self.api.cancel_trade(&id, reason).await?;
            if let Some((redirects, delay)) = &self.cancel_redirect {
                redirects.schedule(Route::TradeList, RedirectReason::Cancelled, *delay);
            }
            Ok(())
        })
        .await?;

        if let (Some(admin), Some(trade)) = (&self.admin_recipient, before) {
            let cancelled_by = trade.role().to_string();
            let notification =
                TradeNotification::cancellation(admin, &trade, &cancelled_by, reason);
            self.spawn_notification(notification).await;
        }
        Ok(CancelOutcome::Cancelled)
    }

    // ========== Internals ==========

    async fn run<T, F, Fut>(&self, intent: PendingIntent, call: F) -> ApplicationResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApplicationResult<T>>,
    {
        let _permit = self
            .guard
            .try_acquire()
            .ok_or_else(|| ApplicationError::ActionInFlight(intent.to_string()))?;
        self.store.begin_intent(intent).await?;

        let result = call().await;
        self.store.end_intent().await;
        match &result {
            Ok(_) => info!(trade_id = %self.store.trade_id(), %intent, "command accepted"),
            Err(err) => warn!(trade_id = %self.store.trade_id(), %intent, error = %err, "command failed"),
        }
        self.refresh().await;
        result
    }

    /// Refetches the trade and applies it; failures are logged.
    pub async fn refresh(&self) {
        let id = self.store.trade_id();
        match self.api.get_trade(id).await {
            Ok(trade) => {
                if let Err(err) = self.store.apply(trade).await {
                    warn!(trade_id = %id, error = %err, "refetched trade discarded");
                }
            }
            Err(err) => warn!(trade_id = %id, error = %err, "trade refetch failed"),
        }
    }

    async fn spawn_balance_refresh(&self) {
        let profiles = Arc::clone(&self.profiles);
        let bus = self.bus.clone();
        let trade_id = self.store.trade_id().clone();
        self.side_effects
            .spawn(async move {
                match profiles.get_profile().await {
                    Ok(user) => {
                        info!(%trade_id, balance = %user.balance, "balance refreshed");
                        bus.publish(AppEvent::BalanceUpdated(BalanceUpdated::new(user)));
                    }
                    Err(err) => warn!(%trade_id, error = %err, "balance refresh failed"),
                }
            })
            .await;
    }

    async fn spawn_notification(&self, notification: TradeNotification) {
        let sink = Arc::clone(&self.notifications);
        self.side_effects
            .spawn(async move {
                dispatch_best_effort(sink.as_ref(), &notification).await;
            })
            .await;
    }
}
