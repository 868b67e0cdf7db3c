//! # Trade View Use Case
//!
//! One open trade screen: first load, background polling, the settlement
//! countdown, the buyer/seller actions and the redirect out.
//!
//! Opening a view loads the trade once. If the load fails the view is not
//! created and the caller shows [`LOAD_FAILED_MESSAGE`]. For a non-terminal
//! trade the poller and the countdown run until a terminal status is
//! observed, the window elapses, or the view is closed. Closing (or
//! dropping) the view stops both loops and any pending redirect.

use crate::application::error::ApplicationResult;
use crate::application::ports::{Clock, Confirmer, EscrowApi, NotificationSink, ProfileApi};
use crate::application::services::payment_coordinator::{
    CANCEL_FAILED, CANCEL_OK, CANCEL_REASON, CONFIRM_PAYMENT_FAILED, CONFIRM_PAYMENT_OK,
    MARK_SENT_FAILED, MARK_SENT_OK,
};
use crate::application::services::{
    CancelOutcome, CountdownHandle, CountdownMonitor, CountdownReading, EventBus, Notice,
    PaymentCoordinator, Redirect, RedirectScheduler, SideEffects, StatusPoller, TradeSessionStore,
    TradeTimings,
};
use crate::domain::entities::Trade;
use crate::domain::value_objects::{TradeId, TradeStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

pub use crate::application::services::LOAD_FAILED_MESSAGE;

/// Toast for the seller's receipt confirmation, which has no endpoint.
pub const CONFIRM_RECEIPT_UNAVAILABLE: &str = "Confirm payment receipt feature coming soon";

/// Collaborators of a trade view.
#[derive(Debug, Clone)]
pub struct TradeViewDeps {
    /// Escrow server.
    pub api: Arc<dyn EscrowApi>,
    /// Profile endpoint, for the balance refresh.
    pub profiles: Arc<dyn ProfileApi>,
    /// Email dispatch.
    pub notifications: Arc<dyn NotificationSink>,
    /// Prompt for destructive actions.
    pub confirmer: Arc<dyn Confirmer>,
    /// Wall clock of the countdown.
    pub clock: Arc<dyn Clock>,
    /// Application event bus.
    pub bus: EventBus,
    /// Set collecting fire-and-forget work.
    pub side_effects: SideEffects,
    /// Admin queue address for cancellation notices.
    pub admin_recipient: Option<String>,
    /// Lifecycle timings.
    pub timings: TradeTimings,
}

/// What the view shows. A terminal status hides the countdown and wins
/// over a locally detected expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeDisplay {
    /// Open trade with its countdown.
    Active {
        /// Current status.
        status: TradeStatus,
        /// Derived settlement countdown.
        countdown: CountdownReading,
    },
    /// Settlement window elapsed before the server reported an outcome.
    Expired,
    /// Server reported a final outcome.
    Terminal(TradeStatus),
}

/// Buttons the view offers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AvailableActions {
    /// Buyer funds a pending trade.
    pub confirm_payment: bool,
    /// Buyer reports the external payment on an accepted trade.
    pub mark_payment_sent: bool,
    /// Seller acknowledges receipt; shown but unavailable.
    pub confirm_receipt: bool,
    /// Either party cancels a non-terminal trade.
    pub cancel: bool,
    /// Seller waits for the buyer to fund.
    pub awaiting_buyer: bool,
    /// A command is in flight; every button is disabled.
    pub busy: bool,
}

impl AvailableActions {
    /// Actions for `trade`.
    #[must_use]
    pub fn for_trade(trade: &Trade, expired: bool, busy: bool) -> Self {
        if trade.is_terminal() || expired {
            return Self {
                busy,
                ..Self::default()
            };
        }
        let status = trade.status();
        let party = trade.role().is_party();
        Self {
            confirm_payment: trade.user_is_buyer() && status == TradeStatus::Pending,
            mark_payment_sent: trade.user_is_buyer() && status == TradeStatus::Accepted,
            confirm_receipt: trade.user_is_seller() && status == TradeStatus::PaymentSent,
            cancel: party,
            awaiting_buyer: party && !trade.user_is_buyer() && status == TradeStatus::Pending,
            busy,
        }
    }

    /// Returns true if any button is enabled.
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        !self.busy
            && (self.confirm_payment || self.mark_payment_sent || self.confirm_receipt || self.cancel)
    }
}

/// An open trade view.
#[derive(Debug)]
pub struct TradeView {
    store: Arc<TradeSessionStore>,
    coordinator: PaymentCoordinator,
    redirects: Arc<RedirectScheduler>,
    redirect_rx: mpsc::UnboundedReceiver<Redirect>,
    notice_rx: mpsc::UnboundedReceiver<Notice>,
    poller: Option<JoinHandle<()>>,
    countdown: Option<CountdownHandle>,
    clock: Arc<dyn Clock>,
    timings: TradeTimings,
}

impl TradeView {
    /// Loads `trade_id` and starts the background loops.
    ///
    /// # Errors
    ///
    /// Returns the first-load error; nothing keeps running in that case.
    pub async fn open(deps: TradeViewDeps, trade_id: TradeId) -> ApplicationResult<Self> {
        let TradeViewDeps {
            api,
            profiles,
            notifications,
            confirmer,
            clock,
            bus,
            side_effects,
            admin_recipient,
            timings,
        } = deps;

        let store = Arc::new(TradeSessionStore::new(trade_id, bus.clone()));
        let (redirect_tx, redirect_rx) = mpsc::unbounded_channel();
        let redirects = Arc::new(RedirectScheduler::new(redirect_tx));
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();

        let poller = StatusPoller::new(
            Arc::clone(&api),
            Arc::clone(&store),
            Arc::clone(&redirects),
            timings,
        );
        let trade = poller.load().await?;

        let coordinator = PaymentCoordinator::new(
            api,
            profiles,
            notifications,
            Arc::clone(&store),
            bus,
        )
        .with_confirmer(confirmer)
        .with_side_effects(side_effects)
        .with_admin_recipient(admin_recipient)
        .with_cancel_redirect(Arc::clone(&redirects), timings.cancel_redirect_delay);

        let (poller, countdown) = if trade.is_terminal() {
            info!(trade_id = %trade.id(), status = %trade.status(), "opened terminal trade");
            (None, None)
        } else {
            let countdown = CountdownMonitor::new(
                Arc::clone(&store),
                Arc::clone(&clock),
                Arc::clone(&redirects),
                notice_tx,
                timings,
            )
            .spawn();
            (Some(poller.spawn()), Some(countdown))
        };

        Ok(Self {
            store,
            coordinator,
            redirects,
            redirect_rx,
            notice_rx,
            poller,
            countdown,
            clock,
            timings,
        })
    }

    // ========== Reads ==========

    /// The trade id.
    #[inline]
    #[must_use]
    pub fn trade_id(&self) -> &TradeId {
        self.store.trade_id()
    }

    /// Latest known trade.
    pub async fn trade(&self) -> Option<Trade> {
        self.store.trade().await
    }

    /// Session store shared with the loops.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<TradeSessionStore> {
        &self.store
    }

    /// What to render now.
    pub async fn display(&self) -> Option<TradeDisplay> {
        let state = self.store.snapshot().await;
        let trade = state.trade?;
        if trade.is_terminal() {
            return Some(TradeDisplay::Terminal(trade.status()));
        }
        if state.expired {
            return Some(TradeDisplay::Expired);
        }
        let countdown = CountdownReading::at(self.clock.now(), trade.initiated_at(), &self.timings);
        Some(TradeDisplay::Active {
            status: trade.status(),
            countdown,
        })
    }

    /// Buttons to show now.
    pub async fn actions(&self) -> AvailableActions {
        let state = self.store.snapshot().await;
        let busy = self.coordinator.guard().is_busy();
        state.trade.map_or(
            AvailableActions {
                busy,
                ..AvailableActions::default()
            },
            |trade| AvailableActions::for_trade(&trade, state.expired, busy),
        )
    }

    /// Returns true while either background loop is running.
    #[must_use]
    pub fn is_live(&self) -> bool {
        let polling = self.poller.as_ref().is_some_and(|p| !p.is_finished());
        let counting = self.countdown.as_ref().is_some_and(|c| !c.is_finished());
        polling || counting
    }

    /// Next scheduled navigation; `None` once the view is closed.
    pub async fn next_redirect(&mut self) -> Option<Redirect> {
        self.redirect_rx.recv().await
    }

    /// Next notice raised by the background loops.
    pub async fn next_notice(&mut self) -> Option<Notice> {
        self.notice_rx.recv().await
    }

    /// Notice already queued, if any.
    pub fn try_next_notice(&mut self) -> Option<Notice> {
        self.notice_rx.try_recv().ok()
    }

    /// The command coordinator of this view.
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &PaymentCoordinator {
        &self.coordinator
    }

    // ========== Commands ==========

    /// "Confirm payment" button.
    pub async fn confirm_payment(&self) -> Notice {
        match self.coordinator.confirm_payment().await {
            Ok(()) => Notice::success(CONFIRM_PAYMENT_OK),
            Err(err) => Notice::error(err.user_message(CONFIRM_PAYMENT_FAILED)),
        }
    }

    /// "I have made payment" button.
    pub async fn mark_payment_sent(&self) -> Notice {
        match self.coordinator.mark_payment_sent().await {
            Ok(()) => Notice::success(MARK_SENT_OK),
            Err(err) => Notice::error(err.user_message(MARK_SENT_FAILED)),
        }
    }

    /// "I have received payment" button.
    #[must_use]
    pub fn confirm_receipt(&self) -> Notice {
        Notice::info(CONFIRM_RECEIPT_UNAVAILABLE)
    }

    /// "Cancel trade" button. Returns `None` if the user declined the prompt.
    pub async fn cancel(&self) -> Option<Notice> {
        match self.coordinator.cancel_trade(CANCEL_REASON).await {
            Ok(CancelOutcome::Cancelled) => Some(Notice::success(CANCEL_OK)),
            Ok(CancelOutcome::Declined) => None,
            Err(err) => Some(Notice::error(err.user_message(CANCEL_FAILED))),
        }
    }

    /// Refetches the trade outside the poll schedule.
    pub async fn refresh(&self) {
        self.coordinator.refresh().await;
    }

    // ========== Teardown ==========

    /// Stops polling, the countdown and any pending redirect.
    pub fn close(&mut self) {
        self.teardown();
        debug!(trade_id = %self.store.trade_id(), "trade view closed");
    }

    fn teardown(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
        if let Some(countdown) = self.countdown.take() {
            countdown.abort();
        }
        self.redirects.cancel();
        self.redirect_rx.close();
    }
}

impl Drop for TradeView {
    fn drop(&mut self) {
        self.teardown();
    }
}
