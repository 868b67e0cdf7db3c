//! # Confirmation Review Use Case
//!
//! Review page where the confirming party releases a trade:
//! `Reviewing → Completed | Error`.
//!
//! Completion is always preceded by funding. If the trade is still
//! `PENDING` the flow confirms payment first and only then completes; a
//! failure of either request ends the flow with an error and nothing after
//! it runs. Balance refreshes and notifications are side effects and never
//! decide the outcome.

use crate::application::error::ApplicationResult;
use crate::application::services::payment_coordinator::{COMPLETE_FAILED, CONFIRM_PAYMENT_FAILED};
use crate::application::services::{
    PaymentCoordinator, Redirect, RedirectReason, RedirectScheduler, Route, TradeSessionStore,
    TradeTimings,
};
use crate::application::use_cases::trade_view::TradeViewDeps;
use crate::domain::entities::Trade;
use crate::domain::value_objects::{TradeId, TradeStatus};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

/// State of the review page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    /// Waiting for the "Confirm Completion" click.
    Reviewing(Trade),
    /// Trade released.
    Completed(Trade),
    /// A request failed; the message is shown instead of the trade.
    Error(String),
}

impl ReviewState {
    /// Returns true once the trade is completed.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Confirmation review for one trade.
///
/// Completing the trade from this page schedules the terminal redirect
/// back to the trade list.
#[derive(Debug)]
pub struct ConfirmCompletion {
    store: Arc<TradeSessionStore>,
    coordinator: PaymentCoordinator,
    reviewed: Trade,
    state: ReviewState,
    redirects: RedirectScheduler,
    redirect_rx: mpsc::UnboundedReceiver<Redirect>,
    timings: TradeTimings,
}

impl ConfirmCompletion {
    /// Fetches the trade. A trade that is already completed opens in the
    /// completed state.
    ///
    /// The viewer may be neither buyer nor seller; an admin following the
    /// review link opens the trade as an observer.
    ///
    /// # Errors
    ///
    /// Returns the fetch error.
    pub async fn open(deps: TradeViewDeps, trade_id: TradeId) -> ApplicationResult<Self> {
        let trade = deps.api.get_trade(&trade_id).await.map_err(|err| {
            warn!(%trade_id, error = %err, "review load failed");
            err
        })?;
        let store = Arc::new(TradeSessionStore::seeded(trade.clone(), deps.bus.clone()));
        let coordinator = PaymentCoordinator::new(
            deps.api,
            deps.profiles,
            deps.notifications,
            Arc::clone(&store),
            deps.bus,
        )
        .with_confirmer(deps.confirmer)
        .with_side_effects(deps.side_effects);
        let (redirect_tx, redirect_rx) = mpsc::unbounded_channel();

        let state = if trade.status() == TradeStatus::Completed {
            ReviewState::Completed(trade.clone())
        } else {
            ReviewState::Reviewing(trade.clone())
        };
        Ok(Self {
            store,
            coordinator,
            reviewed: trade,
            state,
            redirects: RedirectScheduler::new(redirect_tx),
            redirect_rx,
            timings: deps.timings,
        })
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> &ReviewState {
        &self.state
    }

    /// The command coordinator of this page.
    #[inline]
    #[must_use]
    pub fn coordinator(&self) -> &PaymentCoordinator {
        &self.coordinator
    }

    /// Next scheduled navigation. Pending until the trade is completed
    /// from this page.
    pub async fn next_redirect(&mut self) -> Option<Redirect> {
        self.redirect_rx.recv().await
    }

    /// "Confirm Completion" button.
    #[instrument(skip(self), fields(trade_id = %self.store.trade_id()))]
    pub async fn confirm_completion(&mut self) -> &ReviewState {
        if self.state.is_completed() {
            return &self.state;
        }

        if self.store.status().await == Some(TradeStatus::Pending) {
            if let Err(err) = self.coordinator.confirm_payment().await {
                self.state = ReviewState::Error(err.user_message(CONFIRM_PAYMENT_FAILED));
                return &self.state;
            }
            info!(trade_id = %self.store.trade_id(), "payment confirmed before completion");
        }

        match self.coordinator.complete_trade().await {
            Ok(_) => {
                let mut trade = match self.store.trade().await {
                    Some(trade) => trade,
                    None => {
                        warn!(
                            trade_id = %self.store.trade_id(),
                            "session empty after completion, using reviewed trade"
                        );
                        self.reviewed.clone()
                    }
                };
                let _ = trade.observe_status(TradeStatus::Completed);
                self.state = ReviewState::Completed(trade);
                self.redirects.schedule(
                    Route::TradeList,
                    RedirectReason::Terminal,
                    self.timings.terminal_redirect_delay,
                );
            }
            Err(err) => {
                self.state = ReviewState::Error(err.user_message(COMPLETE_FAILED));
            }
        }
        &self.state
    }
}
