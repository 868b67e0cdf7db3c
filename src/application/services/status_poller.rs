//! # Trade Status Poller
//!
//! Keeps the session eventually consistent with the escrow server by
//! refetching the trade on a fixed interval while it is non-terminal.
//!
//! - The first fetch is the only "loading" fetch. Its failure is returned
//!   to the caller as a blocking error.
//! - Background fetch failures are logged at `warn` and swallowed.
//! - Once a terminal status is in the session, polling stops and a single
//!   delayed redirect to the trade list is scheduled. The scheduler is
//!   one-shot, so later observations cannot schedule a second one.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::EscrowApi;
use crate::application::services::redirect::{RedirectReason, RedirectScheduler, Route};
use crate::application::services::timings::TradeTimings;
use crate::application::services::trade_session::{Applied, TradeSessionStore};
use crate::domain::entities::Trade;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Text shown when the first load fails.
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load trade details";

/// Result of one background poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Trade still open; keep polling.
    Continue,
    /// Terminal status reached; polling is over.
    Terminal,
    /// Fetch or merge failed; logged and ignored.
    Swallowed,
}

/// Polls one trade.
#[derive(Debug, Clone)]
pub struct StatusPoller {
    api: Arc<dyn EscrowApi>,
    store: Arc<TradeSessionStore>,
    redirects: Arc<RedirectScheduler>,
    timings: TradeTimings,
}

impl StatusPoller {
    /// Creates a poller.
    #[must_use]
    pub fn new(
        api: Arc<dyn EscrowApi>,
        store: Arc<TradeSessionStore>,
        redirects: Arc<RedirectScheduler>,
        timings: TradeTimings,
    ) -> Self {
        Self {
            api,
            store,
            redirects,
            timings,
        }
    }

    /// First, blocking fetch.
    ///
    /// # Errors
    ///
    /// Returns the fetch error; the caller shows [`LOAD_FAILED_MESSAGE`].
    pub async fn load(&self) -> ApplicationResult<Trade> {
        let trade_id = self.store.trade_id().clone();
        let trade = self.api.get_trade(&trade_id).await.map_err(|err| {
            warn!(%trade_id, error = %err, "initial trade load failed");
            err
        })?;
        self.store.apply(trade).await?;
        self.redirect_if_terminal().await;
        self.store
            .trade()
            .await
            .ok_or_else(|| ApplicationError::internal("session empty after load"))
    }

    /// One background poll.
    pub async fn poll_once(&self) -> PollOutcome {
        if self.store.is_terminal().await {
            self.redirect_if_terminal().await;
            return PollOutcome::Terminal;
        }
        let trade_id = self.store.trade_id();
        let observed = match self.api.get_trade(trade_id).await {
            Ok(trade) => trade,
            Err(err) => {
                warn!(%trade_id, error = %err, "background poll failed");
                return PollOutcome::Swallowed;
            }
        };
        match self.store.apply(observed).await {
            Ok(Applied::Observed(outcome)) if outcome.is_advanced() => {
                debug!(%trade_id, ?outcome, "poll advanced trade");
            }
            Ok(_) => {}
            Err(err) => {
                warn!(%trade_id, error = %err, "poll observation discarded");
                return PollOutcome::Swallowed;
            }
        }
        if self.redirect_if_terminal().await {
            PollOutcome::Terminal
        } else {
            PollOutcome::Continue
        }
    }

    /// Schedules the terminal redirect if the session is terminal.
    async fn redirect_if_terminal(&self) -> bool {
        let Some(status) = self.store.status().await else {
            return false;
        };
        if !status.is_terminal() {
            return false;
        }
        if self.redirects.schedule(
            Route::TradeList,
            RedirectReason::Terminal,
            self.timings.terminal_redirect_delay,
        ) {
            info!(trade_id = %self.store.trade_id(), %status, "terminal status, leaving trade view");
        }
        true
    }

    /// Spawns the polling loop; the first tick fires one interval from now.
    #[must_use]
    pub fn spawn(self) -> JoinHandle<()> {
        let mut status_rx = self.store.subscribe_status();
        tokio::spawn(async move {
            let period = self.timings.poll_interval;
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if self.poll_once().await == PollOutcome::Terminal {
                            break;
                        }
                    }
                    changed = status_rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let terminal = status_rx
                            .borrow_and_update()
                            .is_some_and(|s| s.is_terminal());
                        if terminal {
                            self.redirect_if_terminal().await;
                            break;
                        }
                    }
                }
            }
            debug!(trade_id = %self.store.trade_id(), "polling stopped");
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::application::ports::{Clock, TokioClock};
    use crate::application::services::event_bus::EventBus;
    use crate::domain::entities::TradeTerms;
    use crate::domain::value_objects::{
        PaymentMethod, StockSymbol, Timestamp, TradeId, TradeRole, TradeStatus,
    };
    use crate::infrastructure::in_memory::{EscrowOp, InMemoryEscrow};
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct Fixture {
        server: InMemoryEscrow,
        poller: StatusPoller,
        store: Arc<TradeSessionStore>,
        redirect_rx: mpsc::UnboundedReceiver<crate::application::services::redirect::Redirect>,
        trade_id: TradeId,
    }

    async fn fixture(status: TradeStatus) -> Fixture {
        let clock: Arc<dyn Clock> = Arc::new(TokioClock::starting_at(
            Timestamp::from_secs(1_700_000_000).unwrap(),
        ));
        let server = InMemoryEscrow::new(Arc::clone(&clock));
        let trade_id = TradeId::new("t-1");
        let mut trade = Trade::new(
            trade_id.clone(),
            TradeTerms::new(
                StockSymbol::new("AAPL").unwrap(),
                "10".parse().unwrap(),
                "50".parse().unwrap(),
                PaymentMethod::CashBalance,
            )
            .unwrap(),
            TradeRole::Buyer,
            clock.now(),
        );
        if status != TradeStatus::Pending {
            trade.transition_to(status).unwrap();
        }
        server.insert_trade(trade).await;

        let store = Arc::new(TradeSessionStore::new(trade_id.clone(), EventBus::default()));
        let (tx, redirect_rx) = mpsc::unbounded_channel();
        let poller = StatusPoller::new(
            Arc::new(server.clone()),
            Arc::clone(&store),
            Arc::new(RedirectScheduler::new(tx)),
            TradeTimings::default(),
        );
        Fixture {
            server,
            poller,
            store,
            redirect_rx,
            trade_id,
        }
    }

    mod load {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn fills_session() {
            let f = fixture(TradeStatus::Accepted).await;
            let trade = f.poller.load().await.unwrap();
            assert_eq!(trade.status(), TradeStatus::Accepted);
            assert_eq!(f.store.status().await, Some(TradeStatus::Accepted));
        }

        #[tokio::test(start_paused = true)]
        async fn failure_is_returned() {
            let f = fixture(TradeStatus::Pending).await;
            f.server
                .fail_next(EscrowOp::GetTrade, ApplicationError::transport("offline"))
                .await;
            assert!(matches!(
                f.poller.load().await,
                Err(ApplicationError::Transport(_))
            ));
            assert!(f.store.trade().await.is_none());
        }

        #[tokio::test(start_paused = true)]
        async fn terminal_trade_schedules_redirect() {
            let mut f = fixture(TradeStatus::Completed).await;
            f.poller.load().await.unwrap();
            let redirect = f.redirect_rx.recv().await.unwrap();
            assert_eq!(redirect.route, Route::TradeList);
            assert_eq!(redirect.reason, RedirectReason::Terminal);
        }
    }

    mod poll_once {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn continues_while_open() {
            let f = fixture(TradeStatus::Pending).await;
            f.poller.load().await.unwrap();
            f.server
                .advance(&f.trade_id, TradeStatus::Accepted)
                .await
                .unwrap();
            assert_eq!(f.poller.poll_once().await, PollOutcome::Continue);
            assert_eq!(f.store.status().await, Some(TradeStatus::Accepted));
        }

        #[tokio::test(start_paused = true)]
        async fn failure_is_swallowed() {
            let f = fixture(TradeStatus::Pending).await;
            f.poller.load().await.unwrap();
            f.server
                .fail_next(
                    EscrowOp::GetTrade,
                    ApplicationError::api(500, Some("boom".to_string())),
                )
                .await;
            assert_eq!(f.poller.poll_once().await, PollOutcome::Swallowed);
            assert_eq!(f.store.status().await, Some(TradeStatus::Pending));
        }

        #[tokio::test(start_paused = true)]
        async fn terminal_redirects_once() {
            let mut f = fixture(TradeStatus::Accepted).await;
            f.poller.load().await.unwrap();
            f.server
                .advance(&f.trade_id, TradeStatus::Completed)
                .await
                .unwrap();

            assert_eq!(f.poller.poll_once().await, PollOutcome::Terminal);
            assert_eq!(f.poller.poll_once().await, PollOutcome::Terminal);
            assert_eq!(f.server.call_count(EscrowOp::GetTrade).await, 2);

            f.redirect_rx.recv().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            assert!(f.redirect_rx.try_recv().is_err());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn loop_stops_at_terminal() {
        let mut f = fixture(TradeStatus::Pending).await;
        f.poller.load().await.unwrap();
        let handle = f.poller.clone().spawn();

        tokio::time::sleep(Duration::from_millis(3_100)).await;
        f.server
            .advance(&f.trade_id, TradeStatus::Accepted)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(f.store.status().await, Some(TradeStatus::Accepted));

        f.server
            .advance(&f.trade_id, TradeStatus::Cancelled)
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(handle.is_finished());

        let polls = f.server.call_count(EscrowOp::GetTrade).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(f.server.call_count(EscrowOp::GetTrade).await, polls);

        let redirect = f.redirect_rx.recv().await.unwrap();
        assert_eq!(redirect.reason, RedirectReason::Terminal);
        assert!(f.redirect_rx.try_recv().is_err());
    }
}
