//! # Countdown / Expiry Monitor
//!
//! Remaining settlement time of a trade, derived on every tick from the
//! trade's `initiated_at` and the clock:
//!
//! ```text
//! remaining = max(0, window - (now - initiated_at))
//! ```
//!
//! Nothing is decremented or stored, so a reload or a late observation
//! always lands on the right value. Phases run `Running → Expiring → Expired`.
//!
//! The monitor stops as soon as the session holds a terminal status. A
//! terminal status observed by the poller wins over expiry, including when
//! both happen on the same tick: [`TradeSessionStore::mark_expired`] refuses
//! a terminal trade under the session's write lock.

use crate::application::ports::Clock;
use crate::application::services::notice::Notice;
use crate::application::services::redirect::{RedirectReason, RedirectScheduler, Route};
use crate::application::services::timings::TradeTimings;
use crate::application::services::trade_session::TradeSessionStore;
use crate::domain::value_objects::Timestamp;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Text shown when the window elapses.
pub const EXPIRED_MESSAGE: &str = "Trade expired. Redirecting...";

/// Countdown phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownPhase {
    /// Plenty of time left.
    Running,
    /// Inside the final warning window.
    Expiring,
    /// Window elapsed.
    Expired,
}

/// One countdown reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CountdownReading {
    /// Time left, never negative.
    pub remaining: Duration,
    /// Phase derived from `remaining`.
    pub phase: CountdownPhase,
}

impl CountdownReading {
    /// Reading for `now`.
    #[must_use]
    pub fn at(now: Timestamp, initiated_at: Timestamp, timings: &TradeTimings) -> Self {
        let remaining = remaining(now, initiated_at, timings.settlement_window);
        let phase = if remaining.is_zero() {
            CountdownPhase::Expired
        } else if remaining <= timings.expiring_threshold {
            CountdownPhase::Expiring
        } else {
            CountdownPhase::Running
        };
        Self { remaining, phase }
    }
}

impl fmt::Display for CountdownReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.remaining.as_secs();
        write!(f, "{}:{:02}", secs / 60, secs % 60)
    }
}

/// Settlement time left at `now`.
///
/// A clock behind `initiated_at` counts as no time elapsed.
#[must_use]
pub fn remaining(now: Timestamp, initiated_at: Timestamp, window: Duration) -> Duration {
    let elapsed = now
        .signed_duration_since(initiated_at)
        .to_std()
        .unwrap_or(Duration::ZERO);
    window.saturating_sub(elapsed)
}

/// Ticking countdown bound to one trade session.
#[derive(Debug)]
pub struct CountdownMonitor {
    store: Arc<TradeSessionStore>,
    clock: Arc<dyn Clock>,
    redirects: Arc<RedirectScheduler>,
    notices: mpsc::UnboundedSender<Notice>,
    timings: TradeTimings,
}

/// Running countdown.
#[derive(Debug)]
pub struct CountdownHandle {
    readings: watch::Receiver<Option<CountdownReading>>,
    task: JoinHandle<()>,
}

impl CountdownHandle {
    /// Latest reading; `None` before the trade is loaded.
    #[must_use]
    pub fn latest(&self) -> Option<CountdownReading> {
        *self.readings.borrow()
    }

    /// Receiver of readings.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<CountdownReading>> {
        self.readings.clone()
    }

    /// Returns true once the loop has stopped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stops the loop.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for CountdownHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl CountdownMonitor {
    /// Creates a monitor.
    #[must_use]
    pub fn new(
        store: Arc<TradeSessionStore>,
        clock: Arc<dyn Clock>,
        redirects: Arc<RedirectScheduler>,
        notices: mpsc::UnboundedSender<Notice>,
        timings: TradeTimings,
    ) -> Self {
        Self {
            store,
            clock,
            redirects,
            notices,
            timings,
        }
    }

    /// Reading for the current trade, `None` if it is not loaded yet.
    pub async fn read(&self) -> Option<CountdownReading> {
        let trade = self.store.trade().await?;
        Some(CountdownReading::at(
            self.clock.now(),
            trade.initiated_at(),
            &self.timings,
        ))
    }

    /// Runs one tick. Returns false once the countdown is over.
    pub async fn tick(&self, readings: &watch::Sender<Option<CountdownReading>>) -> bool {
        if self.store.is_terminal().await {
            debug!(trade_id = %self.store.trade_id(), "countdown halted on terminal status");
            return false;
        }
        let Some(trade) = self.store.trade().await else {
            return true;
        };
        let reading = CountdownReading::at(self.clock.now(), trade.initiated_at(), &self.timings);
        readings.send_replace(Some(reading));
        if reading.phase != CountdownPhase::Expired {
            return true;
        }

        let expired_at = trade.expires_at(self.timings.settlement_window_chrono());
        if self.store.mark_expired(expired_at).await {
            info!(trade_id = %trade.id(), "countdown expired");
            let _ = self.notices.send(Notice::error(EXPIRED_MESSAGE));
            self.redirects.schedule(
                Route::TradeList,
                RedirectReason::Expired,
                self.timings.expiry_redirect_delay,
            );
        }
        false
    }

    /// Spawns the tick loop.
    #[must_use]
    pub fn spawn(self) -> CountdownHandle {
        let (tx, readings) = watch::channel(None);
        let mut status_rx = self.store.subscribe_status();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.timings.countdown_tick);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !self.tick(&tx).await {
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
                            debug!(trade_id = %self.store.trade_id(), "countdown stopped by status change");
                            break;
                        }
                    }
                }
            }
        });
        CountdownHandle { readings, task }
    }
}
