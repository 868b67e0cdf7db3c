//! # Redirects
//!
//! App routes and the one-shot delayed redirect used when a trade view
//! is done (terminal status, expiry, cancellation, initiation).
//!
//! [`RedirectScheduler::schedule`] arms at most once per scheduler; later
//! calls are ignored, so repeated observations of the same terminal status
//! cannot produce a second redirect.

use crate::domain::value_objects::TradeId;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Client-side navigation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    /// Offer catalog.
    Offers,
    /// List of the user's trades.
    TradeList,
    /// One trade's live view.
    TradeView(TradeId),
    /// Completion review page.
    Confirm(TradeId),
}

impl Route {
    /// App-relative path.
    #[must_use]
    pub fn path(&self) -> String {
        match self {
            Self::Offers => "/p2p".to_string(),
            Self::TradeList => "/p2p/trades".to_string(),
            Self::TradeView(id) => format!("/p2p/trades/{id}"),
            Self::Confirm(id) => format!("/p2p/confirm/{id}"),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

/// Why a redirect was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    /// Server reported a terminal status.
    Terminal,
    /// Settlement window elapsed.
    Expired,
    /// User cancelled the trade.
    Cancelled,
    /// Trade was just created.
    Initiated,
}

/// A redirect that fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Destination.
    pub route: Route,
    /// Trigger.
    pub reason: RedirectReason,
}

/// Fires at most one delayed redirect.
#[derive(Debug)]
pub struct RedirectScheduler {
    armed: Arc<AtomicBool>,
    tx: mpsc::UnboundedSender<Redirect>,
    task: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl RedirectScheduler {
    /// Creates a scheduler delivering fired redirects to `tx`.
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<Redirect>) -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(false)),
            tx,
            task: std::sync::Mutex::new(None),
        }
    }

    /// Schedules `route` after `delay`. Returns false if already scheduled.
    pub fn schedule(&self, route: Route, reason: RedirectReason, delay: Duration) -> bool {
        if self.armed.swap(true, Ordering::AcqRel) {
            debug!(%route, ?reason, "redirect already scheduled");
            return false;
        }
        debug!(%route, ?reason, delay_ms = delay.as_millis() as u64, "redirect scheduled");
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the view was torn down.
            let _ = tx.send(Redirect { route, reason });
        });
        if let Ok(mut slot) = self.task.lock() {
            *slot = Some(handle);
        }
        true
    }

    /// Returns true once a redirect has been scheduled.
    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Aborts a pending redirect.
    pub fn cancel(&self) {
        if let Ok(mut slot) = self.task.lock()
            && let Some(handle) = slot.take()
        {
            handle.abort();
        }
    }
}

impl Drop for RedirectScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn route_paths() {
        let id = TradeId::new("abc");
        assert_eq!(Route::TradeList.path(), "/p2p/trades");
        assert_eq!(Route::TradeView(id.clone()).path(), "/p2p/trades/abc");
        assert_eq!(Route::Confirm(id).path(), "/p2p/confirm/abc");
        assert_eq!(Route::Offers.to_string(), "/p2p");
    }

    #[tokio::test(start_paused = true)]
    async fn fires_once_after_delay() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RedirectScheduler::new(tx);

        assert!(scheduler.schedule(
            Route::TradeList,
            RedirectReason::Terminal,
            Duration::from_secs(3)
        ));
        assert!(!scheduler.schedule(
            Route::TradeList,
            RedirectReason::Terminal,
            Duration::from_secs(3)
        ));

        tokio::time::sleep(Duration::from_millis(2_900)).await;
        assert!(rx.try_recv().is_err());

        let redirect = rx.recv().await.unwrap();
        assert_eq!(redirect.route, Route::TradeList);
        assert_eq!(redirect.reason, RedirectReason::Terminal);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_delivery() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = RedirectScheduler::new(tx);
        scheduler.schedule(Route::TradeList, RedirectReason::Expired, Duration::from_secs(2));
        scheduler.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(rx.try_recv().is_err());
    }
}
