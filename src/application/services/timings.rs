//! # Trade Timings
//!
//! Fixed intervals and delays of the trade lifecycle.

use std::time::Duration;

/// Timing parameters shared by the lifecycle services.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeTimings {
    /// Settlement window measured from `initiatedAt`.
    pub settlement_window: Duration,
    /// Interval between background polls.
    pub poll_interval: Duration,
    /// Countdown display tick.
    pub countdown_tick: Duration,
    /// Remaining time below which the countdown is `Expiring`.
    pub expiring_threshold: Duration,
    /// Delay before leaving a terminal trade.
    pub terminal_redirect_delay: Duration,
    /// Delay before leaving an expired trade.
    pub expiry_redirect_delay: Duration,
    /// Delay before leaving a cancelled trade.
    pub cancel_redirect_delay: Duration,
    /// Delay before opening a freshly initiated trade.
    pub initiate_redirect_delay: Duration,
}

impl Default for TradeTimings {
    fn default() -> Self {
        Self {
            settlement_window: Duration::from_secs(30 * 60),
            poll_interval: Duration::from_secs(3),
            countdown_tick: Duration::from_secs(1),
            expiring_threshold: Duration::from_secs(60),
            terminal_redirect_delay: Duration::from_secs(3),
            expiry_redirect_delay: Duration::from_secs(2),
            cancel_redirect_delay: Duration::from_millis(1500),
            initiate_redirect_delay: Duration::from_secs(2),
        }
    }
}

impl TradeTimings {
    /// Settlement window as a chrono duration.
    #[must_use]
    pub fn settlement_window_chrono(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.settlement_window).unwrap_or(chrono::Duration::MAX)
    }
}
