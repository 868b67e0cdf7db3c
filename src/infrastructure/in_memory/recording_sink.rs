//! # Recording Notification Sink
//!
//! Keeps every notification it is given. Can be switched to reject
//! deliveries to exercise the fail-open paths.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::NotificationSink;
use crate::application::services::notification::TradeNotification;
use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

/// In-memory [`NotificationSink`].
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<RwLock<Vec<TradeNotification>>>,
    attempts: Arc<RwLock<usize>>,
    failing: Arc<AtomicBool>,
}

impl RecordingSink {
    /// Sink accepting everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink rejecting everything.
    #[must_use]
    pub fn failing() -> Self {
        let sink = Self::default();
        sink.set_failing(true);
        sink
    }

    /// Switches rejection on or off.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Notifications accepted so far.
    pub async fn delivered(&self) -> Vec<TradeNotification> {
        self.delivered.read().await.clone()
    }

    /// Delivery attempts, rejected ones included.
    pub async fn attempts(&self) -> usize {
        *self.attempts.read().await
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &TradeNotification) -> ApplicationResult<()> {
        *self.attempts.write().await += 1;
        if self.failing.load(Ordering::SeqCst) {
            return Err(ApplicationError::notification("sink unreachable"));
        }
        self.delivered.write().await.push(notification.clone());
        Ok(())
    }
}
