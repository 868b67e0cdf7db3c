//! # Logging Notification Sink
//!
//! Writes notifications to the log instead of sending them. Used when
//! email delivery is disabled.

use crate::application::error::ApplicationResult;
use crate::application::ports::NotificationSink;
use crate::application::services::notification::TradeNotification;
use async_trait::async_trait;
use tracing::info;

/// [`NotificationSink`] that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingSink;

#[async_trait]
impl NotificationSink for LoggingSink {
    async fn send(&self, notification: &TradeNotification) -> ApplicationResult<()> {
        info!(
            recipient = %notification.recipient,
            trade_id = %notification.details.trade_id,
            status = %notification.details.status,
            admin = notification.is_admin,
            title = %notification.title,
            "notification (not delivered)"
        );
        Ok(())
    }
}
