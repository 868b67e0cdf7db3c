//! # Trade Notifications
//!
//! Payload handed to the [`NotificationSink`](crate::application::ports::NotificationSink)
//! and the constructors for each lifecycle message.
//!
//! Dispatch is always best effort: see [`dispatch_best_effort`].

use crate::application::ports::NotificationSink;
use crate::application::services::redirect::Route;
use crate::domain::entities::{Trade, TradeTerms};
use crate::domain::value_objects::{Price, Quantity, StockSymbol, TradeId};
use tracing::{info, warn};

/// Swap leg shown in a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapDetails {
    /// Stock delivered in exchange.
    pub stock_symbol: StockSymbol,
    /// Units of that stock, if known.
    pub quantity: Option<Quantity>,
}

/// Trade facts included in every notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDetails {
    /// Trade concerned.
    pub trade_id: TradeId,
    /// Traded stock.
    pub stock_symbol: StockSymbol,
    /// Traded quantity.
    pub quantity: Quantity,
    /// Price per share.
    pub price_per_share: Price,
    /// Total amount.
    pub total_amount: Price,
    /// Status label ("INITIATED", "COMPLETED", ...).
    pub status: String,
    /// Swap leg of a swap trade.
    pub swap: Option<SwapDetails>,
    /// Who cancelled.
    pub cancelled_by: Option<String>,
    /// Why it was cancelled.
    pub cancellation_reason: Option<String>,
}

impl NotificationDetails {
    fn from_terms(trade_id: &TradeId, terms: &TradeTerms, status: &str) -> Self {
        Self {
            trade_id: trade_id.clone(),
            stock_symbol: terms.stock_symbol().clone(),
            quantity: terms.quantity(),
            price_per_share: terms.price_per_share(),
            total_amount: terms.total_amount(),
            status: status.to_string(),
            swap: terms.swap().map(|s| SwapDetails {
                stock_symbol: s.stock_symbol.clone(),
                quantity: s.quantity,
            }),
            cancelled_by: None,
            cancellation_reason: None,
        }
    }
}

/// Link rendered as a button in the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallToAction {
    /// App-relative route.
    pub route: Route,
    /// Button text; the sink picks a default when `None`.
    pub text: Option<String>,
}

/// One outbound trade notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TradeNotification {
    /// Recipient address.
    pub recipient: String,
    /// Recipient display name, if known.
    pub recipient_name: Option<String>,
    /// Subject line.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Trade facts.
    pub details: NotificationDetails,
    /// Optional button.
    pub cta: Option<CallToAction>,
    /// Addressed to the operator review queue.
    pub is_admin: bool,
}

impl TradeNotification {
    /// Operator review request sent after a trade is initiated.
    #[must_use]
    pub fn admin_review(admin: &str, trade_id: &TradeId, terms: &TradeTerms) -> Self {
        Self {
            recipient: admin.to_string(),
            recipient_name: None,
            title: "New P2P Trade Initiated - Admin Review Required".to_string(),
            message: format!(
                "A new P2P trade has been initiated for {} shares of {}",
                terms.quantity(),
                terms.stock_symbol()
            ),
            details: NotificationDetails::from_terms(trade_id, terms, "INITIATED"),
            cta: Some(CallToAction {
                route: Route::Confirm(trade_id.clone()),
                text: Some("Review Trade".to_string()),
            }),
            is_admin: true,
        }
    }

    /// Completion notice for the counterparty.
    #[must_use]
    pub fn completion(recipient: &str, recipient_name: Option<&str>, trade: &Trade) -> Self {
        let terms = trade.terms();
        Self {
            recipient: recipient.to_string(),
            recipient_name: recipient_name.map(str::to_string),
            title: "P2P Trade Completed".to_string(),
            message: format!(
                "Your P2P trade for {} shares of {} has been completed successfully!",
                terms.quantity(),
                terms.stock_symbol()
            ),
            details: NotificationDetails::from_terms(trade.id(), terms, "COMPLETED"),
            cta: None,
            is_admin: false,
        }
    }

    /// Cancellation notice for the operator queue.
    #[must_use]
    pub fn cancellation(admin: &str, trade: &Trade, cancelled_by: &str, reason: &str) -> Self {
        let terms = trade.terms();
        let mut details = NotificationDetails::from_terms(trade.id(), terms, "CANCELLED");
        details.cancelled_by = Some(cancelled_by.to_string());
        details.cancellation_reason = Some(reason.to_string());
        Self {
            recipient: admin.to_string(),
            recipient_name: None,
            title: "P2P Trade Cancelled".to_string(),
            message: format!(
                "The P2P trade for {} shares of {} has been cancelled",
                terms.quantity(),
                terms.stock_symbol()
            ),
            details,
            cta: Some(CallToAction {
                route: Route::TradeView(trade.id().clone()),
                text: None,
            }),
            is_admin: true,
        }
    }
}

/// Sends `notification`, logging instead of returning failures.
///
/// Returns true if the sink accepted it.
pub async fn dispatch_best_effort(
    sink: &dyn NotificationSink,
    notification: &TradeNotification,
) -> bool {
    match sink.send(notification).await {
        Ok(()) => {
            info!(
                trade_id = %notification.details.trade_id,
                recipient = %notification.recipient,
                title = %notification.title,
                "notification sent"
            );
            true
        }
        Err(error) => {
            warn!(
                trade_id = %notification.details.trade_id,
                recipient = %notification.recipient,
                %error,
                "notification dispatch failed"
            );
            false
        }
    }
}
