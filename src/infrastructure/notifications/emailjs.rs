//! # EmailJS Notification Sink
//!
//! Delivers [`TradeNotification`]s through the EmailJS REST endpoint using
//! a single trade-status template.
//!
//! ```text
//! POST {endpoint}
//! { "service_id", "template_id", "user_id", "template_params": {...} }
//! ```
//!
//! Amounts are rendered with two decimals. Swap, cancellation, CTA and
//! admin fields are only present when they apply. A non-2xx answer is an
//! error carrying the response text.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::NotificationSink;
use crate::application::services::notification::TradeNotification;
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::debug;

/// Public EmailJS send endpoint.
pub const EMAILJS_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// CTA text used when a notification does not name one.
pub const DEFAULT_CTA_TEXT: &str = "View Trade";

/// EmailJS account settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailJsConfig {
    /// Send endpoint.
    pub endpoint: String,
    /// EmailJS service id.
    pub service_id: String,
    /// Trade-status template id.
    pub template_id: String,
    /// Account public key, sent as `user_id`.
    pub public_key: String,
    /// Web app origin prefixed to CTA routes.
    pub website_link: String,
    /// Request timeout in milliseconds; 0 keeps the transport default.
    pub timeout_ms: u64,
}

impl Default for EmailJsConfig {
    fn default() -> Self {
        Self {
            endpoint: EMAILJS_ENDPOINT.to_string(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            website_link: "http://localhost:5173".to_string(),
            timeout_ms: 0,
        }
    }
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: Map<String, Value>,
}

/// EmailJS-backed [`NotificationSink`].
#[derive(Debug, Clone)]
pub struct EmailJsSink {
    http: reqwest::Client,
    config: EmailJsConfig,
}

impl EmailJsSink {
    /// Creates the sink.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the HTTP client cannot be built.
    pub fn new(config: EmailJsConfig) -> ApplicationResult<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let http = builder
            .build()
            .map_err(|e| ApplicationError::internal(format!("emailjs client: {e}")))?;
        Ok(Self { http, config })
    }

    /// Template parameters for `notification`.
    #[must_use]
    pub fn template_params(&self, notification: &TradeNotification) -> Map<String, Value> {
        let details = &notification.details;
        let website = self.config.website_link.trim_end_matches('/');
        let mut params = Map::new();
        let mut put = |key: &str, value: Value| {
            params.insert(key.to_string(), value);
        };

        put("to_email", Value::from(notification.recipient.as_str()));
        put("email", Value::from(notification.recipient.as_str()));
        put("website_link", Value::from(website));
        put("title", Value::from(notification.title.as_str()));
        put("message", Value::from(notification.message.as_str()));
        put("trade_id", Value::from(details.trade_id.as_str()));
        put("stock_symbol", Value::from(details.stock_symbol.as_str()));
        put("quantity", number(details.quantity.get()));
        put("price_per_share", Value::from(details.price_per_share.to_fixed2()));
        put("total_amount", Value::from(details.total_amount.to_fixed2()));
        put("status", Value::from(details.status.as_str()));

        if let Some(name) = &notification.recipient_name {
            put("to_name", Value::from(name.as_str()));
        }
        if let Some(swap) = &details.swap {
            put("is_swap_trade", Value::Bool(true));
            put("swap_stock_symbol", Value::from(swap.stock_symbol.as_str()));
            if let Some(quantity) = swap.quantity {
                put("swap_quantity", number(quantity.get()));
            }
        }
        if let Some(by) = &details.cancelled_by {
            put("cancelled_by", Value::from(by.as_str()));
        }
        if let Some(reason) = &details.cancellation_reason {
            put("cancellation_reason", Value::from(reason.as_str()));
        }
        if let Some(cta) = &notification.cta {
            put("cta_link", Value::from(format!("{website}{}", cta.route.path())));
            put(
                "cta_text",
                Value::from(cta.text.as_deref().unwrap_or(DEFAULT_CTA_TEXT)),
            );
        }
        if notification.is_admin {
            put("is_admin", Value::Bool(true));
        }
        params
    }
}

fn number(value: rust_decimal::Decimal) -> Value {
    value
        .to_f64()
        .map_or_else(|| Value::from(value.normalize().to_string()), Value::from)
}

#[async_trait]
impl NotificationSink for EmailJsSink {
    async fn send(&self, notification: &TradeNotification) -> ApplicationResult<()> {
        let body = SendRequest {
            service_id: &self.config.service_id,
            template_id: &self.config.template_id,
            user_id: &self.config.public_key,
            template_params: self.template_params(notification),
        };
        let response = self
            .http
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ApplicationError::notification(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            debug!(recipient = %notification.recipient, "emailjs accepted message");
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        let reason = if text.trim().is_empty() {
            format!("EmailJS failed with status {}", status.as_u16())
        } else {
            text
        };
        Err(ApplicationError::notification(reason))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::{Trade, TradeSwap, TradeTerms};
    use crate::domain::value_objects::{
        PaymentMethod, StockSymbol, Timestamp, TradeId, TradeRole,
    };
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn trade(swap: bool) -> Trade {
        let mut terms = TradeTerms::new(
            StockSymbol::new("AAPL").unwrap(),
            "12".parse().unwrap(),
            "50.5".parse().unwrap(),
            PaymentMethod::CashBalance,
        )
        .unwrap();
        if swap {
            terms = terms.with_swap(TradeSwap {
                stock_symbol: StockSymbol::new("MSFT").unwrap(),
                quantity: Some("3".parse().unwrap()),
            });
        }
        Trade::new(
            TradeId::new("t-9"),
            terms,
            TradeRole::Buyer,
            Timestamp::from_secs(1_700_000_000).unwrap(),
        )
    }

    fn sink(endpoint: String) -> EmailJsSink {
        EmailJsSink::new(EmailJsConfig {
            endpoint,
            service_id: "svc".to_string(),
            template_id: "tpl".to_string(),
            public_key: "pk".to_string(),
            website_link: "https://app.example/".to_string(),
            timeout_ms: 0,
        })
        .unwrap()
    }

    mod params {
        use super::*;

        #[test]
        fn amounts_have_two_decimals() {
            let n = TradeNotification::completion("s@x.io", Some("Sam"), &trade(false));
            let params = sink(EMAILJS_ENDPOINT.to_string()).template_params(&n);
            assert_eq!(params["price_per_share"], json!("50.50"));
            assert_eq!(params["total_amount"], json!("606.00"));
            assert_eq!(params["status"], json!("COMPLETED"));
            assert!(!params.contains_key("cta_link"));
            assert!(!params.contains_key("is_swap_trade"));
            assert!(!params.contains_key("is_admin"));
        }

        #[test]
        fn admin_review_has_cta_link() {
            let t = trade(false);
            let n = TradeNotification::admin_review("admin@x.io", t.id(), t.terms());
            let params = sink(EMAILJS_ENDPOINT.to_string()).template_params(&n);
            assert_eq!(params["cta_link"], json!("https://app.example/p2p/confirm/t-9"));
            assert_eq!(params["cta_text"], json!("Review Trade"));
            assert_eq!(params["is_admin"], json!(true));
        }

        #[test]
        fn cancellation_defaults_cta_text() {
            let n = TradeNotification::cancellation("admin@x.io", &trade(true), "buyer", "User cancelled");
            let params = sink(EMAILJS_ENDPOINT.to_string()).template_params(&n);
            assert_eq!(params["cta_text"], json!(DEFAULT_CTA_TEXT));
            assert_eq!(params["cancelled_by"], json!("buyer"));
            assert_eq!(params["swap_stock_symbol"], json!("MSFT"));
            assert_eq!(params["is_swap_trade"], json!(true));
        }
    }

    #[tokio::test]
    async fn posts_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/send"))
            .and(body_partial_json(json!({
                "service_id": "svc",
                "template_id": "tpl",
                "user_id": "pk",
                "template_params": {"to_email": "s@x.io", "trade_id": "t-9"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string("OK"))
            .expect(1)
            .mount(&server)
            .await;

        let n = TradeNotification::completion("s@x.io", None, &trade(false));
        sink(format!("{}/send", server.uri())).send(&n).await.unwrap();
    }

    #[tokio::test]
    async fn rejection_carries_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("The public key is invalid"))
            .mount(&server)
            .await;

        let n = TradeNotification::completion("s@x.io", None, &trade(false));
        let err = sink(server.uri()).send(&n).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "notification error: The public key is invalid"
        );
    }
}
