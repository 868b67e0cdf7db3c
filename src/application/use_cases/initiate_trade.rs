//! # Initiate Trade Use Case
//!
//! Submits a validated negotiation form to the escrow server.
//!
//! Initiation succeeds exactly when the server accepts the command. The
//! admin review notice that follows is spawned as a side effect and cannot
//! turn a success into a failure.

use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::{EscrowApi, NotificationSink};
use crate::application::services::{
    ActionGuard, AppEvent, EventBus, NegotiationForm, Notice, Route, SideEffects,
    TradeNotification, TradeTimings, dispatch_best_effort,
};
use crate::domain::entities::Trade;
use crate::domain::events::TradeInitiated;
use crate::domain::value_objects::TradeId;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Toast after a successful initiation.
pub const INITIATE_OK: &str = "Trade initiated successfully! Redirecting...";
/// Toast after a failed initiation without server message.
pub const INITIATE_FAILED: &str = "Failed to initiate trade. Please try again.";

/// Accepted initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiationOutcome {
    /// Id of the trade created by the server.
    pub trade_id: TradeId,
    /// The created trade, when the server returned all of it.
    pub trade: Option<Trade>,
    /// Where to go next.
    pub redirect: Route,
    /// Delay before going there.
    pub redirect_after: Duration,
    /// Toast to show.
    pub notice: Notice,
}

/// Use case for creating a trade from an offer.
#[derive(Debug, Clone)]
pub struct InitiateTradeUseCase {
    api: Arc<dyn EscrowApi>,
    notifications: Arc<dyn NotificationSink>,
    bus: EventBus,
    side_effects: SideEffects,
    guard: ActionGuard,
    admin_recipient: Option<String>,
    timings: TradeTimings,
}

impl InitiateTradeUseCase {
    /// Creates the use case.
    #[must_use]
    pub fn new(
        api: Arc<dyn EscrowApi>,
        notifications: Arc<dyn NotificationSink>,
        bus: EventBus,
        timings: TradeTimings,
    ) -> Self {
        Self {
            api,
            notifications,
            bus,
            side_effects: SideEffects::new(),
            guard: ActionGuard::new(),
            admin_recipient: None,
            timings,
        }
    }

    /// Sends the admin review notice to `admin`.
    #[must_use]
    pub fn with_admin_recipient(mut self, admin: Option<String>) -> Self {
        self.admin_recipient = admin;
        self
    }

    /// Collects side effects in `side_effects`.
    #[must_use]
    pub fn with_side_effects(mut self, side_effects: SideEffects) -> Self {
        self.side_effects = side_effects;
        self
    }

    /// Submit-button guard.
    #[inline]
    #[must_use]
    pub fn guard(&self) -> &ActionGuard {
        &self.guard
    }

    /// Validates `form` and submits it.
    ///
    /// The form is only read, so it stays editable after a failure.
    ///
    /// # Errors
    ///
    /// - a validation error, before any request is made
    /// - `ActionInFlight` while a submission is pending
    /// - the server or transport error of the request
    #[instrument(skip_all, fields(offer_id = %form.offer().id()))]
    pub async fn execute(&self, form: &NegotiationForm) -> ApplicationResult<InitiationOutcome> {
        let request = form.validate()?;
        let _permit = self
            .guard
            .try_acquire()
            .ok_or_else(|| ApplicationError::ActionInFlight("initiate".to_string()))?;

        let created = self.api.initiate_trade(&request).await.map_err(|err| {
            warn!(error = %err, "trade initiation rejected");
            err
        })?;
        let trade_id = created.id;
        info!(%trade_id, %request, "trade initiated");

        let offer = form.offer();
        self.bus.publish(AppEvent::TradeInitiated(TradeInitiated::new(
            trade_id.clone(),
            offer.stock_symbol().clone(),
            request.quantity,
        )));

        if let Some(admin) = &self.admin_recipient {
            // Terms come from the offer and the submitted form; the server
            // may return nothing but the trade id.
            match offer.trade_terms(request.quantity, request.payment_method.clone()) {
                Ok(terms) => {
                    let notification = TradeNotification::admin_review(admin, &trade_id, &terms);
                    let sink = Arc::clone(&self.notifications);
                    self.side_effects
                        .spawn(async move {
                            dispatch_best_effort(sink.as_ref(), &notification).await;
                        })
                        .await;
                }
                Err(err) => warn!(%trade_id, error = %err, "admin review notice skipped"),
            }
        }

        Ok(InitiationOutcome {
            redirect: Route::TradeView(trade_id.clone()),
            redirect_after: self.timings.initiate_redirect_delay,
            notice: Notice::success(INITIATE_OK),
            trade_id,
            trade: created.trade,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::Offer;
    use crate::domain::value_objects::{OfferId, OfferType, PaymentMethod, StockSymbol};
    use crate::infrastructure::http::{HttpClient, HttpClientConfig, RestEscrowApi};
    use crate::infrastructure::in_memory::{EscrowOp, InMemoryEscrow, RecordingSink};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(sink: RecordingSink) -> (InMemoryEscrow, InitiateTradeUseCase, Offer) {
        let offer = Offer::builder(
            OfferId::new("o-7"),
            OfferType::Sell,
            StockSymbol::new("AAPL").unwrap(),
            "10".parse().unwrap(),
            "100".parse().unwrap(),
            "50".parse().unwrap(),
        )
        .payment_methods([PaymentMethod::CashBalance, PaymentMethod::Crypto])
        .build()
        .unwrap();
        let server = InMemoryEscrow::default();
        server.add_offer(offer.clone()).await;
        let use_case = InitiateTradeUseCase::new(
            Arc::new(server.clone()),
            Arc::new(sink),
            EventBus::default(),
            TradeTimings::default(),
        )
        .with_admin_recipient(Some("admin@tradehub.com".to_string()));
        (server, use_case, offer)
    }

    #[tokio::test]
    async fn out_of_range_never_reaches_server() {
        let (server, use_case, offer) = setup(RecordingSink::new()).await;
        let mut form = NegotiationForm::new(offer);
        form.set_quantity_input("200");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();

        let err = use_case.execute(&form).await.unwrap_err();
        assert_eq!(
            err.user_message(INITIATE_FAILED),
            "Quantity must be between 10 and 100 shares"
        );
        assert_eq!(server.call_count(EscrowOp::Initiate).await, 0);
        assert_eq!(form.quantity_input(), "200");
    }

    #[tokio::test]
    async fn success_redirects_to_trade_and_notifies_admin() {
        let sink = RecordingSink::new();
        let (_server, use_case, offer) = setup(sink.clone()).await;
        let mut form = NegotiationForm::new(offer);
        form.set_quantity_input("12");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();

        let outcome = use_case.execute(&form).await.unwrap();
        assert_eq!(outcome.redirect, Route::TradeView(outcome.trade_id.clone()));
        assert_eq!(outcome.redirect_after, Duration::from_secs(2));

        use_case.side_effects.settled().await;
        let sent = sink.delivered().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "admin@tradehub.com");
        assert!(sent[0].is_admin);
    }

    #[tokio::test]
    async fn id_only_response_still_succeeds() {
        let sink = RecordingSink::new();
        let (_server, use_case, offer) = setup(sink.clone()).await;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/p2p/trades/initiate"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"trade": {"_id": "t-9"}})),
            )
            .expect(1)
            .mount(&server)
            .await;
        let rest = RestEscrowApi::new(HttpClient::new(HttpClientConfig::new(server.uri())).unwrap());
        let use_case = InitiateTradeUseCase {
            api: Arc::new(rest),
            ..use_case
        };
        let mut form = NegotiationForm::new(offer);
        form.set_quantity_input("12");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();

        let outcome = use_case.execute(&form).await.unwrap();
        assert_eq!(outcome.trade_id, TradeId::new("t-9"));
        assert!(outcome.trade.is_none());
        assert_eq!(outcome.redirect, Route::TradeView(TradeId::new("t-9")));

        use_case.side_effects.settled().await;
        let sent = sink.delivered().await;
        assert_eq!(sent.len(), 1);
        assert!(sent[0].is_admin);
        assert_eq!(sent[0].details.trade_id, TradeId::new("t-9"));
        assert_eq!(sent[0].details.total_amount, "600".parse().unwrap());
    }

    #[tokio::test]
    async fn admin_notice_failure_keeps_success() {
        let sink = RecordingSink::failing();
        let (_server, use_case, offer) = setup(sink.clone()).await;
        let mut form = NegotiationForm::new(offer);
        form.set_quantity_input("10");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();

        assert!(use_case.execute(&form).await.is_ok());
        use_case.side_effects.settled().await;
        assert_eq!(sink.attempts().await, 1);
    }

    #[tokio::test]
    async fn server_message_is_surfaced() {
        let (server, use_case, offer) = setup(RecordingSink::new()).await;
        server
            .fail_next(
                EscrowOp::Initiate,
                ApplicationError::api(409, Some("Offer no longer available".to_string())),
            )
            .await;
        let mut form = NegotiationForm::new(offer);
        form.set_quantity_input("10");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();

        let err = use_case.execute(&form).await.unwrap_err();
        assert_eq!(err.user_message(INITIATE_FAILED), "Offer no longer available");
        assert!(!use_case.guard().is_busy());
    }
}
