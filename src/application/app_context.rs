//! # Application Context
//!
//! Session-scoped wiring of ports, the event bus and timings.
//!
//! A context is built when a session starts and torn down by
//! [`AppContext::logout`]. Screens get their collaborators from it instead
//! of reaching for global state. After logout every operation fails with
//! `InvalidState` and pending side effects are aborted.

use crate::application::dto::{OfferFilter, OfferPage};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::{
    AutoConfirm, Clock, Confirmer, EscrowApi, NotificationSink, OfferCatalog, ProfileApi,
    SystemClock,
};
use crate::application::services::{
    AppEvent, EventBus, NegotiationForm, SideEffects, TradeTimings,
};
use crate::application::use_cases::{
    ConfirmCompletion, InitiateTradeUseCase, InitiationOutcome, TradeView, TradeViewDeps,
};
use crate::domain::entities::{Offer, UserProfile};
use crate::domain::events::BalanceUpdated;
use crate::domain::value_objects::{OfferId, Timestamp, TradeId};
use std::sync::Arc;
use tokio::sync::{RwLock, broadcast};
use tracing::{info, warn};

/// The signed-in session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// When the context was built.
    pub started_at: Timestamp,
    /// Last profile read, if any.
    pub user: Option<UserProfile>,
}

/// Builder for [`AppContext`].
#[derive(Debug, Default)]
pub struct AppContextBuilder {
    escrow: Option<Arc<dyn EscrowApi>>,
    catalog: Option<Arc<dyn OfferCatalog>>,
    profiles: Option<Arc<dyn ProfileApi>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    confirmer: Option<Arc<dyn Confirmer>>,
    clock: Option<Arc<dyn Clock>>,
    bus: Option<EventBus>,
    timings: TradeTimings,
    admin_recipient: Option<String>,
}

impl AppContextBuilder {
    /// Escrow server adapter.
    #[must_use]
    pub fn escrow(mut self, escrow: Arc<dyn EscrowApi>) -> Self {
        self.escrow = Some(escrow);
        self
    }

    /// Offer catalog adapter.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<dyn OfferCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Profile adapter.
    #[must_use]
    pub fn profiles(mut self, profiles: Arc<dyn ProfileApi>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    /// Notification sink.
    #[must_use]
    pub fn notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Prompt for destructive actions; defaults to [`AutoConfirm`].
    #[must_use]
    pub fn confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = Some(confirmer);
        self
    }

    /// Wall clock; defaults to [`SystemClock`].
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Event bus; a fresh one by default.
    #[must_use]
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Lifecycle timings.
    #[must_use]
    pub fn timings(mut self, timings: TradeTimings) -> Self {
        self.timings = timings;
        self
    }

    /// Admin review queue address.
    #[must_use]
    pub fn admin_recipient(mut self, admin: Option<String>) -> Self {
        self.admin_recipient = admin;
        self
    }

    /// Builds the context and opens the session.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if an adapter is missing.
    pub fn build(self) -> ApplicationResult<AppContext> {
        let missing = |what: &str| ApplicationError::internal(format!("{what} not configured"));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let session = Session {
            started_at: clock.now(),
            user: None,
        };
        Ok(AppContext {
            escrow: self.escrow.ok_or_else(|| missing("escrow api"))?,
            catalog: self.catalog.ok_or_else(|| missing("offer catalog"))?,
            profiles: self.profiles.ok_or_else(|| missing("profile api"))?,
            notifications: self
                .notifications
                .ok_or_else(|| missing("notification sink"))?,
            confirmer: self.confirmer.unwrap_or_else(|| Arc::new(AutoConfirm)),
            clock,
            bus: self.bus.unwrap_or_default(),
            timings: self.timings,
            admin_recipient: self.admin_recipient,
            side_effects: SideEffects::new(),
            session: RwLock::new(Some(session)),
        })
    }
}

/// Session-scoped application root.
#[derive(Debug)]
pub struct AppContext {
    escrow: Arc<dyn EscrowApi>,
    catalog: Arc<dyn OfferCatalog>,
    profiles: Arc<dyn ProfileApi>,
    notifications: Arc<dyn NotificationSink>,
    confirmer: Arc<dyn Confirmer>,
    clock: Arc<dyn Clock>,
    bus: EventBus,
    timings: TradeTimings,
    admin_recipient: Option<String>,
    side_effects: SideEffects,
    session: RwLock<Option<Session>>,
}

impl AppContext {
    /// Starts a builder.
    #[must_use]
    pub fn builder() -> AppContextBuilder {
        AppContextBuilder::default()
    }

    // ========== Session ==========

    /// Current session, `None` after logout.
    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Subscribes to application events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.bus.subscribe()
    }

    /// Lifecycle timings.
    #[inline]
    #[must_use]
    pub fn timings(&self) -> &TradeTimings {
        &self.timings
    }

    /// Fire-and-forget work started through this context.
    #[inline]
    #[must_use]
    pub fn side_effects(&self) -> &SideEffects {
        &self.side_effects
    }

    /// Ends the session and aborts pending side effects.
    pub async fn logout(&self) {
        let previous = self.session.write().await.take();
        self.side_effects.abort_all().await;
        if previous.is_some() {
            info!("session closed");
        }
    }

    async fn ensure_open(&self) -> ApplicationResult<()> {
        if self.session.read().await.is_some() {
            Ok(())
        } else {
            Err(ApplicationError::invalid_state("session closed"))
        }
    }

    /// Re-reads the profile and broadcasts the balance.
    ///
    /// # Errors
    ///
    /// Returns the profile fetch error, or `InvalidState` after logout.
    pub async fn refresh_balance(&self) -> ApplicationResult<UserProfile> {
        self.ensure_open().await?;
        let user = self.profiles.get_profile().await.map_err(|err| {
            warn!(error = %err, "profile refresh failed");
            err
        })?;
        if let Some(session) = self.session.write().await.as_mut() {
            session.user = Some(user.clone());
        }
        self.bus
            .publish(AppEvent::BalanceUpdated(BalanceUpdated::new(user.clone())));
        Ok(user)
    }

    // ========== Offers ==========

    /// One page of the offer catalog.
    ///
    /// # Errors
    ///
    /// Returns the catalog error, or `InvalidState` after logout.
    pub async fn list_offers(&self, filter: &OfferFilter) -> ApplicationResult<OfferPage> {
        self.ensure_open().await?;
        self.catalog.list_offers(filter).await
    }

    /// One offer.
    ///
    /// # Errors
    ///
    /// Returns the catalog error, or `InvalidState` after logout.
    pub async fn offer(&self, id: &OfferId) -> ApplicationResult<Offer> {
        self.ensure_open().await?;
        self.catalog.get_offer(id).await
    }

    /// Negotiation form for an offer.
    ///
    /// # Errors
    ///
    /// Returns the catalog error, or `InvalidState` after logout.
    pub async fn negotiate(&self, id: &OfferId) -> ApplicationResult<NegotiationForm> {
        Ok(NegotiationForm::new(self.offer(id).await?))
    }

    // ========== Trades ==========

    /// Initiation use case bound to this session.
    #[must_use]
    pub fn initiate_use_case(&self) -> InitiateTradeUseCase {
        InitiateTradeUseCase::new(
            Arc::clone(&self.escrow),
            Arc::clone(&self.notifications),
            self.bus.clone(),
            self.timings,
        )
        .with_admin_recipient(self.admin_recipient.clone())
        .with_side_effects(self.side_effects.clone())
    }

    /// Validates and submits a negotiation form.
    ///
    /// # Errors
    ///
    /// See [`InitiateTradeUseCase::execute`]; `InvalidState` after logout.
    pub async fn initiate(&self, form: &NegotiationForm) -> ApplicationResult<InitiationOutcome> {
        self.ensure_open().await?;
        self.initiate_use_case().execute(form).await
    }

    /// Opens the trade view for `id`.
    ///
    /// # Errors
    ///
    /// Returns the first-load error, or `InvalidState` after logout.
    pub async fn open_trade_view(&self, id: TradeId) -> ApplicationResult<TradeView> {
        self.ensure_open().await?;
        TradeView::open(self.view_deps(), id).await
    }

    /// Opens the confirmation review for `id`.
    ///
    /// # Errors
    ///
    /// Returns the load error, or `InvalidState` after logout.
    pub async fn open_review(&self, id: TradeId) -> ApplicationResult<ConfirmCompletion> {
        self.ensure_open().await?;
        ConfirmCompletion::open(self.view_deps(), id).await
    }

    fn view_deps(&self) -> TradeViewDeps {
        TradeViewDeps {
            api: Arc::clone(&self.escrow),
            profiles: Arc::clone(&self.profiles),
            notifications: Arc::clone(&self.notifications),
            confirmer: Arc::clone(&self.confirmer),
            clock: Arc::clone(&self.clock),
            bus: self.bus.clone(),
            side_effects: self.side_effects.clone(),
            admin_recipient: self.admin_recipient.clone(),
            timings: self.timings,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{OfferType, PaymentMethod, StockSymbol};
    use crate::infrastructure::in_memory::{InMemoryEscrow, RecordingSink};

    async fn context() -> (InMemoryEscrow, AppContext) {
        let server = InMemoryEscrow::default();
        server
            .add_offer(
                Offer::builder(
                    OfferId::new("o-1"),
                    OfferType::Sell,
                    StockSymbol::new("AMZN").unwrap(),
                    "1".parse().unwrap(),
                    "10".parse().unwrap(),
                    "150".parse().unwrap(),
                )
                .build()
                .unwrap(),
            )
            .await;
        server
            .set_profile(UserProfile {
                email: "me@x.io".to_string(),
                balance: "2500".parse().unwrap(),
                ..UserProfile::default()
            })
            .await;
        let api = Arc::new(server.clone());
        let ctx = AppContext::builder()
            .escrow(api.clone())
            .catalog(api.clone())
            .profiles(api)
            .notifications(Arc::new(RecordingSink::new()))
            .build()
            .unwrap();
        (server, ctx)
    }

    #[test]
    fn missing_adapter_is_rejected() {
        let err = AppContext::builder().build().unwrap_err();
        assert!(matches!(err, ApplicationError::Internal(_)));
    }

    #[tokio::test]
    async fn balance_refresh_is_broadcast() {
        let (_server, ctx) = context().await;
        let mut events = ctx.subscribe();
        let user = ctx.refresh_balance().await.unwrap();
        assert_eq!(user.balance, "2500".parse().unwrap());
        assert!(matches!(
            events.try_recv().unwrap(),
            AppEvent::BalanceUpdated(_)
        ));
        assert_eq!(ctx.session().await.unwrap().user, Some(user));
    }

    #[tokio::test]
    async fn negotiate_then_initiate() {
        let (_server, ctx) = context().await;
        let mut form = ctx.negotiate(&OfferId::new("o-1")).await.unwrap();
        form.set_quantity_input("3");
        form.select_payment_method(PaymentMethod::CashBalance).unwrap();
        let outcome = ctx.initiate(&form).await.unwrap();
        let review = ctx.open_review(outcome.trade_id).await.unwrap();
        assert!(!review.state().is_completed());
    }

    #[tokio::test]
    async fn logout_closes_everything() {
        let (_server, ctx) = context().await;
        ctx.logout().await;
        assert!(ctx.session().await.is_none());
        let err = ctx
            .list_offers(&OfferFilter::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::InvalidState(_)));
    }
}
