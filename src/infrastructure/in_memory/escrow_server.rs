//! # In-Memory Escrow Server
//!
//! Authoritative escrow simulation implementing [`EscrowApi`],
//! [`OfferCatalog`] and [`ProfileApi`] without a network.
//!
//! Trades move through [`Trade::transition_to`], so the simulation refuses
//! the same backward or post-terminal moves a real server would. Failures
//! can be scripted per operation, and every call is recorded, which makes
//! the server usable both in tests and in the CLI's offline mode.

use crate::application::dto::{
    CompletionParties, InitiateTradeRequest, InitiatedTrade, OfferFilter, OfferPage, OfferSort,
};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::{Clock, EscrowApi, OfferCatalog, ProfileApi, SystemClock};
use crate::domain::entities::{Offer, Trade, UserProfile};
use crate::domain::value_objects::{OfferId, PaymentMethod, Price, TradeId, TradeRole, TradeStatus};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::debug;
use uuid::Uuid;

/// Operations the server records and can be scripted to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscrowOp {
    /// `POST /p2p/trades/initiate`
    Initiate,
    /// `GET /p2p/trades/:id`
    GetTrade,
    /// `POST /p2p/trades/:id/confirm-payment`
    ConfirmPayment,
    /// `POST /p2p/trades/:id/payment-sent`
    MarkPaymentSent,
    /// `POST /p2p/trades/:id/complete`
    Complete,
    /// `POST /p2p/trades/:id/cancel`
    Cancel,
    /// `GET /p2p/offers`
    ListOffers,
    /// `GET /p2p/offers/:id`
    GetOffer,
    /// `GET /user/profile`
    GetProfile,
}

#[derive(Debug, Clone)]
struct StoredTrade {
    trade: Trade,
    funded: bool,
    parties: CompletionParties,
}

#[derive(Debug, Default)]
struct ServerState {
    offers: Vec<Offer>,
    trades: HashMap<TradeId, StoredTrade>,
    profile: UserProfile,
    counterparty_email: Option<String>,
    counterparty_name: Option<String>,
    failures: HashMap<EscrowOp, VecDeque<ApplicationError>>,
    calls: Vec<EscrowOp>,
}

/// In-process escrow server.
#[derive(Debug, Clone)]
pub struct InMemoryEscrow {
    state: Arc<RwLock<ServerState>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryEscrow {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

fn api_error(status: u16, message: impl Into<String>) -> ApplicationError {
    ApplicationError::api(status, Some(message.into()))
}

impl InMemoryEscrow {
    /// Empty server stamping trades with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState::default())),
            clock,
        }
    }

    // ========== Setup ==========

    /// Lists `offer` in the catalog.
    pub async fn add_offer(&self, offer: Offer) {
        self.state.write().await.offers.push(offer);
    }

    /// Replaces the signed-in user's profile.
    pub async fn set_profile(&self, profile: UserProfile) {
        self.state.write().await.profile = profile;
    }

    /// Contact reported for the other party of every trade.
    pub async fn set_counterparty(&self, email: impl Into<String>, name: impl Into<String>) {
        let mut state = self.state.write().await;
        state.counterparty_email = Some(email.into());
        state.counterparty_name = Some(name.into());
    }

    /// Stores `trade` as if it had been initiated earlier.
    pub async fn insert_trade(&self, trade: Trade) {
        let mut state = self.state.write().await;
        let parties = Self::parties_for(&state, trade.role());
        state.trades.insert(
            trade.id().clone(),
            StoredTrade {
                funded: trade.status() != TradeStatus::Pending,
                trade,
                parties,
            },
        );
    }

    /// Makes the next `op` call fail with `error`.
    pub async fn fail_next(&self, op: EscrowOp, error: ApplicationError) {
        self.state
            .write()
            .await
            .failures
            .entry(op)
            .or_default()
            .push_back(error);
    }

    /// Moves a trade as the counterparty or operator would.
    ///
    /// # Errors
    ///
    /// Returns `TradeNotFound` or the domain transition error.
    pub async fn advance(&self, id: &TradeId, status: TradeStatus) -> ApplicationResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .trades
            .get_mut(id)
            .ok_or_else(|| ApplicationError::TradeNotFound(id.to_string()))?;
        stored.trade.transition_to(status)?;
        debug!(trade_id = %id, %status, "trade advanced out of band");
        Ok(())
    }

    // ========== Inspection ==========

    /// Every recorded call, in order.
    pub async fn calls(&self) -> Vec<EscrowOp> {
        self.state.read().await.calls.clone()
    }

    /// Number of recorded calls of `op`.
    pub async fn call_count(&self, op: EscrowOp) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| **c == op)
            .count()
    }

    /// Server-side status of a trade.
    pub async fn status_of(&self, id: &TradeId) -> Option<TradeStatus> {
        self.state
            .read()
            .await
            .trades
            .get(id)
            .map(|t| t.trade.status())
    }

    /// Current profile balance.
    pub async fn balance(&self) -> Price {
        self.state.read().await.profile.balance
    }

    // ========== Internals ==========

    fn parties_for(state: &ServerState, role: TradeRole) -> CompletionParties {
        let me = (
            Some(state.profile.email.clone()).filter(|e| !e.is_empty()),
            Some(state.profile.display_name()).filter(|n| !n.is_empty()),
        );
        let other = (
            state.counterparty_email.clone(),
            state.counterparty_name.clone(),
        );
        let ((buyer_email, buyer_name), (seller_email, seller_name)) = match role {
            TradeRole::Buyer => (me, other),
            TradeRole::Seller | TradeRole::SwapParty | TradeRole::Observer => (other, me),
        };
        CompletionParties {
            seller_email,
            seller_name,
            buyer_email,
            buyer_name,
        }
    }

    /// Records the call and pops a scripted failure.
    async fn enter(&self, op: EscrowOp) -> ApplicationResult<RwLockWriteGuard<'_, ServerState>> {
        let mut state = self.state.write().await;
        state.calls.push(op);
        if let Some(error) = state.failures.get_mut(&op).and_then(VecDeque::pop_front) {
            debug!(?op, %error, "scripted failure");
            return Err(error);
        }
        Ok(state)
    }

    fn stored<'a>(
        state: &'a mut ServerState,
        id: &TradeId,
    ) -> ApplicationResult<&'a mut StoredTrade> {
        state
            .trades
            .get_mut(id)
            .ok_or_else(|| api_error(404, "Trade not found"))
    }

    fn transition(stored: &mut StoredTrade, target: TradeStatus) -> ApplicationResult<()> {
        stored
            .trade
            .transition_to(target)
            .map_err(|err| api_error(400, err.to_string()))
    }
}

#[async_trait]
impl EscrowApi for InMemoryEscrow {
    async fn initiate_trade(
        &self,
        request: &InitiateTradeRequest,
    ) -> ApplicationResult<InitiatedTrade> {
        let mut state = self.enter(EscrowOp::Initiate).await?;
        let offer = state
            .offers
            .iter()
            .find(|o| o.id() == &request.offer_id)
            .cloned()
            .ok_or_else(|| api_error(404, "Offer not found"))?;
        offer
            .check_quantity(request.quantity)
            .map_err(|err| api_error(400, err.to_string()))?;
        if offer.requires_payment_method() && !request.payment_method.is_available() {
            return Err(api_error(400, "Payment method not supported"));
        }

        let terms = offer.trade_terms(request.quantity, request.payment_method.clone())?;
        let trade = Trade::new(
            TradeId::new(Uuid::new_v4().to_string()),
            terms,
            offer.taker_role(),
            self.clock.now(),
        );
        let parties = Self::parties_for(&state, trade.role());
        debug!(trade_id = %trade.id(), "trade initiated");
        state.trades.insert(
            trade.id().clone(),
            StoredTrade {
                trade: trade.clone(),
                funded: false,
                parties: parties.clone(),
            },
        );
        Ok(InitiatedTrade {
            id: trade.id().clone(),
            trade: Some(trade),
            buyer_email: parties.buyer_email,
            seller_email: parties.seller_email,
        })
    }

    async fn get_trade(&self, id: &TradeId) -> ApplicationResult<Trade> {
        let mut state = self.enter(EscrowOp::GetTrade).await?;
        Ok(Self::stored(&mut state, id)?.trade.clone())
    }

    async fn confirm_payment(&self, id: &TradeId) -> ApplicationResult<()> {
        let mut state = self.enter(EscrowOp::ConfirmPayment).await?;
        let balance = state.profile.balance;
        let stored = Self::stored(&mut state, id)?;
        if stored.trade.status() != TradeStatus::Pending {
            return Err(api_error(400, "Trade is not awaiting payment"));
        }
        let debit = (stored.trade.user_is_buyer()
            && *stored.trade.terms().payment_method() == PaymentMethod::CashBalance)
            .then(|| stored.trade.terms().total_amount());
        if let Some(total) = debit
            && total > balance
        {
            return Err(api_error(400, "Insufficient balance"));
        }
        Self::transition(stored, TradeStatus::Accepted)?;
        stored.funded = true;
        if let Some(total) = debit {
            let remaining = balance.get() - total.get();
            state.profile.balance = Price::from_decimal(remaining).unwrap_or(Price::ZERO);
        }
        Ok(())
    }

    async fn mark_payment_sent(&self, id: &TradeId) -> ApplicationResult<()> {
        let mut state = self.enter(EscrowOp::MarkPaymentSent).await?;
        let stored = Self::stored(&mut state, id)?;
        if stored.trade.status() != TradeStatus::Accepted {
            return Err(api_error(400, "Trade is not accepted"));
        }
        Self::transition(stored, TradeStatus::PaymentSent)
    }

    async fn complete_trade(&self, id: &TradeId) -> ApplicationResult<CompletionParties> {
        let mut state = self.enter(EscrowOp::Complete).await?;
        let stored = Self::stored(&mut state, id)?;
        Self::transition(stored, TradeStatus::Completed)?;
        Ok(stored.parties.clone())
    }

    async fn cancel_trade(&self, id: &TradeId, reason: &str) -> ApplicationResult<()> {
        let mut state = self.enter(EscrowOp::Cancel).await?;
        let balance = state.profile.balance;
        let stored = Self::stored(&mut state, id)?;
        Self::transition(stored, TradeStatus::Cancelled)?;
        let refund = (stored.funded
            && stored.trade.user_is_buyer()
            && *stored.trade.terms().payment_method() == PaymentMethod::CashBalance)
            .then(|| stored.trade.terms().total_amount());
        debug!(trade_id = %id, reason, refunded = refund.is_some(), "trade cancelled");
        if let Some(total) = refund {
            state.profile.balance =
                Price::from_decimal(balance.get() + total.get()).unwrap_or(balance);
        }
        Ok(())
    }
}

#[async_trait]
impl OfferCatalog for InMemoryEscrow {
    async fn list_offers(&self, filter: &OfferFilter) -> ApplicationResult<OfferPage> {
        let state = self.enter(EscrowOp::ListOffers).await?;
        let mut matching: Vec<Offer> = state
            .offers
            .iter()
            .filter(|o| {
                filter
                    .stock_symbol
                    .as_ref()
                    .is_none_or(|s| o.stock_symbol() == s)
                    && filter.offer_type.is_none_or(|t| o.offer_type() == t)
                    && filter
                        .quantity
                        .is_none_or(|q| q >= o.min_quantity().get() && q <= o.max_quantity().get())
            })
            .cloned()
            .collect();
        match filter.sort_by {
            OfferSort::Rating => {
                matching.sort_by(|a, b| b.trader().rating.total_cmp(&a.trader().rating));
            }
            OfferSort::TotalTrades => {
                matching.sort_by_key(|o| std::cmp::Reverse(o.trader().total_trades));
            }
            OfferSort::Price => matching.sort_by_key(|o| o.price_per_share()),
            // Catalog order is insertion order.
            OfferSort::CreatedAt => {}
        }
        let limit = filter.limit.max(1) as usize;
        let total_pages = matching.len().div_ceil(limit).max(1) as u32;
        let page = filter.page.max(1);
        let offers = matching
            .into_iter()
            .skip((page as usize - 1) * limit)
            .take(limit)
            .collect();
        Ok(OfferPage {
            offers,
            page,
            total_pages,
        })
    }

    async fn get_offer(&self, id: &OfferId) -> ApplicationResult<Offer> {
        let state = self.enter(EscrowOp::GetOffer).await?;
        state
            .offers
            .iter()
            .find(|o| o.id() == id)
            .cloned()
            .ok_or_else(|| ApplicationError::OfferNotFound(id.to_string()))
    }
}

#[async_trait]
impl ProfileApi for InMemoryEscrow {
    async fn get_profile(&self) -> ApplicationResult<UserProfile> {
        let state = self.enter(EscrowOp::GetProfile).await?;
        Ok(state.profile.clone())
    }
}
