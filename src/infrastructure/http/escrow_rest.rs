//! # Escrow REST Adapter
//!
//! [`EscrowApi`], [`OfferCatalog`] and [`ProfileApi`] over the escrow
//! server's JSON API.
//!
//! | Operation | Request |
//! |---|---|
//! | list offers | `GET /p2p/offers?{filter}` |
//! | get offer | `GET /p2p/offers/:id` |
//! | initiate | `POST /p2p/trades/initiate` |
//! | get trade | `GET /p2p/trades/:id` |
//! | confirm payment | `POST /p2p/trades/:id/confirm-payment` |
//! | payment sent | `POST /p2p/trades/:id/payment-sent` |
//! | complete | `POST /p2p/trades/:id/complete` |
//! | cancel | `POST /p2p/trades/:id/cancel` |
//! | profile | `GET /user/profile` |
//!
//! Catalog reads are anonymous; everything else carries the bearer token.

use crate::application::dto::{
    CancelTradeRequest, CompletionParties, InitiateTradeRequest, InitiateTradeResponse,
    InitiatedTrade, OfferEnvelope, OfferFilter, OfferListResponse, OfferPage, ProfileEnvelope,
    TradeEnvelope,
};
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::ports::{EscrowApi, OfferCatalog, ProfileApi};
use crate::domain::entities::{Offer, Trade, UserProfile};
use crate::domain::value_objects::{OfferId, PaymentMethod, TradeId, TradeRole};
use crate::infrastructure::http::client::HttpClient;
use async_trait::async_trait;
use reqwest::Method;
use tracing::{debug, instrument};

fn decode_err(err: impl std::fmt::Display) -> ApplicationError {
    ApplicationError::decode(err.to_string())
}

/// REST client of the escrow server.
#[derive(Debug, Clone)]
pub struct RestEscrowApi {
    http: HttpClient,
}

impl RestEscrowApi {
    /// Wraps `http`.
    #[must_use]
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    fn trade_path(id: &TradeId, action: &str) -> String {
        format!("/p2p/trades/{id}/{action}")
    }
}

#[async_trait]
impl EscrowApi for RestEscrowApi {
    #[instrument(skip(self), fields(offer_id = %request.offer_id))]
    async fn initiate_trade(
        &self,
        request: &InitiateTradeRequest,
    ) -> ApplicationResult<InitiatedTrade> {
        let body: InitiateTradeResponse = self
            .http
            .send_json(
                self.http
                    .authed(Method::POST, "/p2p/trades/initiate")
                    .json(request),
            )
            .await?;
        // Only the buyer side pays with a real method.
        let role = if request.payment_method == PaymentMethod::Asset {
            TradeRole::Seller
        } else {
            TradeRole::Buyer
        };
        let created = body.into_initiated(role).map_err(decode_err)?;
        if created.trade.is_none() {
            debug!(trade_id = %created.id, "initiate response carried only the trade id");
        }
        Ok(created)
    }

    async fn get_trade(&self, id: &TradeId) -> ApplicationResult<Trade> {
        let body: TradeEnvelope = self
            .http
            .send_json(self.http.authed(Method::GET, &format!("/p2p/trades/{id}")))
            .await?;
        // Neither party flag set: an admin reviewing someone else's trade.
        body.trade
            .into_trade(Some(TradeRole::Observer))
            .map_err(decode_err)
    }

    #[instrument(skip(self))]
    async fn confirm_payment(&self, id: &TradeId) -> ApplicationResult<()> {
        self.http
            .send_unit(
                self.http
                    .authed(Method::POST, &Self::trade_path(id, "confirm-payment")),
            )
            .await
    }

    #[instrument(skip(self))]
    async fn mark_payment_sent(&self, id: &TradeId) -> ApplicationResult<()> {
        self.http
            .send_unit(self.http.authed(Method::POST, &Self::trade_path(id, "payment-sent")))
            .await
    }

    #[instrument(skip(self))]
    async fn complete_trade(&self, id: &TradeId) -> ApplicationResult<CompletionParties> {
        self.http
            .send_json(self.http.authed(Method::POST, &Self::trade_path(id, "complete")))
            .await
    }

    #[instrument(skip(self))]
    async fn cancel_trade(&self, id: &TradeId, reason: &str) -> ApplicationResult<()> {
        let body = CancelTradeRequest {
            reason: reason.to_string(),
        };
        self.http
            .send_unit(
                self.http
                    .authed(Method::POST, &Self::trade_path(id, "cancel"))
                    .json(&body),
            )
            .await
    }
}

#[async_trait]
impl OfferCatalog for RestEscrowApi {
    async fn list_offers(&self, filter: &OfferFilter) -> ApplicationResult<OfferPage> {
        let body: OfferListResponse = self
            .http
            .send_json(
                self.http
                    .public(Method::GET, "/p2p/offers")
                    .query(&filter.query_pairs()),
            )
            .await?;
        OfferPage::try_from(body).map_err(decode_err)
    }

    async fn get_offer(&self, id: &OfferId) -> ApplicationResult<Offer> {
        let body: OfferEnvelope = self
            .http
            .send_json(self.http.public(Method::GET, &format!("/p2p/offers/{id}")))
            .await?;
        Offer::try_from(body.offer).map_err(decode_err)
    }
}

#[async_trait]
impl ProfileApi for RestEscrowApi {
    async fn get_profile(&self) -> ApplicationResult<UserProfile> {
        let body: ProfileEnvelope = self
            .http
            .send_json(self.http.authed(Method::GET, "/user/profile"))
            .await?;
        UserProfile::try_from(body.user).map_err(decode_err)
    }
}
