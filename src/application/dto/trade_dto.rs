//! # Trade DTOs
//!
//! Request and response shapes of the escrow trade endpoints.
//!
//! | Operation | Body | Response |
//! |---|---|---|
//! | `POST /p2p/trades/initiate` | [`InitiateTradeRequest`] | [`InitiateTradeResponse`] (only `trade._id` required) |
//! | `GET /p2p/trades/:id` | - | [`TradeEnvelope`] |
//! | `POST /p2p/trades/:id/complete` | - | [`CompletionParties`] |
//! | `POST /p2p/trades/:id/cancel` | [`CancelTradeRequest`] | - |
//! | `GET /user/profile` | - | [`ProfileEnvelope`] |

use crate::domain::entities::{Trade, TradePartner, TradeSwap, TradeTerms, UserProfile};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    OfferId, PaymentMethod, Price, Quantity, StockSymbol, Timestamp, TradeId, TradeRole,
    TradeStatus, UserId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

fn quantity_as_number<S: Serializer>(quantity: &Quantity, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&quantity.get(), serializer)
}

/// Body of `POST /p2p/trades/initiate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateTradeRequest {
    /// Offer being taken.
    pub offer_id: OfferId,
    /// Shares requested, sent as a JSON number.
    #[serde(serialize_with = "quantity_as_number")]
    pub quantity: Quantity,
    /// Funding method; `Asset` for sellers and swap parties.
    pub payment_method: PaymentMethod,
}

impl fmt::Display for InitiateTradeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "InitiateTradeRequest {{ offer: {}, quantity: {}, method: {} }}",
            self.offer_id, self.quantity, self.payment_method
        )
    }
}

/// Counterparty profile as sent by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradePartnerDto {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

/// Trade as sent by the server, relative to the requesting user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeDto {
    /// Trade id.
    #[serde(rename = "_id")]
    pub id: TradeId,
    /// Stock ticker.
    pub stock_symbol: String,
    /// Shares traded.
    pub quantity: Decimal,
    /// Price per share.
    pub price_per_share: Decimal,
    /// Total amount; derived when absent.
    #[serde(default)]
    pub total_amount: Option<Decimal>,
    /// Funding method.
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    /// Swap trade flag.
    #[serde(default)]
    pub is_swap_trade: bool,
    /// Swap stock ticker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_stock_symbol: Option<String>,
    /// Swap stock quantity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swap_quantity: Option<Decimal>,
    /// Current status.
    pub status: TradeStatus,
    /// Requesting user is the buyer.
    #[serde(default)]
    pub user_is_buyer: bool,
    /// Requesting user is the seller.
    #[serde(default)]
    pub user_is_seller: bool,
    /// Start of the settlement window.
    #[serde(default)]
    pub initiated_at: Option<Timestamp>,
    /// Record creation time, used when `initiatedAt` is missing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    /// Counterparty profile.
    #[serde(default)]
    pub trade_partner: Option<TradePartnerDto>,
    /// Server's own role label ("buyer", "seller").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_user_role: Option<String>,
}

impl TradeDto {
    /// Converts to the domain aggregate.
    ///
    /// The role comes from the buyer/seller flags; if neither is set, from
    /// `currentUserRole`, then from `fallback_role`.
    ///
    /// # Errors
    ///
    /// Returns a `DomainError` for invalid terms, missing timestamps,
    /// contradictory flags or an undeterminable role.
    pub fn into_trade(self, fallback_role: Option<TradeRole>) -> DomainResult<Trade> {
        let stock_symbol = StockSymbol::new(&self.stock_symbol)
            .map_err(|e| DomainError::InvalidSymbol(e.to_string()))?;
        let quantity = Quantity::from_decimal(self.quantity)
            .map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
        let price = Price::from_decimal(self.price_per_share)
            .map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
        let total = match self.total_amount {
            Some(total) => {
                Price::from_decimal(total).map_err(|e| DomainError::InvalidPrice(e.to_string()))?
            }
            None => price.amount_for(quantity)?,
        };
        let payment_method = self.payment_method.unwrap_or(PaymentMethod::Asset);

        let swap = if self.is_swap_trade {
            let symbol = self.swap_stock_symbol.as_deref().ok_or_else(|| {
                DomainError::ValidationError(format!("swap trade {} without swap stock", self.id))
            })?;
            let swap_quantity = self
                .swap_quantity
                .map(Quantity::from_decimal)
                .transpose()
                .map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
            Some(TradeSwap {
                stock_symbol: StockSymbol::new(symbol)
                    .map_err(|e| DomainError::InvalidSymbol(e.to_string()))?,
                quantity: swap_quantity,
            })
        } else {
            None
        };

        let role = match Trade::role_from_flags(
            self.user_is_buyer,
            self.user_is_seller,
            self.is_swap_trade,
        ) {
            Ok(role) => role,
            Err(err) if self.user_is_buyer && self.user_is_seller => return Err(err),
            Err(err) => parse_role_label(self.current_user_role.as_deref())
                .or(fallback_role)
                .ok_or(err)?,
        };

        let initiated_at = self.initiated_at.or(self.created_at).ok_or_else(|| {
            DomainError::InvalidTimestamp(format!("trade {} has no initiatedAt", self.id))
        })?;

        let terms = TradeTerms::from_parts(stock_symbol, quantity, price, total, payment_method, swap);
        let partner = self.trade_partner.map(|p| TradePartner {
            first_name: p.first_name,
            last_name: p.last_name,
        });

        Ok(Trade::from_parts(
            self.id,
            terms,
            self.status,
            role,
            initiated_at,
            partner,
        ))
    }
}

fn parse_role_label(label: Option<&str>) -> Option<TradeRole> {
    match label?.trim().to_ascii_lowercase().as_str() {
        "buyer" => Some(TradeRole::Buyer),
        "seller" => Some(TradeRole::Seller),
        _ => None,
    }
}

impl TryFrom<TradeDto> for Trade {
    type Error = DomainError;

    fn try_from(dto: TradeDto) -> DomainResult<Self> {
        dto.into_trade(None)
    }
}

impl From<&Trade> for TradeDto {
    fn from(trade: &Trade) -> Self {
        let terms = trade.terms();
        Self {
            id: trade.id().clone(),
            stock_symbol: terms.stock_symbol().to_string(),
            quantity: terms.quantity().get(),
            price_per_share: terms.price_per_share().get(),
            total_amount: Some(terms.total_amount().get()),
            payment_method: Some(terms.payment_method().clone()),
            is_swap_trade: terms.is_swap(),
            swap_stock_symbol: terms.swap().map(|s| s.stock_symbol.to_string()),
            swap_quantity: terms.swap().and_then(|s| s.quantity).map(Quantity::get),
            status: trade.status(),
            user_is_buyer: trade.user_is_buyer(),
            user_is_seller: trade.user_is_seller(),
            initiated_at: Some(trade.initiated_at()),
            created_at: None,
            trade_partner: trade.trade_partner().map(|p| TradePartnerDto {
                first_name: p.first_name.clone(),
                last_name: p.last_name.clone(),
            }),
            current_user_role: None,
        }
    }
}

/// `GET /p2p/trades/:id` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeEnvelope {
    /// The trade.
    pub trade: TradeDto,
}

/// `POST /p2p/trades/initiate` body.
///
/// Only `trade._id` is guaranteed; the rest of the trade may be omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateTradeResponse {
    /// The created trade, as much of it as the server sent.
    pub trade: serde_json::Value,
    /// Buyer's email, when disclosed.
    #[serde(default)]
    pub buyer_email: Option<String>,
    /// Seller's email, when disclosed.
    #[serde(default)]
    pub seller_email: Option<String>,
}

#[derive(Deserialize)]
struct CreatedTradeRef {
    #[serde(rename = "_id")]
    id: TradeId,
}

impl InitiateTradeResponse {
    /// Extracts the created trade id, plus the full trade when the body
    /// carries one that decodes.
    ///
    /// # Errors
    ///
    /// Returns the decode error when `trade._id` is missing.
    pub fn into_initiated(self, role: TradeRole) -> Result<InitiatedTrade, serde_json::Error> {
        let CreatedTradeRef { id } = CreatedTradeRef::deserialize(&self.trade)?;
        let trade = serde_json::from_value::<TradeDto>(self.trade)
            .ok()
            .and_then(|dto| dto.into_trade(Some(role)).ok());
        Ok(InitiatedTrade {
            id,
            trade,
            buyer_email: self.buyer_email,
            seller_email: self.seller_email,
        })
    }
}

/// A trade accepted by the escrow server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedTrade {
    /// Id of the created trade.
    pub id: TradeId,
    /// The created trade, when the server returned all of it.
    pub trade: Option<Trade>,
    /// Buyer's email, when disclosed.
    pub buyer_email: Option<String>,
    /// Seller's email, when disclosed.
    pub seller_email: Option<String>,
}

/// `POST /p2p/trades/:id/complete` body: both parties' contacts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompletionParties {
    /// Seller's email.
    pub seller_email: Option<String>,
    /// Seller's display name.
    pub seller_name: Option<String>,
    /// Buyer's email.
    pub buyer_email: Option<String>,
    /// Buyer's display name.
    pub buyer_name: Option<String>,
}

impl CompletionParties {
    /// Contact of the party opposite to the completing user.
    ///
    /// Returns `(email, name)`; the seller when the completing user is the
    /// buyer, the buyer otherwise.
    #[must_use]
    pub fn counterparty(&self, completing_user_is_buyer: bool) -> (Option<&str>, Option<&str>) {
        if completing_user_is_buyer {
            (self.seller_email.as_deref(), self.seller_name.as_deref())
        } else {
            (self.buyer_email.as_deref(), self.buyer_name.as_deref())
        }
    }
}

/// Body of `POST /p2p/trades/:id/cancel`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelTradeRequest {
    /// Free-text reason.
    pub reason: String,
}

/// User profile as sent by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfileDto {
    /// Account id.
    #[serde(rename = "_id", alias = "id")]
    pub id: Option<UserId>,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Login email.
    pub email: String,
    /// Cash balance.
    pub balance: Option<Decimal>,
}

impl TryFrom<UserProfileDto> for UserProfile {
    type Error = DomainError;

    fn try_from(dto: UserProfileDto) -> DomainResult<Self> {
        let balance = Price::from_decimal(dto.balance.unwrap_or(Decimal::ZERO))
            .map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
        Ok(Self {
            id: dto.id,
            first_name: dto.first_name,
            last_name: dto.last_name,
            email: dto.email,
            balance,
        })
    }
}

/// `GET /user/profile` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileEnvelope {
    /// The signed-in user.
    pub user: UserProfileDto,
}

/// Error body the server sends with non-success statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    /// Human-readable reason.
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const TRADE_JSON: &str = r#"{
        "_id": "t-100",
        "stockSymbol": "AAPL",
        "quantity": 12,
        "pricePerShare": 50,
        "totalAmount": 600,
        "paymentMethod": "Cash Balance",
        "isSwapTrade": false,
        "status": "PENDING",
        "userIsBuyer": true,
        "userIsSeller": false,
        "initiatedAt": "2024-03-01T10:00:00.000Z",
        "tradePartner": { "firstName": "Bob", "lastName": "Stone" },
        "currentUserRole": "buyer"
    }"#;

    mod trades {
        use super::*;

        #[test]
        fn trade_dto_converts() {
            let dto: TradeDto = serde_json::from_str(TRADE_JSON).unwrap();
            let trade = Trade::try_from(dto).unwrap();
            assert_eq!(trade.id().as_str(), "t-100");
            assert_eq!(trade.role(), TradeRole::Buyer);
            assert_eq!(trade.status(), TradeStatus::Pending);
            assert_eq!(trade.terms().total_amount().to_string(), "600");
            assert_eq!(trade.trade_partner().unwrap().display_name(), "Bob Stone");
        }

        #[test]
        fn role_falls_back_to_label_then_hint() {
            let json = TRADE_JSON.replace("\"userIsBuyer\": true", "\"userIsBuyer\": false");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            assert_eq!(dto.clone().into_trade(None).unwrap().role(), TradeRole::Buyer);

            let mut dto = dto;
            dto.current_user_role = None;
            assert!(dto.clone().into_trade(None).is_err());
            assert_eq!(
                dto.into_trade(Some(TradeRole::Seller)).unwrap().role(),
                TradeRole::Seller
            );
        }

        #[test]
        fn both_flags_set_ignore_fallback() {
            let json = TRADE_JSON.replace("\"userIsSeller\": false", "\"userIsSeller\": true");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            assert!(matches!(
                dto.into_trade(Some(TradeRole::Observer)),
                Err(DomainError::InvalidRole(_))
            ));
        }

        #[test]
        fn missing_total_is_derived() {
            let json = TRADE_JSON.replace("\"totalAmount\": 600,", "");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            let trade = Trade::try_from(dto).unwrap();
            assert_eq!(trade.terms().total_amount().to_string(), "600");
        }

        #[test]
        fn missing_initiated_at_uses_created_at() {
            let json = TRADE_JSON.replace("initiatedAt", "createdAt");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            assert!(Trade::try_from(dto).is_ok());

            let json = TRADE_JSON.replace("\"initiatedAt\": \"2024-03-01T10:00:00.000Z\",", "");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            assert!(matches!(
                Trade::try_from(dto),
                Err(DomainError::InvalidTimestamp(_))
            ));
        }

        #[test]
        fn swap_trade_needs_swap_symbol() {
            let json = TRADE_JSON.replace("\"isSwapTrade\": false", "\"isSwapTrade\": true");
            let dto: TradeDto = serde_json::from_str(&json).unwrap();
            assert!(Trade::try_from(dto).is_err());
        }

        #[test]
        fn thin_initiate_response_keeps_id() {
            let body: InitiateTradeResponse =
                serde_json::from_str(r#"{"trade": {"_id": "t-9"}}"#).unwrap();
            let created = body.into_initiated(TradeRole::Buyer).unwrap();
            assert_eq!(created.id.as_str(), "t-9");
            assert!(created.trade.is_none());
        }

        #[test]
        fn full_initiate_response_decodes_trade() {
            let json = format!(r#"{{"trade": {TRADE_JSON}, "sellerEmail": "s@x.io"}}"#);
            let body: InitiateTradeResponse = serde_json::from_str(&json).unwrap();
            let created = body.into_initiated(TradeRole::Buyer).unwrap();
            assert_eq!(created.trade.unwrap().id(), &created.id);
            assert_eq!(created.seller_email.as_deref(), Some("s@x.io"));
        }

        #[test]
        fn initiate_response_without_id_fails() {
            let body: InitiateTradeResponse =
                serde_json::from_str(r#"{"trade": {"status": "PENDING"}}"#).unwrap();
            assert!(body.into_initiated(TradeRole::Buyer).is_err());
        }

        #[test]
        fn domain_trade_round_trips_through_dto() {
            let dto: TradeDto = serde_json::from_str(TRADE_JSON).unwrap();
            let trade = Trade::try_from(dto).unwrap();
            let back = Trade::try_from(TradeDto::from(&trade)).unwrap();
            assert_eq!(back, trade);
        }
    }

    mod requests {
        use super::*;

        #[test]
        fn initiate_request_sends_numeric_quantity() {
            let request = InitiateTradeRequest {
                offer_id: OfferId::new("o-1"),
                quantity: "12.5".parse().unwrap(),
                payment_method: PaymentMethod::CashBalance,
            };
            let json = serde_json::to_value(&request).unwrap();
            assert_eq!(
                json,
                serde_json::json!({
                    "offerId": "o-1",
                    "quantity": 12.5,
                    "paymentMethod": "Cash Balance"
                })
            );
        }

        #[test]
        fn completion_counterparty_is_role_aware() {
            let parties = CompletionParties {
                seller_email: Some("seller@x.io".into()),
                seller_name: Some("Sam".into()),
                buyer_email: Some("buyer@x.io".into()),
                buyer_name: Some("Bea".into()),
            };
            assert_eq!(parties.counterparty(true), (Some("seller@x.io"), Some("Sam")));
            assert_eq!(parties.counterparty(false), (Some("buyer@x.io"), Some("Bea")));
        }

        #[test]
        fn profile_parses_balance() {
            let json = r#"{"user": {"_id": "u1", "firstName": "Ann", "lastName": "Lee", "email": "a@x.io", "balance": 1520.75}}"#;
            let envelope: ProfileEnvelope = serde_json::from_str(json).unwrap();
            let profile = UserProfile::try_from(envelope.user).unwrap();
            assert_eq!(profile.balance.to_string(), "1520.75");
            assert_eq!(profile.display_name(), "Ann Lee");
        }
    }
}
