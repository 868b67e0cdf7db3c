//! # Offer DTOs
//!
//! Wire shapes of the offer catalog endpoints and the list filter.
//!
//! ```text
//! GET /p2p/offers?page=1&limit=20&sortBy=rating&stockSymbol=AAPL
//!   → { offers: [...], pagination: { page, totalPages, ... } }
//! GET /p2p/offers/:id
//!   → { offer: {...} }
//! ```

use crate::domain::entities::{Offer, SwapTerms, Trader};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    OfferId, OfferType, ParseEnumError, PaymentMethod, Price, Quantity, StockSymbol,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default page size of the catalog.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Catalog sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OfferSort {
    /// Best rated traders first.
    #[default]
    Rating,
    /// Most active traders first.
    TotalTrades,
    /// Best price first.
    Price,
    /// Newest offers first.
    CreatedAt,
}

impl OfferSort {
    /// Query-string value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rating => "rating",
            Self::TotalTrades => "totalTrades",
            Self::Price => "price",
            Self::CreatedAt => "createdAt",
        }
    }
}

impl fmt::Display for OfferSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferSort {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "rating" => Ok(Self::Rating),
            "totalTrades" => Ok(Self::TotalTrades),
            "price" => Ok(Self::Price),
            "createdAt" => Ok(Self::CreatedAt),
            _ => Err(ParseEnumError {
                kind: "offer sort",
                value: s.to_string(),
            }),
        }
    }
}

/// Filter for listing offers. Unset fields are omitted from the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferFilter {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Sort order.
    pub sort_by: OfferSort,
    /// Only offers for this stock.
    pub stock_symbol: Option<StockSymbol>,
    /// Only offers of this type.
    pub offer_type: Option<OfferType>,
    /// Minimum offer amount in USD.
    pub min_amount: Option<Decimal>,
    /// Maximum offer amount in USD.
    pub max_amount: Option<Decimal>,
    /// Offers able to fill this many shares.
    pub quantity: Option<Decimal>,
    /// Swap offers targeting this stock.
    pub swap_stock: Option<StockSymbol>,
}

impl Default for OfferFilter {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: OfferSort::default(),
            stock_symbol: None,
            offer_type: None,
            min_amount: None,
            max_amount: None,
            quantity: None,
            swap_stock: None,
        }
    }
}

impl OfferFilter {
    /// Query-string pairs in catalog order.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.max(1).to_string()),
            ("limit", self.limit.to_string()),
            ("sortBy", self.sort_by.as_str().to_string()),
        ];
        if let Some(symbol) = &self.stock_symbol {
            pairs.push(("stockSymbol", symbol.to_string()));
        }
        if let Some(offer_type) = self.offer_type {
            pairs.push(("offerType", offer_type.as_str().to_string()));
        }
        if let Some(min) = self.min_amount {
            pairs.push(("minAmount", min.normalize().to_string()));
        }
        if let Some(max) = self.max_amount {
            pairs.push(("maxAmount", max.normalize().to_string()));
        }
        if let Some(quantity) = self.quantity {
            pairs.push(("quantity", quantity.normalize().to_string()));
        }
        if let Some(swap) = &self.swap_stock {
            pairs.push(("swapStock", swap.to_string()));
        }
        pairs
    }
}

/// Trader summary as sent by the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraderDto {
    /// Handle.
    pub username: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Trades started.
    pub total_trades: u32,
    /// Trades completed.
    pub completed_trades: u32,
    /// Average rating.
    pub rating: f64,
    /// Number of reviews.
    pub total_reviews: u32,
    /// Completion rate in percent.
    pub completion_rate: f64,
    /// Verified by the platform.
    pub is_verified: bool,
    /// Reputation badges.
    pub badges: Vec<String>,
}

impl From<TraderDto> for Trader {
    fn from(dto: TraderDto) -> Self {
        Self {
            username: dto.username,
            first_name: dto.first_name,
            total_trades: dto.total_trades,
            completed_trades: dto.completed_trades,
            rating: dto.rating,
            total_reviews: dto.total_reviews,
            completion_rate: dto.completion_rate,
            is_verified: dto.is_verified,
            badges: dto.badges,
        }
    }
}

impl From<&Trader> for TraderDto {
    fn from(trader: &Trader) -> Self {
        Self {
            username: trader.username.clone(),
            first_name: trader.first_name.clone(),
            total_trades: trader.total_trades,
            completed_trades: trader.completed_trades,
            rating: trader.rating,
            total_reviews: trader.total_reviews,
            completion_rate: trader.completion_rate,
            is_verified: trader.is_verified,
            badges: trader.badges.clone(),
        }
    }
}

/// Offer as sent by the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferDto {
    /// Offer id.
    #[serde(rename = "_id")]
    pub id: OfferId,
    /// BUY, SELL or SWAP.
    pub offer_type: OfferType,
    /// Stock ticker.
    pub stock_symbol: String,
    /// Stock display name.
    #[serde(default)]
    pub stock_name: Option<String>,
    /// Minimum quantity.
    pub min_quantity: Decimal,
    /// Maximum quantity.
    pub max_quantity: Decimal,
    /// Price per share.
    pub price_per_share: Decimal,
    /// Listed total value.
    #[serde(default)]
    pub total_value: Option<Decimal>,
    /// Swap stock ticker.
    #[serde(default)]
    pub swap_stock_symbol: Option<String>,
    /// Swap stock name.
    #[serde(default)]
    pub swap_stock_name: Option<String>,
    /// Swap ratio.
    #[serde(default)]
    pub swap_ratio: Option<Decimal>,
    /// Listed payment methods.
    #[serde(default)]
    pub payment_methods: Vec<PaymentMethod>,
    /// Creator's terms.
    #[serde(default)]
    pub terms_and_conditions: Option<String>,
    /// Creator's reputation.
    #[serde(default)]
    pub trader: TraderDto,
}

impl TryFrom<OfferDto> for Offer {
    type Error = DomainError;

    fn try_from(dto: OfferDto) -> DomainResult<Self> {
        let symbol =
            StockSymbol::new(&dto.stock_symbol).map_err(|e| DomainError::InvalidSymbol(e.to_string()))?;
        let min = Quantity::from_decimal(dto.min_quantity)
            .map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
        let max = Quantity::from_decimal(dto.max_quantity)
            .map_err(|e| DomainError::InvalidQuantity(e.to_string()))?;
        let price = Price::from_decimal(dto.price_per_share)
            .map_err(|e| DomainError::InvalidPrice(e.to_string()))?;

        let mut builder = Offer::builder(dto.id, dto.offer_type, symbol, min, max, price)
            .payment_methods(dto.payment_methods)
            .trader(dto.trader.into());

        if let Some(name) = dto.stock_name {
            builder = builder.stock_name(name);
        }
        if let Some(total) = dto.total_value {
            let total =
                Price::from_decimal(total).map_err(|e| DomainError::InvalidPrice(e.to_string()))?;
            builder = builder.total_value(total);
        }
        if let Some(swap_symbol) = dto.swap_stock_symbol.filter(|s| !s.trim().is_empty()) {
            let stock_symbol = StockSymbol::new(&swap_symbol)
                .map_err(|e| DomainError::InvalidSymbol(e.to_string()))?;
            builder = builder.swap(SwapTerms {
                stock_symbol,
                stock_name: dto.swap_stock_name,
                ratio: dto.swap_ratio,
            });
        }
        if let Some(terms) = dto.terms_and_conditions {
            builder = builder.terms_and_conditions(terms);
        }

        builder.build()
    }
}

impl From<&Offer> for OfferDto {
    fn from(offer: &Offer) -> Self {
        Self {
            id: offer.id().clone(),
            offer_type: offer.offer_type(),
            stock_symbol: offer.stock_symbol().to_string(),
            stock_name: offer.stock_name().map(str::to_string),
            min_quantity: offer.min_quantity().get(),
            max_quantity: offer.max_quantity().get(),
            price_per_share: offer.price_per_share().get(),
            total_value: offer.total_value().map(Price::get),
            swap_stock_symbol: offer.swap().map(|s| s.stock_symbol.to_string()),
            swap_stock_name: offer.swap().and_then(|s| s.stock_name.clone()),
            swap_ratio: offer.swap().and_then(|s| s.ratio),
            payment_methods: offer.payment_methods().to_vec(),
            terms_and_conditions: offer.terms_and_conditions().map(str::to_string),
            trader: offer.trader().into(),
        }
    }
}

/// `GET /p2p/offers/:id` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferEnvelope {
    /// The offer.
    pub offer: OfferDto,
}

/// Pagination block of the offer list.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationDto {
    /// Current page.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Number of pages.
    #[serde(default = "default_page")]
    pub total_pages: u32,
    /// Total number of offers, if reported.
    #[serde(default)]
    pub total: Option<u64>,
}

fn default_page() -> u32 {
    1
}

/// `GET /p2p/offers` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferListResponse {
    /// Offers on this page.
    pub offers: Vec<OfferDto>,
    /// Pagination info.
    pub pagination: PaginationDto,
}

/// One page of the offer catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferPage {
    /// Offers on this page.
    pub offers: Vec<Offer>,
    /// Current page.
    pub page: u32,
    /// Number of pages.
    pub total_pages: u32,
}

impl OfferPage {
    /// Returns true if a further page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

impl TryFrom<OfferListResponse> for OfferPage {
    type Error = DomainError;

    fn try_from(response: OfferListResponse) -> DomainResult<Self> {
        let offers = response
            .offers
            .into_iter()
            .map(Offer::try_from)
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(Self {
            offers,
            page: response.pagination.page,
            total_pages: response.pagination.total_pages,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const OFFER_JSON: &str = r#"{
        "_id": "665f0c",
        "offerType": "SELL",
        "stockSymbol": "aapl",
        "stockName": "Apple Inc.",
        "minQuantity": 10,
        "maxQuantity": 100,
        "pricePerShare": 182.5,
        "totalValue": 18250,
        "paymentMethods": ["Cash Balance", "Crypto", "PayPal"],
        "trader": {
            "username": "alice",
            "firstName": "Alice",
            "totalTrades": 42,
            "completedTrades": 40,
            "rating": 4.8,
            "totalReviews": 30,
            "completionRate": 95.2,
            "isVerified": true,
            "badges": ["Top Trader"]
        }
    }"#;

    #[test]
    fn offer_dto_converts_to_domain() {
        let dto: OfferDto = serde_json::from_str(OFFER_JSON).unwrap();
        let offer = Offer::try_from(dto).unwrap();
        assert_eq!(offer.stock_symbol().as_str(), "AAPL");
        assert_eq!(offer.price_per_share().to_string(), "182.5");
        assert_eq!(offer.payment_methods().len(), 3);
        assert!(offer.trader().is_verified);
        assert!(offer.requires_payment_method());
    }

    #[test]
    fn swap_offer_without_swap_symbol_is_rejected() {
        let json = OFFER_JSON.replace("\"SELL\"", "\"SWAP\"");
        let dto: OfferDto = serde_json::from_str(&json).unwrap();
        assert!(Offer::try_from(dto).is_err());
    }

    #[test]
    fn default_filter_query() {
        let pairs = OfferFilter::default().query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("page", "1".to_string()),
                ("limit", "20".to_string()),
                ("sortBy", "rating".to_string()),
            ]
        );
    }

    #[test]
    fn filter_query_includes_set_fields() {
        let filter = OfferFilter {
            page: 2,
            stock_symbol: Some(StockSymbol::new("tsla").unwrap()),
            offer_type: Some(OfferType::Swap),
            min_amount: Some(Decimal::new(1000, 1)),
            swap_stock: Some(StockSymbol::new("NVDA").unwrap()),
            sort_by: OfferSort::CreatedAt,
            ..OfferFilter::default()
        };
        let pairs = filter.query_pairs();
        assert!(pairs.contains(&("stockSymbol", "TSLA".to_string())));
        assert!(pairs.contains(&("offerType", "SWAP".to_string())));
        assert!(pairs.contains(&("minAmount", "100".to_string())));
        assert!(pairs.contains(&("swapStock", "NVDA".to_string())));
        assert!(pairs.contains(&("sortBy", "createdAt".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "maxAmount"));
    }

    #[test]
    fn list_response_parses_pagination() {
        let json = format!(
            r#"{{"offers": [{OFFER_JSON}], "pagination": {{"page": 1, "totalPages": 3, "total": 55}}}}"#
        );
        let response: OfferListResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(response.offers.len(), 1);
        assert_eq!(response.pagination.total_pages, 3);
    }

    #[test]
    fn sort_parsing() {
        assert_eq!("totalTrades".parse::<OfferSort>().unwrap(), OfferSort::TotalTrades);
        assert!("cheapest".parse::<OfferSort>().is_err());
    }
}
