//! # Offer Entity
//!
//! A standing proposal listed in the P2P catalog.
//!
//! Offers are owned by the marketplace; this client only reads them. An
//! [`Offer`] carries the quantity bounds and price the negotiation form is
//! checked against, and determines which side of the trade the taker ends
//! up on.
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::entities::offer::{Offer, Trader};
//! use p2p_escrow::domain::value_objects::{OfferId, OfferType, StockSymbol, TradeRole};
//!
//! let offer = Offer::builder(
//!     OfferId::new("o-1"),
//!     OfferType::Sell,
//!     StockSymbol::new("AAPL").unwrap(),
//!     "10".parse().unwrap(),
//!     "100".parse().unwrap(),
//!     "50".parse().unwrap(),
//! )
//! .trader(Trader::named("alice"))
//! .build()
//! .unwrap();
//!
//! assert_eq!(offer.taker_role(), TradeRole::Buyer);
//! assert!(offer.check_quantity("200".parse().unwrap()).is_err());
//! ```

use crate::domain::entities::trade::{TradeSwap, TradeTerms};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    OfferId, OfferType, PaymentMethod, Price, Quantity, StockSymbol, TradeRole,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Public reputation summary of an offer's creator.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Trader {
    /// Handle shown in the catalog.
    pub username: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Trades started.
    pub total_trades: u32,
    /// Trades that reached COMPLETED.
    pub completed_trades: u32,
    /// Average review score.
    pub rating: f64,
    /// Number of reviews behind `rating`.
    pub total_reviews: u32,
    /// Completion rate in percent.
    pub completion_rate: f64,
    /// Identity verified by the platform.
    pub is_verified: bool,
    /// Reputation badges ("Top Trader", "Fast Responder", ...).
    pub badges: Vec<String>,
}

impl Trader {
    /// A trader with only a username set.
    #[must_use]
    pub fn named(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Self::default()
        }
    }
}

/// Swap leg of a SWAP offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapTerms {
    /// Stock the taker receives in exchange.
    pub stock_symbol: StockSymbol,
    /// Display name of that stock.
    pub stock_name: Option<String>,
    /// Units of the swap stock per unit of the offered stock.
    pub ratio: Option<Decimal>,
}

/// A listed P2P offer.
///
/// # Invariants
///
/// - `min_quantity <= max_quantity`
/// - `price_per_share > 0`
/// - SWAP offers carry [`SwapTerms`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    id: OfferId,
    offer_type: OfferType,
    stock_symbol: StockSymbol,
    stock_name: Option<String>,
    min_quantity: Quantity,
    max_quantity: Quantity,
    price_per_share: Price,
    total_value: Option<Price>,
    swap: Option<SwapTerms>,
    payment_methods: Vec<PaymentMethod>,
    terms_and_conditions: Option<String>,
    trader: Trader,
}

impl Offer {
    /// Starts building an offer from its required fields.
    #[must_use]
    pub fn builder(
        id: OfferId,
        offer_type: OfferType,
        stock_symbol: StockSymbol,
        min_quantity: Quantity,
        max_quantity: Quantity,
        price_per_share: Price,
    ) -> OfferBuilder {
        OfferBuilder {
            offer: Self {
                id,
                offer_type,
                stock_symbol,
                stock_name: None,
                min_quantity,
                max_quantity,
                price_per_share,
                total_value: None,
                swap: None,
                payment_methods: Vec::new(),
                terms_and_conditions: None,
                trader: Trader::default(),
            },
        }
    }

    // ========== Accessors ==========

    /// Returns the offer ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &OfferId {
        &self.id
    }

    /// Returns the offer type.
    #[inline]
    #[must_use]
    pub fn offer_type(&self) -> OfferType {
        self.offer_type
    }

    /// Returns the stock symbol.
    #[inline]
    #[must_use]
    pub fn stock_symbol(&self) -> &StockSymbol {
        &self.stock_symbol
    }

    /// Returns the stock display name, if listed.
    #[inline]
    #[must_use]
    pub fn stock_name(&self) -> Option<&str> {
        self.stock_name.as_deref()
    }

    /// Returns the minimum tradable quantity.
    #[inline]
    #[must_use]
    pub fn min_quantity(&self) -> Quantity {
        self.min_quantity
    }

    /// Returns the maximum tradable quantity.
    #[inline]
    #[must_use]
    pub fn max_quantity(&self) -> Quantity {
        self.max_quantity
    }

    /// Returns the price per share.
    #[inline]
    #[must_use]
    pub fn price_per_share(&self) -> Price {
        self.price_per_share
    }

    /// Returns the listed total value, if any.
    #[inline]
    #[must_use]
    pub fn total_value(&self) -> Option<Price> {
        self.total_value
    }

    /// Returns the swap leg of a SWAP offer.
    #[inline]
    #[must_use]
    pub fn swap(&self) -> Option<&SwapTerms> {
        self.swap.as_ref()
    }

    /// Returns the payment methods the offer lists.
    #[inline]
    #[must_use]
    pub fn payment_methods(&self) -> &[PaymentMethod] {
        &self.payment_methods
    }

    /// Returns the creator's terms, if any.
    #[inline]
    #[must_use]
    pub fn terms_and_conditions(&self) -> Option<&str> {
        self.terms_and_conditions.as_deref()
    }

    /// Returns the creator's reputation summary.
    #[inline]
    #[must_use]
    pub fn trader(&self) -> &Trader {
        &self.trader
    }

    // ========== Negotiation Helpers ==========

    /// Role the user taking this offer plays.
    #[inline]
    #[must_use]
    pub fn taker_role(&self) -> TradeRole {
        self.offer_type.taker_role()
    }

    /// Returns true if the taker must pick a payment method.
    #[inline]
    #[must_use]
    pub fn requires_payment_method(&self) -> bool {
        self.taker_role().pays()
    }

    /// Returns true if this is a SWAP offer.
    #[inline]
    #[must_use]
    pub fn is_swap(&self) -> bool {
        self.offer_type == OfferType::Swap
    }

    /// Checks `min_quantity <= quantity <= max_quantity`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::QuantityOutOfRange` when outside the bounds.
    pub fn check_quantity(&self, quantity: Quantity) -> DomainResult<()> {
        if quantity.is_within(self.min_quantity, self.max_quantity) {
            Ok(())
        } else {
            Err(DomainError::QuantityOutOfRange {
                min: self.min_quantity,
                max: self.max_quantity,
            })
        }
    }

    /// USD amount for `quantity` shares.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn amount_for(&self, quantity: Quantity) -> DomainResult<Price> {
        Ok(self.price_per_share.amount_for(quantity)?)
    }

    /// Shares bought by `amount` USD.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error on overflow.
    pub fn quantity_for(&self, amount: Price) -> DomainResult<Quantity> {
        Ok(Quantity::for_amount(amount, self.price_per_share)?)
    }

    /// Terms of a trade taking `quantity` shares of this offer.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if the total overflows.
    pub fn trade_terms(
        &self,
        quantity: Quantity,
        payment_method: PaymentMethod,
    ) -> DomainResult<TradeTerms> {
        let terms = TradeTerms::new(
            self.stock_symbol.clone(),
            quantity,
            self.price_per_share,
            payment_method,
        )?;
        Ok(match &self.swap {
            Some(swap) => terms.with_swap(TradeSwap {
                stock_symbol: swap.stock_symbol.clone(),
                quantity: None,
            }),
            None => terms,
        })
    }
}

impl fmt::Display for Offer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Offer({} {} {}..{} @ {})",
            self.offer_type,
            self.stock_symbol,
            self.min_quantity,
            self.max_quantity,
            self.price_per_share
        )
    }
}

/// Builder for [`Offer`].
#[derive(Debug, Clone)]
#[must_use]
pub struct OfferBuilder {
    offer: Offer,
}

impl OfferBuilder {
    /// Sets the stock display name.
    pub fn stock_name(mut self, name: impl Into<String>) -> Self {
        self.offer.stock_name = Some(name.into());
        self
    }

    /// Sets the listed total value.
    pub fn total_value(mut self, total: Price) -> Self {
        self.offer.total_value = Some(total);
        self
    }

    /// Sets the swap leg.
    pub fn swap(mut self, swap: SwapTerms) -> Self {
        self.offer.swap = Some(swap);
        self
    }

    /// Sets the listed payment methods.
    pub fn payment_methods(mut self, methods: impl IntoIterator<Item = PaymentMethod>) -> Self {
        self.offer.payment_methods = methods.into_iter().collect();
        self
    }

    /// Sets the creator's terms.
    pub fn terms_and_conditions(mut self, terms: impl Into<String>) -> Self {
        self.offer.terms_and_conditions = Some(terms.into());
        self
    }

    /// Sets the creator's reputation summary.
    pub fn trader(mut self, trader: Trader) -> Self {
        self.offer.trader = trader;
        self
    }

    /// Validates and builds the offer.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidQuantity` if `min > max`
    /// - `DomainError::InvalidPrice` if the price is zero
    /// - `DomainError::ValidationError` for a SWAP offer without swap terms
    pub fn build(self) -> DomainResult<Offer> {
        let offer = self.offer;
        if offer.min_quantity > offer.max_quantity {
            return Err(DomainError::InvalidQuantity(format!(
                "min quantity {} exceeds max quantity {}",
                offer.min_quantity, offer.max_quantity
            )));
        }
        if !offer.price_per_share.is_positive() {
            return Err(DomainError::InvalidPrice(
                "price per share must be positive".to_string(),
            ));
        }
        if offer.offer_type == OfferType::Swap && offer.swap.is_none() {
            return Err(DomainError::ValidationError(
                "swap offer without a swap stock".to_string(),
            ));
        }
        Ok(offer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn offer(offer_type: OfferType) -> OfferBuilder {
        Offer::builder(
            OfferId::new("o-1"),
            offer_type,
            StockSymbol::new("AAPL").unwrap(),
            "10".parse().unwrap(),
            "100".parse().unwrap(),
            "50".parse().unwrap(),
        )
    }

    mod construction {
        use super::*;

        #[test]
        fn rejects_inverted_bounds() {
            let result = Offer::builder(
                OfferId::new("o-1"),
                OfferType::Sell,
                StockSymbol::new("AAPL").unwrap(),
                "100".parse().unwrap(),
                "10".parse().unwrap(),
                "50".parse().unwrap(),
            )
            .build();
            assert!(matches!(result, Err(DomainError::InvalidQuantity(_))));
        }

        #[test]
        fn rejects_zero_price() {
            let result = Offer::builder(
                OfferId::new("o-1"),
                OfferType::Sell,
                StockSymbol::new("AAPL").unwrap(),
                "1".parse().unwrap(),
                "10".parse().unwrap(),
                Price::ZERO,
            )
            .build();
            assert!(matches!(result, Err(DomainError::InvalidPrice(_))));
        }

        #[test]
        fn swap_requires_terms() {
            assert!(offer(OfferType::Swap).build().is_err());
            let swap = offer(OfferType::Swap)
                .swap(SwapTerms {
                    stock_symbol: StockSymbol::new("MSFT").unwrap(),
                    stock_name: None,
                    ratio: Some(Decimal::new(5, 1)),
                })
                .build()
                .unwrap();
            assert!(swap.is_swap());
        }
    }

    mod negotiation {
        use super::*;

        #[test]
        fn sell_offer_taker_pays() {
            let sell = offer(OfferType::Sell).build().unwrap();
            let buy = offer(OfferType::Buy).build().unwrap();
            assert!(sell.requires_payment_method());
            assert!(!buy.requires_payment_method());
        }

        #[test]
        fn quantity_bounds_are_inclusive() {
            let offer = offer(OfferType::Sell).build().unwrap();
            assert!(offer.check_quantity("10".parse().unwrap()).is_ok());
            assert!(offer.check_quantity("100".parse().unwrap()).is_ok());
            let err = offer.check_quantity("200".parse().unwrap()).unwrap_err();
            assert_eq!(err.to_string(), "Quantity must be between 10 and 100 shares");
        }

        #[test]
        fn amount_and_quantity_conversions() {
            let offer = offer(OfferType::Sell).build().unwrap();
            assert_eq!(
                offer.amount_for("12".parse().unwrap()).unwrap().to_string(),
                "600"
            );
            assert_eq!(
                offer.quantity_for("125".parse().unwrap()).unwrap().to_string(),
                "2.5"
            );
        }
    }
}
