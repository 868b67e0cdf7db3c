//! # Offer Negotiation
//!
//! Turns a browsed offer plus the user's input into an initiate-trade
//! request.
//!
//! The form keeps two linked text inputs, quantity and USD amount. Editing
//! one recomputes only the other, to two decimals, so the field under the
//! cursor is never rewritten. Validation runs entirely locally: a form that
//! fails [`NegotiationForm::validate`] never reaches the escrow server.
//!
//! # Roles
//!
//! | Offer | Taker | Payment method |
//! |-------|-------|----------------|
//! | SELL  | buyer | chosen by the user |
//! | BUY   | seller | `Asset` |
//! | SWAP  | swap party | `Asset` |

use crate::application::dto::InitiateTradeRequest;
use crate::application::services::crypto_wallets::{CRYPTO_WALLETS, CryptoWallet, wallet_for};
use crate::domain::entities::Offer;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{PaymentMethod, Price, Quantity, TradeRole};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::debug;

/// Which linked input the user edited last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditedField {
    /// Share quantity.
    Quantity,
    /// USD amount.
    Amount,
}

/// Wallets shown after choosing `Crypto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletDisclosure {
    /// Networks and platform addresses.
    pub wallets: &'static [CryptoWallet],
}

/// Negotiation state for one offer.
#[derive(Debug, Clone)]
pub struct NegotiationForm {
    offer: Offer,
    quantity_input: String,
    amount_input: String,
    last_edited: Option<EditedField>,
    payment_method: Option<PaymentMethod>,
    crypto_network: Option<&'static CryptoWallet>,
    crypto_acknowledged: bool,
}

fn parse_non_negative(text: &str) -> Option<Decimal> {
    let value = Decimal::from_str(text.trim()).ok()?;
    (!value.is_sign_negative() || value.is_zero()).then_some(value)
}

impl NegotiationForm {
    /// Empty form for `offer`.
    #[must_use]
    pub fn new(offer: Offer) -> Self {
        Self {
            offer,
            quantity_input: String::new(),
            amount_input: String::new(),
            last_edited: None,
            payment_method: None,
            crypto_network: None,
            crypto_acknowledged: false,
        }
    }

    /// The offer being negotiated.
    #[inline]
    #[must_use]
    pub fn offer(&self) -> &Offer {
        &self.offer
    }

    /// Quantity input as displayed.
    #[inline]
    #[must_use]
    pub fn quantity_input(&self) -> &str {
        &self.quantity_input
    }

    /// Amount input as displayed.
    #[inline]
    #[must_use]
    pub fn amount_input(&self) -> &str {
        &self.amount_input
    }

    /// Input edited last.
    #[inline]
    #[must_use]
    pub fn last_edited(&self) -> Option<EditedField> {
        self.last_edited
    }

    /// Selected payment method.
    #[inline]
    #[must_use]
    pub fn payment_method(&self) -> Option<&PaymentMethod> {
        self.payment_method.as_ref()
    }

    /// Role the user will play.
    #[inline]
    #[must_use]
    pub fn role(&self) -> TradeRole {
        self.offer.taker_role()
    }

    /// Returns true once the crypto transfer was acknowledged.
    #[inline]
    #[must_use]
    pub fn crypto_acknowledged(&self) -> bool {
        self.crypto_acknowledged
    }

    /// Network picked in the wallet disclosure.
    #[inline]
    #[must_use]
    pub fn crypto_network(&self) -> Option<&'static CryptoWallet> {
        self.crypto_network
    }

    // ========== Linked Inputs ==========

    /// User typed in the quantity field; the amount follows.
    pub fn set_quantity_input(&mut self, text: &str) {
        self.quantity_input = text.to_string();
        self.last_edited = Some(EditedField::Quantity);
        self.amount_input = parse_non_negative(text)
            .and_then(|q| Quantity::from_decimal(q).ok())
            .and_then(|q| self.offer.amount_for(q).ok())
            .map(Price::to_fixed2)
            .unwrap_or_default();
    }

    /// User typed in the amount field; the quantity follows.
    pub fn set_amount_input(&mut self, text: &str) {
        self.amount_input = text.to_string();
        self.last_edited = Some(EditedField::Amount);
        self.quantity_input = parse_non_negative(text)
            .and_then(|a| Price::from_decimal(a).ok())
            .and_then(|a| self.offer.quantity_for(a).ok())
            .map(|q| format!("{:.2}", q.round_cents().get()))
            .unwrap_or_default();
    }

    /// Parsed quantity, if the input holds a positive number.
    #[must_use]
    pub fn quantity(&self) -> Option<Quantity> {
        parse_non_negative(&self.quantity_input)
            .and_then(|q| Quantity::from_decimal(q).ok())
            .filter(|q| !q.is_zero())
    }

    // ========== Payment ==========

    /// Chooses a payment method.
    ///
    /// Choosing `Crypto` returns the wallet disclosure and resets any
    /// earlier acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::PaymentMethodUnavailable` for a disabled
    /// method; the selection is cleared.
    pub fn select_payment_method(
        &mut self,
        method: PaymentMethod,
    ) -> DomainResult<Option<WalletDisclosure>> {
        self.crypto_acknowledged = false;
        self.crypto_network = None;
        if !method.is_available() {
            debug!(method = %method, "unavailable payment method selected");
            self.payment_method = None;
            return Err(DomainError::PaymentMethodUnavailable(method.label().to_string()));
        }
        let disclosure = method
            .requires_wallet_disclosure()
            .then_some(WalletDisclosure {
                wallets: &CRYPTO_WALLETS,
            });
        self.payment_method = Some(method);
        Ok(disclosure)
    }

    /// Picks the network to pay on.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ValidationError` for an unknown network.
    pub fn select_crypto_network(&mut self, network: &str) -> DomainResult<&'static CryptoWallet> {
        let wallet = wallet_for(network)
            .ok_or_else(|| DomainError::ValidationError(format!("unknown network: {network}")))?;
        self.crypto_network = Some(wallet);
        Ok(wallet)
    }

    /// The user states the crypto transfer was sent.
    ///
    /// Purely local; the trade status is untouched.
    pub fn acknowledge_crypto_payment(&mut self) {
        self.crypto_acknowledged = true;
    }

    // ========== Submission ==========

    /// Checks every precondition and builds the request.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidQuantity` for a missing or zero quantity
    /// - `DomainError::QuantityOutOfRange` outside the offer's bounds
    /// - `DomainError::PaymentMethodRequired` when a buyer picked nothing
    /// - `DomainError::PaymentMethodUnavailable` for a disabled method
    /// - `DomainError::PaymentNotAcknowledged` for unacknowledged crypto
    pub fn validate(&self) -> DomainResult<InitiateTradeRequest> {
        let quantity = self.quantity().ok_or_else(|| {
            DomainError::InvalidQuantity("enter a positive number of shares".to_string())
        })?;
        self.offer.check_quantity(quantity)?;

        let payment_method = if self.offer.requires_payment_method() {
            let method = self
                .payment_method
                .clone()
                .ok_or(DomainError::PaymentMethodRequired)?;
            if !method.is_available() {
                return Err(DomainError::PaymentMethodUnavailable(
                    method.label().to_string(),
                ));
            }
            if method.requires_wallet_disclosure() && !self.crypto_acknowledged {
                return Err(DomainError::PaymentNotAcknowledged);
            }
            method
        } else {
            PaymentMethod::Asset
        };

        Ok(InitiateTradeRequest {
            offer_id: self.offer.id().clone(),
            quantity,
            payment_method,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::entities::SwapTerms;
    use crate::domain::value_objects::{OfferId, OfferType, StockSymbol};

    fn offer(offer_type: OfferType) -> Offer {
        let builder = Offer::builder(
            OfferId::new("o-1"),
            offer_type,
            StockSymbol::new("AAPL").unwrap(),
            "10".parse().unwrap(),
            "100".parse().unwrap(),
            "50".parse().unwrap(),
        )
        .payment_methods([
            PaymentMethod::CashBalance,
            PaymentMethod::Crypto,
            PaymentMethod::PayPal,
        ]);
        let builder = if offer_type == OfferType::Swap {
            builder.swap(SwapTerms {
                stock_symbol: StockSymbol::new("TSLA").unwrap(),
                stock_name: None,
                ratio: None,
            })
        } else {
            builder
        };
        builder.build().unwrap()
    }

    mod linked_inputs {
        use super::*;

        #[test]
        fn quantity_drives_amount() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("12");
            assert_eq!(form.quantity_input(), "12");
            assert_eq!(form.amount_input(), "600.00");
            assert_eq!(form.last_edited(), Some(EditedField::Quantity));
        }

        #[test]
        fn amount_drives_quantity() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_amount_input("1234.5");
            assert_eq!(form.amount_input(), "1234.5");
            assert_eq!(form.quantity_input(), "24.69");
        }

        #[test]
        fn empty_input_clears_other_field() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("12");
            form.set_quantity_input("");
            assert_eq!(form.amount_input(), "");
            form.set_amount_input("100");
            form.set_amount_input("abc");
            assert_eq!(form.quantity_input(), "");
        }

        #[test]
        fn recomputing_is_idempotent() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("20");
            let amount = form.amount_input().to_string();
            form.set_quantity_input("20");
            assert_eq!(form.amount_input(), amount);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn out_of_range_quantity_message() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("200");
            form.select_payment_method(PaymentMethod::CashBalance).unwrap();
            let err = form.validate().unwrap_err();
            assert_eq!(err.to_string(), "Quantity must be between 10 and 100 shares");
        }

        #[test]
        fn missing_quantity() {
            let form = NegotiationForm::new(offer(OfferType::Buy));
            assert!(matches!(
                form.validate(),
                Err(DomainError::InvalidQuantity(_))
            ));
        }

        #[test]
        fn buyer_must_choose_method() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("10");
            assert!(matches!(
                form.validate(),
                Err(DomainError::PaymentMethodRequired)
            ));
        }

        #[test]
        fn seller_settles_with_asset() {
            let mut form = NegotiationForm::new(offer(OfferType::Buy));
            form.set_quantity_input("10");
            let request = form.validate().unwrap();
            assert_eq!(request.payment_method, PaymentMethod::Asset);
            assert_eq!(form.role(), TradeRole::Seller);
        }

        #[test]
        fn swap_party_settles_with_asset() {
            let mut form = NegotiationForm::new(offer(OfferType::Swap));
            form.set_quantity_input("50");
            assert_eq!(form.validate().unwrap().payment_method, PaymentMethod::Asset);
        }

        #[test]
        fn cash_balance_request() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("10");
            form.select_payment_method(PaymentMethod::CashBalance).unwrap();
            let request = form.validate().unwrap();
            assert_eq!(request.offer_id, OfferId::new("o-1"));
            assert_eq!(request.quantity, "10".parse().unwrap());
            assert_eq!(request.payment_method, PaymentMethod::CashBalance);
        }
    }

    mod payment {
        use super::*;

        #[test]
        fn unavailable_method_is_refused_and_cleared() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.select_payment_method(PaymentMethod::CashBalance).unwrap();
            let err = form
                .select_payment_method(PaymentMethod::PayPal)
                .unwrap_err();
            assert_eq!(
                err.to_string(),
                "PayPal is currently unavailable. Please select another payment method."
            );
            assert!(form.payment_method().is_none());
        }

        #[test]
        fn crypto_requires_acknowledgement() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.set_quantity_input("10");
            let disclosure = form
                .select_payment_method(PaymentMethod::Crypto)
                .unwrap()
                .unwrap();
            assert_eq!(disclosure.wallets.len(), 5);
            assert!(matches!(
                form.validate(),
                Err(DomainError::PaymentNotAcknowledged)
            ));

            form.select_crypto_network("Solana").unwrap();
            form.acknowledge_crypto_payment();
            assert_eq!(form.validate().unwrap().payment_method, PaymentMethod::Crypto);
        }

        #[test]
        fn reselecting_crypto_resets_acknowledgement() {
            let mut form = NegotiationForm::new(offer(OfferType::Sell));
            form.select_payment_method(PaymentMethod::Crypto).unwrap();
            form.acknowledge_crypto_payment();
            form.select_payment_method(PaymentMethod::Crypto).unwrap();
            assert!(!form.crypto_acknowledged());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn quantity_amount_round_trip(q in 10u32..=100, cents in 1u32..100_000) {
                let price = Price::from_decimal(Decimal::new(i64::from(cents), 2)).unwrap();
                let offer = Offer::builder(
                    OfferId::new("p"),
                    OfferType::Sell,
                    StockSymbol::new("AAPL").unwrap(),
                    "10".parse().unwrap(),
                    "100".parse().unwrap(),
                    price,
                )
                .build()
                .unwrap();
                let quantity = Quantity::from_decimal(Decimal::from(q)).unwrap();
                let amount = offer.amount_for(quantity).unwrap();
                let back = offer.quantity_for(amount).unwrap();
                let diff = (back.get() - quantity.get()).abs();
                prop_assert!(diff <= Decimal::new(1, 2));
            }

            #[test]
            fn out_of_range_never_validates(q in prop_oneof![0u32..10, 101u32..10_000]) {
                let mut form = NegotiationForm::new(offer(OfferType::Sell));
                form.select_payment_method(PaymentMethod::CashBalance).unwrap();
                form.set_quantity_input(&q.to_string());
                prop_assert!(form.validate().is_err());
            }
        }
    }
}
