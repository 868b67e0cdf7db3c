//! # Domain Enums
//!
//! Small closed vocabularies of the P2P marketplace.
//!
//! - [`OfferType`]: what the offer's creator proposes (BUY, SELL, SWAP)
//! - [`TradeRole`]: the observing user's side of a trade
//! - [`PaymentMethod`]: how the buyer funds escrow

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an enum from an unknown string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: '{value}'")]
pub struct ParseEnumError {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Offer type as listed in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferType {
    /// Creator wants to buy shares.
    Buy,
    /// Creator sells shares for payment.
    Sell,
    /// Creator exchanges one stock for another.
    Swap,
}

impl OfferType {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Swap => "SWAP",
        }
    }

    /// Role the user taking this offer plays in the resulting trade.
    ///
    /// Taking a SELL offer makes the user the buyer; taking a BUY offer
    /// makes the user the seller.
    #[must_use]
    pub const fn taker_role(&self) -> TradeRole {
        match self {
            Self::Sell => TradeRole::Buyer,
            Self::Buy => TradeRole::Seller,
            Self::Swap => TradeRole::SwapParty,
        }
    }
}

impl fmt::Display for OfferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(Self::Buy),
            "SELL" => Ok(Self::Sell),
            "SWAP" => Ok(Self::Swap),
            _ => Err(ParseEnumError {
                kind: "offer type",
                value: s.to_string(),
            }),
        }
    }
}

/// The observing user's side of a trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradeRole {
    /// Pays and receives shares.
    Buyer,
    /// Delivers shares and receives payment.
    Seller,
    /// Delivers one stock and receives another.
    SwapParty,
    /// Neither party; an admin reviewing the trade.
    Observer,
}

impl TradeRole {
    /// Returns true if this role funds escrow with a payment method.
    #[inline]
    #[must_use]
    pub const fn pays(&self) -> bool {
        matches!(self, Self::Buyer)
    }

    /// Returns true for either side of the trade.
    #[inline]
    #[must_use]
    pub const fn is_party(&self) -> bool {
        !matches!(self, Self::Observer)
    }
}

impl fmt::Display for TradeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
            Self::SwapParty => "swap party",
            Self::Observer => "observer",
        };
        f.write_str(s)
    }
}

/// Payment method for funding escrow.
///
/// The catalog may list methods this client does not know; they are kept
/// as [`PaymentMethod::Other`] and treated as unavailable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PaymentMethod {
    /// Debit from the platform cash balance.
    CashBalance,
    /// External crypto transfer to a platform wallet.
    Crypto,
    /// PayPal (listed, not supported).
    PayPal,
    /// Bank transfer (listed, not supported).
    BankTransfer,
    /// Seller or swap party settling by releasing shares.
    Asset,
    /// Any other method listed by an offer.
    Other(String),
}

impl PaymentMethod {
    /// Wire and display label.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::CashBalance => "Cash Balance",
            Self::Crypto => "Crypto",
            Self::PayPal => "PayPal",
            Self::BankTransfer => "Bank Transfer",
            Self::Asset => "Asset",
            Self::Other(label) => label,
        }
    }

    /// Returns true if a buyer may select this method.
    #[inline]
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::CashBalance | Self::Crypto)
    }

    /// Returns true if selecting this method opens the wallet disclosure.
    #[inline]
    #[must_use]
    pub const fn requires_wallet_disclosure(&self) -> bool {
        matches!(self, Self::Crypto)
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl From<String> for PaymentMethod {
    fn from(value: String) -> Self {
        match value.trim() {
            "Cash Balance" => Self::CashBalance,
            "Crypto" => Self::Crypto,
            "PayPal" => Self::PayPal,
            "Bank Transfer" => Self::BankTransfer,
            "Asset" => Self::Asset,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for PaymentMethod {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<PaymentMethod> for String {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::Other(label) => label,
            known => known.label().to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn taker_roles() {
        assert_eq!(OfferType::Sell.taker_role(), TradeRole::Buyer);
        assert_eq!(OfferType::Buy.taker_role(), TradeRole::Seller);
        assert_eq!(OfferType::Swap.taker_role(), TradeRole::SwapParty);
        assert!(!TradeRole::Observer.is_party());
        assert!(!TradeRole::Observer.pays());
        assert!(OfferType::Sell.taker_role().pays());
        assert!(!OfferType::Buy.taker_role().pays());
    }

    #[test]
    fn offer_type_parsing() {
        assert_eq!("swap".parse::<OfferType>().unwrap(), OfferType::Swap);
        let err = "LEND".parse::<OfferType>().unwrap_err();
        assert_eq!(err.kind, "offer type");
    }

    #[test]
    fn payment_method_labels_round_trip_through_json() {
        let json = serde_json::to_string(&PaymentMethod::CashBalance).unwrap();
        assert_eq!(json, "\"Cash Balance\"");
        let back: PaymentMethod = serde_json::from_str("\"Bank Transfer\"").unwrap();
        assert_eq!(back, PaymentMethod::BankTransfer);
        let other: PaymentMethod = serde_json::from_str("\"Venmo\"").unwrap();
        assert_eq!(other, PaymentMethod::Other("Venmo".into()));
    }

    #[test]
    fn availability() {
        assert!(PaymentMethod::CashBalance.is_available());
        assert!(PaymentMethod::Crypto.is_available());
        assert!(!PaymentMethod::PayPal.is_available());
        assert!(!PaymentMethod::BankTransfer.is_available());
        assert!(!PaymentMethod::Other("Venmo".into()).is_available());
    }
}
