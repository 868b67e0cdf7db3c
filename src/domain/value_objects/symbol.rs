//! # Stock Symbol Value Object
//!
//! Ticker symbol of the traded stock.
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::value_objects::symbol::StockSymbol;
//!
//! let symbol = StockSymbol::new(" aapl ").unwrap();
//! assert_eq!(symbol.as_str(), "AAPL");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for symbol parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// Symbol string is empty.
    #[error("symbol cannot be empty")]
    Empty,

    /// Symbol contains invalid characters.
    #[error("symbol contains invalid characters: '{0}'")]
    InvalidCharacters(String),
}

/// A validated, uppercase stock ticker.
///
/// # Invariants
///
/// - Non-empty after trimming
/// - Only ASCII alphanumerics, `.` and `-` (class shares such as `BRK.B`)
/// - Stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StockSymbol(String);

impl StockSymbol {
    /// Creates a symbol, normalizing to uppercase.
    ///
    /// # Errors
    ///
    /// Returns `SymbolError` if the value is empty or contains characters
    /// other than ASCII alphanumerics, `.` and `-`.
    pub fn new(value: impl AsRef<str>) -> Result<Self, SymbolError> {
        let value = value.as_ref().trim();
        if value.is_empty() {
            return Err(SymbolError::Empty);
        }

        if !value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(SymbolError::InvalidCharacters(value.to_string()));
        }

        Ok(Self(value.to_ascii_uppercase()))
    }

    /// Returns the ticker as a string slice.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StockSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for StockSymbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for StockSymbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<StockSymbol> for String {
    fn from(symbol: StockSymbol) -> Self {
        symbol.0
    }
}

impl AsRef<str> for StockSymbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_to_uppercase() {
        assert_eq!(StockSymbol::new("tsla").unwrap().as_str(), "TSLA");
        assert_eq!(StockSymbol::new("brk.b").unwrap().as_str(), "BRK.B");
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert_eq!(StockSymbol::new("   "), Err(SymbolError::Empty));
        assert!(matches!(
            StockSymbol::new("AA PL"),
            Err(SymbolError::InvalidCharacters(_))
        ));
        assert!(StockSymbol::new("BTC/USD").is_err());
    }

    #[test]
    fn deserialization_validates() {
        let ok: StockSymbol = serde_json::from_str("\"msft\"").unwrap();
        assert_eq!(ok.as_str(), "MSFT");
        assert!(serde_json::from_str::<StockSymbol>("\"\"").is_err());
    }
}
