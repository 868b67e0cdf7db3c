//! # Identity Value Objects
//!
//! Type-safe wrappers for server-assigned identifiers.
//!
//! Trade, offer and user identifiers are opaque strings owned by the
//! escrow server; the client never generates or interprets them. The
//! newtypes only keep the different kinds from being mixed up.
//!
//! - [`TradeId`] - P2P trade identifier
//! - [`OfferId`] - P2P offer identifier
//! - [`UserId`] - user account identifier

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a server-assigned identifier.
            #[inline]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consumes the identifier and returns the inner String.
            #[inline]
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }

            /// Returns true if the identifier is empty or whitespace.
            #[inline]
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            #[inline]
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// P2P trade identifier (the server's `_id`).
    ///
    /// # Examples
    ///
    /// ```
    /// use p2p_escrow::domain::value_objects::TradeId;
    ///
    /// let id = TradeId::new("65f1c2a9e4b0a1d2c3f4e5a6");
    /// assert_eq!(id.to_string(), "65f1c2a9e4b0a1d2c3f4e5a6");
    /// ```
    TradeId
);

string_id!(
    /// P2P offer identifier.
    OfferId
);

string_id!(
    /// User account identifier.
    UserId
);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn serde_is_transparent() {
        let id = TradeId::new("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc123\"");
        let back: TradeId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn blank_detection() {
        assert!(OfferId::new("  ").is_blank());
        assert!(!OfferId::new("o-1").is_blank());
    }
}
