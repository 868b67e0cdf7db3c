//! # Trade Status
//!
//! P2P trade lifecycle state machine.
//!
//! # State Machine
//!
//! ```text
//! PENDING → ACCEPTED → PAYMENT_SENT → COMPLETED
//!    ↓          ↓            ↓
//!    └──────────┴────────────┴──────→ CANCELLED / FAILED
//! ```
//!
//! Status only moves forward. The escrow server may settle several steps
//! between two observations, so skipping ahead (e.g. `PENDING` straight
//! to `COMPLETED`) is a valid transition; moving back never is.
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::value_objects::TradeStatus;
//!
//! assert!(TradeStatus::Pending.can_transition_to(TradeStatus::PaymentSent));
//! assert!(!TradeStatus::Completed.can_transition_to(TradeStatus::Pending));
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown trade status: '{0}'")]
pub struct ParseTradeStatusError(pub String);

/// Trade lifecycle status as reported by the escrow server.
///
/// # Terminal States
///
/// - [`Completed`](TradeStatus::Completed) - assets and funds released
/// - [`Cancelled`](TradeStatus::Cancelled) - cancelled by a party or the operator
/// - [`Failed`](TradeStatus::Failed) - settlement failed or the window lapsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TradeStatus {
    /// Created, waiting for the buyer to fund escrow.
    #[default]
    Pending = 0,

    /// Accepted by the counterparty.
    Accepted = 1,

    /// Buyer reports the external payment as sent.
    PaymentSent = 2,

    /// Settled (terminal).
    Completed = 3,

    /// Cancelled (terminal).
    Cancelled = 4,

    /// Failed (terminal).
    Failed = 5,
}

impl TradeStatus {
    /// All statuses in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Pending,
        Self::Accepted,
        Self::PaymentSent,
        Self::Completed,
        Self::Cancelled,
        Self::Failed,
    ];

    /// Returns true if this is an absorbing state.
    #[inline]
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }

    /// Position along the happy path. All terminal states share the top rank.
    #[inline]
    #[must_use]
    pub const fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::PaymentSent => 2,
            Self::Completed | Self::Cancelled | Self::Failed => 3,
        }
    }

    /// Returns true if moving from `self` to `target` is a forward move.
    ///
    /// - Terminal states → (none)
    /// - Non-terminal → any status of strictly higher rank
    #[inline]
    #[must_use]
    pub const fn can_transition_to(&self, target: Self) -> bool {
        !self.is_terminal() && target.rank() > self.rank()
    }

    /// Returns the statuses reachable from this one.
    #[must_use]
    pub fn valid_transitions(&self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|target| self.can_transition_to(*target))
            .collect()
    }

    /// Wire representation (`"PAYMENT_SENT"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Accepted => "ACCEPTED",
            Self::PaymentSent => "PAYMENT_SENT",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = ParseTradeStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseTradeStatusError(s.to_string()))
    }
}
