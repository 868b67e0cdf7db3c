//! # Trade Aggregate
//!
//! One escrow-mediated exchange instantiated from an offer.
//!
//! This module provides the [`Trade`] aggregate as the client knows it:
//! immutable terms copied from the offer, the observing user's role, the
//! initiation instant the settlement window is measured from, and the
//! last status reported by the escrow server.
//!
//! # Status Precedence
//!
//! The client never invents a status. It only applies what the server
//! reports, and only when the report moves the trade forward:
//!
//! ```text
//! PENDING(0) → ACCEPTED(1) → PAYMENT_SENT(2) → COMPLETED | CANCELLED | FAILED (3)
//! ```
//!
//! A report of lower or equal rank is stale and ignored, so arrival order
//! of racing responses does not matter and a terminal status absorbs.
//!
//! # Examples
//!
//! ```
//! use p2p_escrow::domain::entities::trade::{ObservationOutcome, Trade, TradeTerms};
//! use p2p_escrow::domain::value_objects::*;
//!
//! let terms = TradeTerms::new(
//!     StockSymbol::new("AAPL").unwrap(),
//!     "10".parse().unwrap(),
//!     "50".parse().unwrap(),
//!     PaymentMethod::CashBalance,
//! )
//! .unwrap();
//!
//! let mut trade = Trade::new(TradeId::new("t-1"), terms, TradeRole::Buyer, Timestamp::now());
//!
//! assert!(matches!(trade.observe_status(TradeStatus::Completed), ObservationOutcome::Advanced { .. }));
//! assert_eq!(trade.observe_status(TradeStatus::Pending), ObservationOutcome::Stale {
//!     current: TradeStatus::Completed,
//!     observed: TradeStatus::Pending,
//! });
//! ```

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{
    PaymentMethod, Price, Quantity, StockSymbol, Timestamp, TradeId, TradeRole, TradeStatus,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Swap leg of a swap trade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeSwap {
    /// Stock delivered in exchange.
    pub stock_symbol: StockSymbol,
    /// Units of that stock, if known.
    pub quantity: Option<Quantity>,
}

/// Static terms of a trade, fixed at initiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeTerms {
    stock_symbol: StockSymbol,
    quantity: Quantity,
    price_per_share: Price,
    total_amount: Price,
    payment_method: PaymentMethod,
    swap: Option<TradeSwap>,
}

impl TradeTerms {
    /// Terms with `total_amount = quantity × price_per_share`.
    ///
    /// # Errors
    ///
    /// Returns an arithmetic error if the total overflows.
    pub fn new(
        stock_symbol: StockSymbol,
        quantity: Quantity,
        price_per_share: Price,
        payment_method: PaymentMethod,
    ) -> DomainResult<Self> {
        let total_amount = price_per_share.amount_for(quantity)?;
        Ok(Self::from_parts(
            stock_symbol,
            quantity,
            price_per_share,
            total_amount,
            payment_method,
            None,
        ))
    }

    /// Terms as reported by the server, total included.
    #[must_use]
    pub fn from_parts(
        stock_symbol: StockSymbol,
        quantity: Quantity,
        price_per_share: Price,
        total_amount: Price,
        payment_method: PaymentMethod,
        swap: Option<TradeSwap>,
    ) -> Self {
        Self {
            stock_symbol,
            quantity,
            price_per_share,
            total_amount,
            payment_method,
            swap,
        }
    }

    /// Attaches a swap leg.
    #[must_use]
    pub fn with_swap(mut self, swap: TradeSwap) -> Self {
        self.swap = Some(swap);
        self
    }

    /// Returns the traded stock.
    #[inline]
    #[must_use]
    pub fn stock_symbol(&self) -> &StockSymbol {
        &self.stock_symbol
    }

    /// Returns the traded quantity.
    #[inline]
    #[must_use]
    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    /// Returns the price per share.
    #[inline]
    #[must_use]
    pub fn price_per_share(&self) -> Price {
        self.price_per_share
    }

    /// Returns the total amount.
    #[inline]
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.total_amount
    }

    /// Returns the payment method.
    #[inline]
    #[must_use]
    pub fn payment_method(&self) -> &PaymentMethod {
        &self.payment_method
    }

    /// Returns the swap leg, if any.
    #[inline]
    #[must_use]
    pub fn swap(&self) -> Option<&TradeSwap> {
        self.swap.as_ref()
    }

    /// Returns true for a swap trade.
    #[inline]
    #[must_use]
    pub fn is_swap(&self) -> bool {
        self.swap.is_some()
    }
}

/// Public profile of the counterparty.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TradePartner {
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
}

impl TradePartner {
    /// "First Last", trimmed.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Result of applying a server-reported status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObservationOutcome {
    /// Status moved forward.
    Advanced {
        /// Status before the observation.
        from: TradeStatus,
        /// Status after the observation.
        to: TradeStatus,
    },
    /// Same status as already known.
    Unchanged,
    /// Observation ranked below the known status and was ignored.
    Stale {
        /// Status kept.
        current: TradeStatus,
        /// Status discarded.
        observed: TradeStatus,
    },
}

impl ObservationOutcome {
    /// Returns true if the status changed.
    #[inline]
    #[must_use]
    pub fn is_advanced(&self) -> bool {
        matches!(self, Self::Advanced { .. })
    }
}

/// A P2P trade as observed by one of its parties.
///
/// # Invariants
///
/// - Terms, role and `initiated_at` never change after construction
/// - Status only moves forward; terminal statuses absorb
/// - The trade partner is set at most once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trade {
    id: TradeId,
    terms: TradeTerms,
    status: TradeStatus,
    role: TradeRole,
    initiated_at: Timestamp,
    trade_partner: Option<TradePartner>,
    version: u64,
}

impl Trade {
    /// Creates a freshly initiated trade in `PENDING`.
    #[must_use]
    pub fn new(id: TradeId, terms: TradeTerms, role: TradeRole, initiated_at: Timestamp) -> Self {
        Self::from_parts(id, terms, TradeStatus::Pending, role, initiated_at, None)
    }

    /// Rebuilds a trade from a server observation.
    #[must_use]
    pub fn from_parts(
        id: TradeId,
        terms: TradeTerms,
        status: TradeStatus,
        role: TradeRole,
        initiated_at: Timestamp,
        trade_partner: Option<TradePartner>,
    ) -> Self {
        Self {
            id,
            terms,
            status,
            role,
            initiated_at,
            trade_partner,
            version: 1,
        }
    }

    /// Derives the user's role from the server's buyer/seller flags.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidRole` when both flags are set, or when
    /// neither is set on a non-swap trade.
    pub fn role_from_flags(
        user_is_buyer: bool,
        user_is_seller: bool,
        is_swap: bool,
    ) -> DomainResult<TradeRole> {
        match (user_is_buyer, user_is_seller) {
            (true, false) => Ok(TradeRole::Buyer),
            (false, true) => Ok(TradeRole::Seller),
            (false, false) if is_swap => Ok(TradeRole::SwapParty),
            (true, true) => Err(DomainError::InvalidRole(
                "user cannot be both buyer and seller".to_string(),
            )),
            (false, false) => Err(DomainError::InvalidRole(
                "user is neither buyer nor seller".to_string(),
            )),
        }
    }

    // ========== Accessors ==========

    /// Returns the trade ID.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &TradeId {
        &self.id
    }

    /// Returns the static terms.
    #[inline]
    #[must_use]
    pub fn terms(&self) -> &TradeTerms {
        &self.terms
    }

    /// Returns the last known status.
    #[inline]
    #[must_use]
    pub fn status(&self) -> TradeStatus {
        self.status
    }

    /// Returns the observing user's role.
    #[inline]
    #[must_use]
    pub fn role(&self) -> TradeRole {
        self.role
    }

    /// Returns true if the observing user is the buyer.
    #[inline]
    #[must_use]
    pub fn user_is_buyer(&self) -> bool {
        self.role == TradeRole::Buyer
    }

    /// Returns true if the observing user is the seller.
    #[inline]
    #[must_use]
    pub fn user_is_seller(&self) -> bool {
        self.role == TradeRole::Seller
    }

    /// Returns when the trade was initiated.
    #[inline]
    #[must_use]
    pub fn initiated_at(&self) -> Timestamp {
        self.initiated_at
    }

    /// Returns the counterparty profile, once known.
    #[inline]
    #[must_use]
    pub fn trade_partner(&self) -> Option<&TradePartner> {
        self.trade_partner.as_ref()
    }

    /// Returns the number of applied status changes plus one.
    #[inline]
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns true once a terminal status has been observed.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// End of the settlement window.
    #[must_use]
    pub fn expires_at(&self, window: Duration) -> Timestamp {
        self.initiated_at.saturating_add(window)
    }

    // ========== Observation ==========

    /// Applies a server-reported status under forward-only precedence.
    pub fn observe_status(&mut self, observed: TradeStatus) -> ObservationOutcome {
        if observed == self.status {
            return ObservationOutcome::Unchanged;
        }
        if !self.status.can_transition_to(observed) {
            return ObservationOutcome::Stale {
                current: self.status,
                observed,
            };
        }
        let from = self.status;
        self.status = observed;
        self.version = self.version.saturating_add(1);
        ObservationOutcome::Advanced { from, to: observed }
    }

    /// Merges a full server observation of the same trade.
    ///
    /// The status goes through [`observe_status`](Self::observe_status); a
    /// missing trade partner is filled in.
    ///
    /// # Errors
    ///
    /// - `DomainError::InvalidId` if the observation is for another trade
    /// - `DomainError::TermsChanged` if its static terms differ
    pub fn observe(&mut self, observed: &Trade) -> DomainResult<ObservationOutcome> {
        if observed.id != self.id {
            return Err(DomainError::InvalidId(format!(
                "observation for {} applied to {}",
                observed.id, self.id
            )));
        }
        if observed.terms != self.terms {
            return Err(DomainError::TermsChanged(format!(
                "server reported {} x {} @ {} for trade {}",
                observed.terms.stock_symbol,
                observed.terms.quantity,
                observed.terms.price_per_share,
                self.id
            )));
        }
        if self.trade_partner.is_none() {
            self.trade_partner = observed.trade_partner.clone();
        }
        Ok(self.observe_status(observed.status))
    }

    /// Strict transition used by the authoritative side.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidStateTransition` for a backward or
    /// post-terminal move.
    pub fn transition_to(&mut self, target: TradeStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(target) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.version = self.version.saturating_add(1);
        Ok(())
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade({}: {} {} @ {} [{}])",
            self.id,
            self.terms.quantity,
            self.terms.stock_symbol,
            self.terms.price_per_share,
            self.status
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn terms() -> TradeTerms {
        TradeTerms::new(
            StockSymbol::new("AAPL").unwrap(),
            "10".parse().unwrap(),
            "50".parse().unwrap(),
            PaymentMethod::CashBalance,
        )
        .unwrap()
    }

    fn trade() -> Trade {
        Trade::new(
            TradeId::new("t-1"),
            terms(),
            TradeRole::Buyer,
            Timestamp::from_secs(1_700_000_000).unwrap(),
        )
    }

    mod roles {
        use super::*;

        #[test]
        fn flags_map_to_roles() {
            assert_eq!(
                Trade::role_from_flags(true, false, false).unwrap(),
                TradeRole::Buyer
            );
            assert_eq!(
                Trade::role_from_flags(false, true, false).unwrap(),
                TradeRole::Seller
            );
            assert_eq!(
                Trade::role_from_flags(false, false, true).unwrap(),
                TradeRole::SwapParty
            );
        }

        #[test]
        fn inconsistent_flags_rejected() {
            assert!(Trade::role_from_flags(true, true, false).is_err());
            assert!(Trade::role_from_flags(false, false, false).is_err());
        }
    }

    mod observation {
        use super::*;

        #[test]
        fn forward_observation_advances() {
            let mut trade = trade();
            let outcome = trade.observe_status(TradeStatus::Accepted);
            assert_eq!(
                outcome,
                ObservationOutcome::Advanced {
                    from: TradeStatus::Pending,
                    to: TradeStatus::Accepted
                }
            );
            assert_eq!(trade.version(), 2);
        }

        #[test]
        fn backward_observation_is_stale() {
            let mut trade = trade();
            trade.observe_status(TradeStatus::PaymentSent);
            assert!(matches!(
                trade.observe_status(TradeStatus::Accepted),
                ObservationOutcome::Stale { .. }
            ));
            assert_eq!(trade.status(), TradeStatus::PaymentSent);
        }

        #[test]
        fn terminal_absorbs_other_terminal() {
            let mut trade = trade();
            trade.observe_status(TradeStatus::Cancelled);
            trade.observe_status(TradeStatus::Completed);
            trade.observe_status(TradeStatus::Pending);
            assert_eq!(trade.status(), TradeStatus::Cancelled);
        }

        #[test]
        fn same_status_is_unchanged() {
            let mut trade = trade();
            assert_eq!(
                trade.observe_status(TradeStatus::Pending),
                ObservationOutcome::Unchanged
            );
            assert_eq!(trade.version(), 1);
        }

        #[test]
        fn full_observation_fills_partner_once() {
            let mut trade = trade();
            let mut server = trade.clone();
            server.trade_partner = Some(TradePartner {
                first_name: "Bob".into(),
                last_name: "Stone".into(),
            });
            server.status = TradeStatus::Accepted;
            assert!(trade.observe(&server).unwrap().is_advanced());
            assert_eq!(trade.trade_partner().unwrap().display_name(), "Bob Stone");

            server.trade_partner = Some(TradePartner::default());
            trade.observe(&server).unwrap();
            assert_eq!(trade.trade_partner().unwrap().first_name, "Bob");
        }

        #[test]
        fn changed_terms_rejected() {
            let mut trade = trade();
            let other = Trade::new(
                TradeId::new("t-1"),
                TradeTerms::new(
                    StockSymbol::new("AAPL").unwrap(),
                    "11".parse().unwrap(),
                    "50".parse().unwrap(),
                    PaymentMethod::CashBalance,
                )
                .unwrap(),
                TradeRole::Buyer,
                trade.initiated_at(),
            );
            assert!(matches!(
                trade.observe(&other),
                Err(DomainError::TermsChanged(_))
            ));
        }

        #[test]
        fn other_trade_rejected() {
            let mut trade = trade();
            let mut other = trade.clone();
            other.id = TradeId::new("t-2");
            assert!(matches!(
                trade.observe(&other),
                Err(DomainError::InvalidId(_))
            ));
        }
    }

    mod transitions {
        use super::*;

        #[test]
        fn strict_transition_rejects_backward() {
            let mut trade = trade();
            trade.transition_to(TradeStatus::Completed).unwrap();
            let err = trade.transition_to(TradeStatus::Pending).unwrap_err();
            assert_eq!(
                err,
                DomainError::InvalidStateTransition {
                    from: TradeStatus::Completed,
                    to: TradeStatus::Pending
                }
            );
        }

        #[test]
        fn expiry_is_initiation_plus_window() {
            let trade = trade();
            let expires = trade.expires_at(Duration::minutes(30));
            assert_eq!(
                expires.signed_duration_since(trade.initiated_at()).num_seconds(),
                1800
            );
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            /// Once terminal, no observation sequence leaves the terminal status.
            #[test]
            fn terminal_absorbs_later_observations(
                observed in prop::collection::vec(prop::sample::select(TradeStatus::ALL.to_vec()), 1..20)
            ) {
                let mut trade = trade();
                let mut seen_terminal: Option<TradeStatus> = None;
                for status in observed {
                    let _ = trade.observe_status(status);
                    if let Some(terminal) = seen_terminal {
                        prop_assert_eq!(trade.status(), terminal);
                    } else if trade.status().is_terminal() {
                        seen_terminal = Some(trade.status());
                    }
                }
            }

            /// The known status rank never decreases.
            #[test]
            fn rank_never_decreases(
                observed in prop::collection::vec(prop::sample::select(TradeStatus::ALL.to_vec()), 1..20)
            ) {
                let mut trade = trade();
                let mut rank = trade.status().rank();
                for status in observed {
                    let _ = trade.observe_status(status);
                    prop_assert!(trade.status().rank() >= rank);
                    rank = trade.status().rank();
                }
            }
        }
    }
}
