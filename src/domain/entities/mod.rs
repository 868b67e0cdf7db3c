//! # Domain Entities
//!
//! ## Aggregates
//!
//! - [`Trade`]: one escrow-mediated exchange, as observed by a party
//!
//! ## Entities
//!
//! - [`Offer`]: a listed proposal with quantity bounds and price
//! - [`UserProfile`]: the signed-in user's account snapshot

pub mod offer;
pub mod trade;
pub mod user;

pub use offer::{Offer, OfferBuilder, SwapTerms, Trader};
pub use trade::{ObservationOutcome, Trade, TradePartner, TradeSwap, TradeTerms};
pub use user::UserProfile;
