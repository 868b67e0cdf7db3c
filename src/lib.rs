//! # P2P Escrow Client
//!
//! Client-side lifecycle of peer-to-peer stock trades settled through an
//! escrow server: browsing offers, negotiating terms, funding escrow,
//! watching the trade until it settles, cancels or runs out of time.
//!
//! ## Architecture
//!
//! The crate follows a layered architecture:
//!
//! - **Domain Layer** (`domain`): offers, trades, the status ladder and value objects
//! - **Application Layer** (`application`): lifecycle services, use cases and the session context
//! - **Infrastructure Layer** (`infrastructure`): REST, EmailJS and in-memory adapters
//! - **Configuration** (`config`): TOML file plus environment overrides
//!
//! ## Example
//!
//! ```rust,ignore
//! use p2p_escrow::application::AppContext;
//! use p2p_escrow::domain::value_objects::TradeId;
//!
//! let ctx = AppContext::builder()
//!     .escrow(api.clone())
//!     .catalog(api.clone())
//!     .profiles(api)
//!     .notifications(sink)
//!     .build()?;
//! let mut view = ctx.open_trade_view(TradeId::new("65f0c2")).await?;
//! let notice = view.confirm_payment().await;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
