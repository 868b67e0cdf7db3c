//! # Infrastructure Layer
//!
//! Adapters behind the application ports.
//!
//! ## HTTP
//!
//! REST client of the escrow server: offers, trades, profile.
//!
//! ## Notifications
//!
//! EmailJS delivery and a log-only sink.
//!
//! ## In-Memory
//!
//! A scripted escrow server and a recording sink for tests and the
//! offline CLI mode.

pub mod http;
pub mod in_memory;
pub mod notifications;

pub use http::{HttpClient, HttpClientConfig, RestEscrowApi};
pub use in_memory::{EscrowOp, InMemoryEscrow, RecordingSink};
pub use notifications::{EmailJsConfig, EmailJsSink, LoggingSink};
