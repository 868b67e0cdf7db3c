//! # HTTP Adapters
//!
//! `reqwest`-based access to the escrow server.

pub mod client;
pub mod escrow_rest;

pub use client::{HttpClient, HttpClientConfig};
pub use escrow_rest::RestEscrowApi;
