//! # In-Memory Adapters
//!
//! Network-free adapters for tests and the offline CLI mode.

pub mod escrow_server;
pub mod recording_sink;

pub use escrow_server::{EscrowOp, InMemoryEscrow};
pub use recording_sink::RecordingSink;
