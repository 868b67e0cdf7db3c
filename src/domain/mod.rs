//! # Domain Layer
//!
//! Core trade lifecycle rules following Domain-Driven Design principles.
//!
//! This layer contains:
//! - **Entities**: Trade aggregate, offers and the user profile
//! - **Value Objects**: Immutable types with validation (Price, Quantity, identifiers, status)
//! - **Events**: Domain events published on the in-process bus
//! - **Errors**: Domain-specific error types

pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;
