//! # Domain Event Base
//!
//! Metadata and trait shared by all domain events.

use crate::domain::value_objects::{Timestamp, TradeId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and time of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// When the event was raised.
    pub timestamp: Timestamp,
}

impl EventMetadata {
    /// Fresh metadata stamped with `timestamp`.
    #[must_use]
    pub fn at(timestamp: Timestamp) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            timestamp,
        }
    }

    /// Fresh metadata stamped now.
    #[must_use]
    pub fn now() -> Self {
        Self::at(Timestamp::now())
    }
}

/// Common accessors for domain events.
pub trait DomainEvent {
    /// Event metadata.
    fn metadata(&self) -> &EventMetadata;

    /// Trade the event concerns, if any.
    fn trade_id(&self) -> Option<&TradeId>;

    /// Stable event name for logs.
    fn event_name(&self) -> &'static str;

    /// Unique event identifier.
    fn event_id(&self) -> Uuid {
        self.metadata().event_id
    }

    /// When the event was raised.
    fn timestamp(&self) -> Timestamp {
        self.metadata().timestamp
    }
}
