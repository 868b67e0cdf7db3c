//! # Timestamp Value Object
//!
//! UTC instant with millisecond-friendly helpers.
//!
//! The escrow server reports `initiatedAt` as an ISO-8601 string; all
//! expiry arithmetic is done on [`Timestamp`] so a reload never changes
//! the outcome.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A UTC instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Current wall-clock time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Wraps a chrono instant.
    #[inline]
    #[must_use]
    pub const fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Builds a timestamp from Unix seconds, if representable.
    #[must_use]
    pub fn from_secs(secs: i64) -> Option<Self> {
        Utc.timestamp_opt(secs, 0).single().map(Self)
    }

    /// Builds a timestamp from Unix milliseconds, if representable.
    #[must_use]
    pub fn from_millis(millis: i64) -> Option<Self> {
        DateTime::from_timestamp_millis(millis).map(Self)
    }

    /// Returns the inner chrono instant.
    #[inline]
    #[must_use]
    pub const fn as_datetime(&self) -> DateTime<Utc> {
        self.0
    }

    /// Unix milliseconds.
    #[inline]
    #[must_use]
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Returns `self - earlier`; negative when `earlier` is in the future.
    #[must_use]
    pub fn signed_duration_since(&self, earlier: Self) -> Duration {
        self.0.signed_duration_since(earlier.0)
    }

    /// Adds a signed duration, saturating at the representable range.
    #[must_use]
    pub fn saturating_add(&self, delta: Duration) -> Self {
        Self(self.0.checked_add_signed(delta).unwrap_or(self.0))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}
