//! # Application Errors
//!
//! Error types for the application layer.
//!
//! Primary trade commands fail closed with one of these errors; secondary
//! effects (notifications, balance refresh) log them and carry on.
//! [`ApplicationError::user_message`] yields the text a view shows.

use crate::domain::errors::DomainError;
use thiserror::Error;

/// Application layer error.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Input rejected before any network call.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// Domain error.
    #[error("domain error: {0}")]
    DomainError(#[from] DomainError),

    /// Server answered with a non-success status.
    #[error("api error {status}: {}", message.as_deref().unwrap_or("no message"))]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided `message`, if any.
        message: Option<String>,
    },

    /// Request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Another command for the same trade is still running.
    #[error("action in flight: {0}")]
    ActionInFlight(String),

    /// Command not valid for the trade's current status or role.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Trade not found.
    #[error("trade not found: {0}")]
    TradeNotFound(String),

    /// Offer not found.
    #[error("offer not found: {0}")]
    OfferNotFound(String),

    /// Notification dispatch failed.
    #[error("notification error: {0}")]
    Notification(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// Creates an API error.
    #[must_use]
    pub fn api(status: u16, message: Option<String>) -> Self {
        Self::Api { status, message }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Creates a decode error.
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Creates an invalid state error.
    #[must_use]
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState(message.into())
    }

    /// Creates a notification error.
    #[must_use]
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true for failures detected locally before any request.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        match self {
            Self::ValidationError(_) => true,
            Self::DomainError(err) => err.is_validation_error(),
            _ => false,
        }
    }

    /// Returns true if the server reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TradeNotFound(_) | Self::OfferNotFound(_) | Self::Api { status: 404, .. }
        )
    }

    /// Text to show the user.
    ///
    /// Server messages and validation messages are shown verbatim;
    /// everything else falls back to `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            } if !message.trim().is_empty() => message.clone(),
            Self::ValidationError(message) => message.clone(),
            Self::DomainError(err) if err.is_validation_error() => err.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Result type for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
