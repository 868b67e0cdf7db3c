//! # HTTP Client
//!
//! Thin wrapper over `reqwest` for the escrow REST API.
//!
//! - Paths are appended to the configured base URL.
//! - Authenticated requests carry `Authorization: Bearer <token>`.
//! - Non-2xx responses become `ApplicationError::Api` with the server's
//!   `message` field when the body has one.
//! - No timeout is set unless one is configured; a hung request is left
//!   to the transport.

use crate::application::dto::ErrorBody;
use crate::application::error::{ApplicationError, ApplicationResult};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Connection settings.
#[derive(Clone, Default)]
pub struct HttpClientConfig {
    base_url: String,
    token: Option<String>,
    timeout_ms: u64,
}

impl HttpClientConfig {
    /// Settings for `base_url`, without token or timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout_ms: 0,
        }
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Sets the request timeout; 0 keeps the transport default.
    #[must_use]
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Base URL without trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Returns true if a bearer token is configured.
    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    /// Request timeout in milliseconds.
    #[inline]
    #[must_use]
    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

impl fmt::Debug for HttpClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

/// JSON-over-HTTP client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if the TLS backend cannot be initialised.
    pub fn new(config: HttpClientConfig) -> ApplicationResult<Self> {
        let mut builder = reqwest::Client::builder();
        if config.timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.timeout_ms));
        }
        let inner = builder
            .build()
            .map_err(|e| ApplicationError::internal(format!("http client: {e}")))?;
        Ok(Self { inner, config })
    }

    /// Connection settings.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url(), path)
    }

    /// Request without credentials.
    #[must_use]
    pub fn public(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner.request(method, self.url(path))
    }

    /// Request carrying the bearer token, if any.
    #[must_use]
    pub fn authed(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self.public(method, path);
        match &self.config.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Sends `request` and checks the status.
    ///
    /// # Errors
    ///
    /// - `Transport` if no response arrived
    /// - `Api` for a non-2xx status
    pub async fn send(&self, request: RequestBuilder) -> ApplicationResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApplicationError::transport(e.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "http response");
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty());
        Err(ApplicationError::api(status.as_u16(), message))
    }

    /// Sends `request` and decodes the JSON body.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send), plus `Decode` for a malformed body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ApplicationResult<T> {
        let response = self.send(request).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApplicationError::transport(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| ApplicationError::decode(e.to_string()))
    }

    /// Sends `request` and ignores the body.
    ///
    /// # Errors
    ///
    /// As [`send`](Self::send).
    pub async fn send_unit(&self, request: RequestBuilder) -> ApplicationResult<()> {
        self.send(request).await.map(|_| ())
    }
}
