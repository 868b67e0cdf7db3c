//! # Configuration
//!
//! Application configuration loading and management.
//!
//! # Configuration Sources
//!
//! Configuration is loaded in the following order (later sources override earlier):
//! 1. Default values
//! 2. Configuration file (if exists)
//! 3. Environment variables (prefixed with `P2P_ESCROW_`)
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `P2P_ESCROW_CONFIG_FILE` | TOML file path | `config.toml` |
//! | `P2P_ESCROW_API_BASE_URL` | Escrow server base URL | `http://localhost:5000/api` |
//! | `P2P_ESCROW_API_TOKEN` | Bearer token | none |
//! | `P2P_ESCROW_API_REQUEST_TIMEOUT_MS` | Request timeout, 0 = none | `0` |
//! | `P2P_ESCROW_TRADE_SETTLEMENT_WINDOW_SECS` | Settlement window | `1800` |
//! | `P2P_ESCROW_TRADE_POLL_INTERVAL_MS` | Poll interval | `3000` |
//! | `P2P_ESCROW_NOTIFICATIONS_ENABLED` | Send emails | `true` |
//! | `P2P_ESCROW_NOTIFICATIONS_SERVICE_ID` | EmailJS service id | empty |
//! | `P2P_ESCROW_NOTIFICATIONS_TEMPLATE_ID` | EmailJS template id | empty |
//! | `P2P_ESCROW_NOTIFICATIONS_PUBLIC_KEY` | EmailJS public key | empty |
//! | `P2P_ESCROW_NOTIFICATIONS_ADMIN_RECIPIENT` | Admin review address | `admin@tradehub.com` |
//! | `P2P_ESCROW_LOG_LEVEL` | Log level | `info` |
//! | `P2P_ESCROW_LOG_FORMAT` | Log format (json/pretty) | `json` |
//!
//! # Examples
//!
//! ```ignore
//! use p2p_escrow::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! config.validate()?;
//! let timings = config.trade.timings();
//! ```

use crate::application::services::TradeTimings;
use crate::infrastructure::http::HttpClientConfig;
use crate::infrastructure::notifications::{EMAILJS_ENDPOINT, EmailJsConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "P2P_ESCROW_";

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse configuration.
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// Invalid configuration value.
    #[error("invalid config value for {field}: {message}")]
    InvalidValue {
        /// Field name.
        field: String,
        /// Error message.
        message: String,
    },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Escrow API Configuration
// ============================================================================

/// Escrow server connection.
#[derive(Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL, e.g. `http://localhost:5000/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token of the signed-in user.
    #[serde(default)]
    pub token: Option<String>,

    /// Request timeout in milliseconds; 0 leaves it to the transport.
    #[serde(default)]
    pub request_timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            request_timeout_ms: 0,
        }
    }
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url)
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl ApiConfig {
    /// HTTP client settings.
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        HttpClientConfig::new(self.base_url.clone())
            .with_token(self.token.clone())
            .with_timeout_ms(self.request_timeout_ms)
    }
}

// ============================================================================
// Trade Lifecycle Configuration
// ============================================================================

/// Lifecycle intervals and delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeConfig {
    /// Settlement window in seconds.
    #[serde(default = "default_settlement_window")]
    pub settlement_window_secs: u64,

    /// Background poll interval in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Countdown tick in milliseconds.
    #[serde(default = "default_countdown_tick")]
    pub countdown_tick_ms: u64,

    /// Delay before leaving a terminal trade.
    #[serde(default = "default_terminal_redirect")]
    pub terminal_redirect_delay_ms: u64,

    /// Delay before leaving an expired trade.
    #[serde(default = "default_expiry_redirect")]
    pub expiry_redirect_delay_ms: u64,

    /// Delay before leaving a cancelled trade.
    #[serde(default = "default_cancel_redirect")]
    pub cancel_redirect_delay_ms: u64,

    /// Delay before opening a new trade.
    #[serde(default = "default_initiate_redirect")]
    pub initiate_redirect_delay_ms: u64,

    /// Final warning window in seconds.
    #[serde(default = "default_expiring_threshold")]
    pub expiring_threshold_secs: u64,
}

impl Default for TradeConfig {
    fn default() -> Self {
        Self {
            settlement_window_secs: default_settlement_window(),
            poll_interval_ms: default_poll_interval(),
            countdown_tick_ms: default_countdown_tick(),
            terminal_redirect_delay_ms: default_terminal_redirect(),
            expiry_redirect_delay_ms: default_expiry_redirect(),
            cancel_redirect_delay_ms: default_cancel_redirect(),
            initiate_redirect_delay_ms: default_initiate_redirect(),
            expiring_threshold_secs: default_expiring_threshold(),
        }
    }
}

impl TradeConfig {
    /// Timings for the lifecycle services.
    #[must_use]
    pub fn timings(&self) -> TradeTimings {
        TradeTimings {
            settlement_window: Duration::from_secs(self.settlement_window_secs),
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            countdown_tick: Duration::from_millis(self.countdown_tick_ms),
            expiring_threshold: Duration::from_secs(self.expiring_threshold_secs),
            terminal_redirect_delay: Duration::from_millis(self.terminal_redirect_delay_ms),
            expiry_redirect_delay: Duration::from_millis(self.expiry_redirect_delay_ms),
            cancel_redirect_delay: Duration::from_millis(self.cancel_redirect_delay_ms),
            initiate_redirect_delay: Duration::from_millis(self.initiate_redirect_delay_ms),
        }
    }
}

// ============================================================================
// Notification Configuration
// ============================================================================

/// Email notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Send emails; when false notifications are only logged.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// EmailJS send endpoint.
    #[serde(default = "default_emailjs_endpoint")]
    pub endpoint: String,

    /// EmailJS service id.
    #[serde(default)]
    pub service_id: String,

    /// EmailJS template id.
    #[serde(default)]
    pub template_id: String,

    /// EmailJS public key.
    #[serde(default)]
    pub public_key: String,

    /// Admin review queue address.
    #[serde(default = "default_admin_recipient")]
    pub admin_recipient: String,

    /// Web app origin for CTA links.
    #[serde(default = "default_website_link")]
    pub website_link: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_emailjs_endpoint(),
            service_id: String::new(),
            template_id: String::new(),
            public_key: String::new(),
            admin_recipient: default_admin_recipient(),
            website_link: default_website_link(),
        }
    }
}

impl NotificationConfig {
    /// EmailJS sink settings.
    #[must_use]
    pub fn emailjs(&self, timeout_ms: u64) -> EmailJsConfig {
        EmailJsConfig {
            endpoint: self.endpoint.clone(),
            service_id: self.service_id.clone(),
            template_id: self.template_id.clone(),
            public_key: self.public_key.clone(),
            website_link: self.website_link.clone(),
            timeout_ms,
        }
    }

    /// Returns true if EmailJS credentials are present.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.service_id.trim().is_empty()
            && !self.template_id.trim().is_empty()
            && !self.public_key.trim().is_empty()
    }

    /// Admin address, `None` if blank.
    #[must_use]
    pub fn admin(&self) -> Option<String> {
        Some(self.admin_recipient.trim().to_string()).filter(|a| !a.is_empty())
    }
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Log format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (structured logging).
    #[default]
    Json,
    /// Pretty format (human-readable).
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Json,
        }
    }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Escrow server connection.
    #[serde(default)]
    pub api: ApiConfig,

    /// Lifecycle timings.
    #[serde(default)]
    pub trade: TradeConfig,

    /// Email notifications.
    #[serde(default)]
    pub notifications: NotificationConfig,

    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads configuration from environment variables and optional config file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading fails.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = std::env::var(format!("{ENV_PREFIX}CONFIG_FILE"))
            .unwrap_or_else(|_| "config.toml".to_string());
        Self::load_with(&config_path, |key| std::env::var(key).ok())
    }

    /// Loads from `path` (if it exists) and overrides through `env`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_with(
        path: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides(env);
        Ok(config)
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed TOML.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self, env: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| env(&format!("{ENV_PREFIX}{name}"));
        let number = |name: &str| var(name).and_then(|v| v.trim().parse::<u64>().ok());

        // API
        if let Some(url) = var("API_BASE_URL") {
            self.api.base_url = url;
        }
        if let Some(token) = var("API_TOKEN") {
            self.api.token = Some(token);
        }
        if let Some(ms) = number("API_REQUEST_TIMEOUT_MS") {
            self.api.request_timeout_ms = ms;
        }

        // Trade timings
        if let Some(secs) = number("TRADE_SETTLEMENT_WINDOW_SECS") {
            self.trade.settlement_window_secs = secs;
        }
        if let Some(ms) = number("TRADE_POLL_INTERVAL_MS") {
            self.trade.poll_interval_ms = ms;
        }
        if let Some(ms) = number("TRADE_COUNTDOWN_TICK_MS") {
            self.trade.countdown_tick_ms = ms;
        }

        // Notifications
        if let Some(enabled) = var("NOTIFICATIONS_ENABLED") {
            self.notifications.enabled = matches!(
                enabled.trim().to_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        if let Some(id) = var("NOTIFICATIONS_SERVICE_ID") {
            self.notifications.service_id = id;
        }
        if let Some(id) = var("NOTIFICATIONS_TEMPLATE_ID") {
            self.notifications.template_id = id;
        }
        if let Some(key) = var("NOTIFICATIONS_PUBLIC_KEY") {
            self.notifications.public_key = key;
        }
        if let Some(admin) = var("NOTIFICATIONS_ADMIN_RECIPIENT") {
            self.notifications.admin_recipient = admin;
        }
        if let Some(link) = var("NOTIFICATIONS_WEBSITE_LINK") {
            self.notifications.website_link = link;
        }

        // Logging configuration
        if let Some(level) = var("LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("LOG_FORMAT") {
            self.log.format = match format.to_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                _ => LogFormat::Json,
            };
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = self.api.base_url.trim();
        let host = base
            .strip_prefix("https://")
            .or_else(|| base.strip_prefix("http://"))
            .unwrap_or_default();
        if host.trim_matches('/').is_empty() {
            return Err(ConfigError::invalid(
                "api.base_url",
                format!("'{base}' is not an http(s) URL"),
            ));
        }

        let intervals = [
            ("trade.settlement_window_secs", self.trade.settlement_window_secs),
            ("trade.poll_interval_ms", self.trade.poll_interval_ms),
            ("trade.countdown_tick_ms", self.trade.countdown_tick_ms),
        ];
        if let Some((field, _)) = intervals.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::invalid(field, "must be greater than zero"));
        }

        let endpoint = self.notifications.endpoint.trim();
        if self.notifications.enabled
            && !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ConfigError::invalid(
                "notifications.endpoint",
                format!("'{endpoint}' is not an http(s) URL"),
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log.level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid(
                "log.level",
                format!(
                    "invalid log level '{}', must be one of: {:?}",
                    self.log.level, valid_levels
                ),
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Default Value Functions
// ============================================================================

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_settlement_window() -> u64 {
    1800
}

fn default_poll_interval() -> u64 {
    3000
}

fn default_countdown_tick() -> u64 {
    1000
}

fn default_terminal_redirect() -> u64 {
    3000
}

fn default_expiry_redirect() -> u64 {
    2000
}

fn default_cancel_redirect() -> u64 {
    1500
}

fn default_initiate_redirect() -> u64 {
    2000
}

fn default_expiring_threshold() -> u64 {
    60
}

fn default_true() -> bool {
    true
}

fn default_emailjs_endpoint() -> String {
    EMAILJS_ENDPOINT.to_string()
}

fn default_admin_recipient() -> String {
    "admin@tradehub.com".to_string()
}

fn default_website_link() -> String {
    "http://localhost:5173".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn valid() -> AppConfig {
        let mut config = AppConfig::default();
        config.notifications.service_id = "svc".to_string();
        config.notifications.template_id = "tpl".to_string();
        config.notifications.public_key = "pk".to_string();
        config
    }

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:5000/api");
        assert_eq!(config.api.request_timeout_ms, 0);
        assert_eq!(config.trade.poll_interval_ms, 3000);
        assert_eq!(config.notifications.admin_recipient, "admin@tradehub.com");
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn default_timings_match_lifecycle_defaults() {
        assert_eq!(TradeConfig::default().timings(), TradeTimings::default());
    }

    #[test]
    fn log_format_default() {
        assert_eq!(LogFormat::default(), LogFormat::Json);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [api]
            base_url = "https://escrow.example/api"

            [trade]
            poll_interval_ms = 5000

            [log]
            format = "pretty"
            "#,
        )
        .unwrap();
        assert_eq!(config.api.base_url, "https://escrow.example/api");
        assert_eq!(config.trade.poll_interval_ms, 5000);
        assert_eq!(config.trade.settlement_window_secs, 1800);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        assert!(matches!(
            AppConfig::from_toml("[api\nbase_url = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("P2P_ESCROW_API_TOKEN", "tok"),
            ("P2P_ESCROW_TRADE_POLL_INTERVAL_MS", "1000"),
            ("P2P_ESCROW_NOTIFICATIONS_ENABLED", "false"),
            ("P2P_ESCROW_LOG_FORMAT", "pretty"),
        ]
        .into_iter()
        .collect();
        let config = AppConfig::load_with("/nonexistent/config.toml", |k| {
            env.get(k).map(|v| (*v).to_string())
        })
        .unwrap();
        assert_eq!(config.api.token.as_deref(), Some("tok"));
        assert_eq!(config.trade.poll_interval_ms, 1000);
        assert!(!config.notifications.enabled);
        assert_eq!(config.log.format, LogFormat::Pretty);
    }

    #[test]
    fn debug_hides_token() {
        let mut config = AppConfig::default();
        config.api.token = Some("secret".to_string());
        assert!(!format!("{config:?}").contains("secret"));
    }

    mod validate {
        use super::*;

        #[test]
        fn accepts_valid() {
            assert!(valid().validate().is_ok());
        }

        #[test]
        fn rejects_invalid_log_level() {
            let mut config = valid();
            config.log.level = "invalid".to_string();
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_non_url_base() {
            let mut config = valid();
            config.api.base_url = "localhost:5000".to_string();
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidValue { ref field, .. }) if field == "api.base_url"
            ));
        }

        #[test]
        fn rejects_zero_interval() {
            let mut config = valid();
            config.trade.poll_interval_ms = 0;
            assert!(config.validate().is_err());
        }

        #[test]
        fn rejects_bad_emailjs_endpoint_only_when_enabled() {
            let mut config = valid();
            config.notifications.endpoint = "emailjs".to_string();
            assert!(config.validate().is_err());
            config.notifications.enabled = false;
            assert!(config.validate().is_ok());
        }

        #[test]
        fn missing_keys_mean_unconfigured() {
            assert!(!AppConfig::default().notifications.is_configured());
            assert!(valid().notifications.is_configured());
        }
    }
}
