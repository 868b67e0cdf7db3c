//! # Notification Sinks
//!
//! - [`EmailJsSink`]: email through EmailJS
//! - [`LoggingSink`]: log only

pub mod emailjs;
pub mod logging;

pub use emailjs::{DEFAULT_CTA_TEXT, EMAILJS_ENDPOINT, EmailJsConfig, EmailJsSink};
pub use logging::LoggingSink;
