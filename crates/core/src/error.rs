//! Error types for extraction operations.
//!
//! This module defines the main error type [`ExtractError`] which represents
//! all possible errors that can occur during fetching, parsing, and content
//! extraction.
//!
//! The enum is `Clone` on purpose: when several callers are deduplicated onto
//! one in-flight extraction, each waiter receives its own copy of the shared
//! outcome. Transport errors are therefore carried as strings rather than as
//! wrapped `reqwest::Error` values.

use thiserror::Error;

/// Main error type for extraction operations.
///
/// Validation failures are not represented here; they are data
/// (see [`crate::content::ValidationReport`]) and never abort an extraction.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractError {
    /// The origin exceeded its sliding-window request quota.
    ///
    /// Recoverable: callers should back off until `retry_after_ms` elapses.
    #[error("Rate limit exceeded for {origin}, retry in {retry_after_ms} ms")]
    RateLimitExceeded { origin: String, retry_after_ms: u64 },

    /// The fetch exceeded the configured timeout.
    ///
    /// Recoverable and retry-safe.
    #[error("Request timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    /// Transport-level failure: DNS, connection, TLS, or a read error.
    #[error("Network error: {0}")]
    Network(String),

    /// A URL could not be parsed or lacks a scheme.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTML could not be parsed, or a CSS selector was invalid in a context
    /// where it cannot be skipped.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// An unhandled failure inside a plugin hook.
    ///
    /// Plugins are extension code, not infrastructure: a hook failure aborts
    /// the extraction it was participating in, attributed to the named plugin.
    #[error("Plugin '{plugin}' failed: {message}")]
    Plugin { plugin: String, message: String },

    /// Serialization or deserialization of content failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The document yielded no usable content.
    #[error("No content could be extracted from the document")]
    NoContent,
}

/// Result type alias for [`ExtractError`].
pub type Result<T> = std::result::Result<T, ExtractError>;

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractError::InvalidUrl("not a url".to_string());
        assert!(err.to_string().contains("Invalid URL"));
    }

    #[test]
    fn test_rate_limit_error_fields() {
        let err = ExtractError::RateLimitExceeded { origin: "https://example.com".to_string(), retry_after_ms: 1500 };
        assert!(err.to_string().contains("example.com"));
        assert!(err.to_string().contains("1500"));
    }

    #[test]
    fn test_timeout_error() {
        let err = ExtractError::Timeout { timeout_ms: 30000 };
        assert!(err.to_string().contains("30000"));
    }

    #[test]
    fn test_plugin_error_names_the_plugin() {
        let err = ExtractError::Plugin { plugin: "annotator".to_string(), message: "boom".to_string() };
        assert!(err.to_string().contains("annotator"));
    }

    #[test]
    fn test_errors_are_cloneable() {
        let err = ExtractError::Network("connection reset".to_string());
        assert_eq!(err.clone(), err);
    }
}
