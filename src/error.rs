//! Error types for the KPA connector
//!
//! This module defines the error hierarchy for the whole crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.

use thiserror::Error;

/// The main error type for the KPA connector
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    /// Invalid connector configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// A required config field is absent or empty
    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    /// A config field holds an unusable value
    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    /// A body or config document failed to parse
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// The configured base URL does not parse
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    /// Transport-level failure from the HTTP client
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Fatal API response: a 4xx status or a 200 with `ok: false`.
    #[error("API error status code: {status}, response: {body}, response url: {url}")]
    Api {
        status: u16,
        body: String,
        url: String,
    },

    /// A retriable condition persisted through every attempt
    #[error("Retries exhausted after {attempts} attempts: {message}")]
    RetriesExhausted { attempts: u32, message: String },

    // ============================================================================
    // Discovery Errors
    // ============================================================================
    /// Forms or field discovery failed
    #[error("Discovery failed: {message}")]
    Discovery { message: String },

    /// A selected stream does not exist
    #[error("Stream '{stream}' not found in catalog")]
    StreamNotFound { stream: String },

    // ============================================================================
    // State Errors
    // ============================================================================
    /// State could not be loaded or persisted
    #[error("State error: {message}")]
    State { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    /// Filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    /// Anything without a better home
    #[error("{0}")]
    Other(String),

    /// Errors bubbled up from callers using anyhow
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create a fatal API error carrying the status, body, and URL
    pub fn api(status: u16, body: impl Into<String>, url: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
            url: url.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery(message: impl Into<String>) -> Self {
        Self::Discovery {
            message: message.into(),
        }
    }

    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Check if this error came back from the API as unrecoverable.
    ///
    /// Fatal errors abort the stream invocation that issued them; everything
    /// transient is retried inside the client before surfacing.
    pub fn is_fatal_api(&self) -> bool {
        matches!(self, Error::Api { .. })
    }
}

/// Result type alias for the KPA connector
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", message.into(), inner))
        })
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let inner = e.into();
            Error::Other(format!("{}: {}", f(), inner))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::missing_field("access_token");
        assert_eq!(
            err.to_string(),
            "Missing required config field: access_token"
        );

        let err = Error::api(404, "Not found", "https://api.kpaehs.com/v1/forms.list");
        let text = err.to_string();
        assert!(text.contains("404"));
        assert!(text.contains("Not found"));
        assert!(text.contains("/forms.list"));
    }

    #[test]
    fn test_is_fatal_api() {
        assert!(Error::api(400, "", "").is_fatal_api());
        assert!(!Error::config("test").is_fatal_api());
        assert!(!Error::RetriesExhausted {
            attempts: 5,
            message: "status code: 503".into()
        }
        .is_fatal_api());
    }

    #[test]
    fn test_result_context() {
        let result: Result<()> = Err(Error::config("inner"));
        let with_context = result.context("outer");
        assert!(with_context
            .unwrap_err()
            .to_string()
            .contains("outer: Configuration error: inner"));
    }
}
