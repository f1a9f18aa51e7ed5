//! Connector configuration
//!
//! The connector is configured with a single JSON document. Only three
//! options are user-facing (`access_token`, `start_date`, `user_agent`);
//! the rest tune the HTTP layer and default to production values.

use crate::error::{Error, Result};
use crate::types::BackoffType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default base URL of the KPA EHS v1 API
pub const DEFAULT_BASE_URL: &str = "https://api.kpaehs.com/v1";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KpaConfig {
    /// Token attached to every request body
    pub access_token: String,

    /// Earliest record date to sync; used only when no bookmark exists yet
    #[serde(default)]
    pub start_date: Option<DateTime<Utc>>,

    /// Optional User-Agent header value
    #[serde(default)]
    pub user_agent: Option<String>,

    /// API base URL (overridable for testing)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP client tuning
    #[serde(default)]
    pub http: HttpConfig,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl KpaConfig {
    /// Create a config with just an access token and defaults for the rest
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            start_date: None,
            user_agent: None,
            base_url: default_base_url(),
            http: HttpConfig::default(),
        }
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&contents)?;
        Ok(config)
    }

    /// Load config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate required fields and URL shape
    pub fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(Error::missing_field("access_token"));
        }
        url::Url::parse(&self.base_url)?;
        if self.http.max_attempts == 0 {
            return Err(Error::InvalidConfigValue {
                field: "http.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The configured start date as epoch-milliseconds, if any
    pub fn start_timestamp_millis(&self) -> Option<i64> {
        self.start_date.map(|dt| dt.timestamp_millis())
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Total attempts per request (first try included)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Extra HTTP status codes treated as retriable, on top of 5xx
    #[serde(default = "default_extra_retry_statuses")]
    pub extra_retry_statuses: Vec<u16>,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Client-side rate limiting; `null` disables it
    #[serde(default = "default_rate_limit")]
    pub rate_limit: Option<RateLimitConfig>,

    /// Cooldown applied when the API reports `rate_limit_exceeded`.
    /// The API enforces a 120 second window.
    #[serde(default = "default_cooldown_ms")]
    pub rate_limit_cooldown_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout(),
            max_attempts: default_max_attempts(),
            extra_retry_statuses: default_extra_retry_statuses(),
            backoff: BackoffConfig::default(),
            rate_limit: default_rate_limit(),
            rate_limit_cooldown_ms: default_cooldown_ms(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    5
}

fn default_extra_retry_statuses() -> Vec<u16> {
    vec![429]
}

fn default_rate_limit() -> Option<RateLimitConfig> {
    Some(RateLimitConfig::default())
}

fn default_cooldown_ms() -> u64 {
    120_000
}

/// Backoff configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    1000
}

fn default_max_ms() -> u64 {
    60_000
}

/// Client-side rate limiting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Maximum requests per second
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,

    /// Burst size (max tokens in bucket)
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst_size: default_burst(),
        }
    }
}

fn default_rps() -> u32 {
    10
}

fn default_burst() -> u32 {
    10
}
