//! KPA API client with retry, backoff, and rate-limit cooldown
//!
//! Issues one POST per call and classifies the response:
//! - 200 with body `error == "rate_limit_exceeded"`: retriable, after a
//!   mandatory cooldown suspension
//! - configured extra-retry statuses or 5xx: retriable
//! - 4xx, or 200 with body `ok == false`: fatal, never retried
//! - anything else: success, parsed JSON body
//!
//! Retriable outcomes are retried with exponential backoff (factor 2) up to
//! a bounded number of attempts; exhaustion surfaces as a
//! `RetriesExhausted` error.

use super::rate_limit::RateLimiter;
use crate::config::KpaConfig;
use crate::error::{Error, Result};
use crate::types::{BackoffType, JsonValue};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome of a single request attempt
enum Attempt {
    /// Parsed JSON body of a successful response
    Success(JsonValue),
    /// Transient failure; the message describes the condition for logging
    /// and for the retries-exhausted error
    Retriable(String),
}

/// HTTP client for the KPA EHS v1 API
pub struct KpaClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    max_attempts: u32,
    extra_retry_statuses: Vec<u16>,
    backoff_type: BackoffType,
    initial_backoff: Duration,
    max_backoff: Duration,
    cooldown: Duration,
    rate_limiter: Option<RateLimiter>,
}

impl KpaClient {
    /// Build a client from the connector config
    pub fn new(config: &KpaConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.timeout_seconds));
        if let Some(agent) = &config.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let client = builder.build()?;

        let rate_limiter = config.http.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: config.access_token.clone(),
            max_attempts: config.http.max_attempts.max(1),
            extra_retry_statuses: config.http.extra_retry_statuses.clone(),
            backoff_type: config.http.backoff.backoff_type,
            initial_backoff: Duration::from_millis(config.http.backoff.initial_ms),
            max_backoff: Duration::from_millis(config.http.backoff.max_ms),
            cooldown: Duration::from_millis(config.http.rate_limit_cooldown_ms),
            rate_limiter,
        })
    }

    /// The base URL this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check if client-side rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// POST to an endpoint path with a JSON body; the access token is
    /// injected into the body before sending.
    ///
    /// Retries retriable outcomes; fatal outcomes fail immediately.
    pub async fn post(&self, path: &str, body: JsonValue) -> Result<JsonValue> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));

        let mut payload = match body {
            JsonValue::Object(map) => map,
            JsonValue::Null => serde_json::Map::new(),
            other => {
                return Err(Error::Other(format!(
                    "request body must be a JSON object, got {other}"
                )))
            }
        };
        payload.insert("token".to_string(), json!(self.token));
        let payload = JsonValue::Object(payload);

        let mut last_message = String::new();
        for attempt in 1..=self.max_attempts {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }

            match self.execute_once(&url, &payload).await? {
                Attempt::Success(value) => {
                    debug!("POST {url} succeeded on attempt {attempt}");
                    return Ok(value);
                }
                Attempt::Retriable(message) => {
                    last_message = message;
                    if attempt < self.max_attempts {
                        let delay = self.backoff_delay(attempt - 1);
                        warn!(
                            "POST {url} retriable failure ({last_message}), \
                             attempt {attempt}/{}, retrying in {delay:?}",
                            self.max_attempts
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(Error::RetriesExhausted {
            attempts: self.max_attempts,
            message: last_message,
        })
    }

    /// POST and deserialize the response envelope into a typed value
    pub async fn post_typed<T: DeserializeOwned>(&self, path: &str, body: JsonValue) -> Result<T> {
        let value = self.post(path, body).await?;
        let typed = serde_json::from_value(value)?;
        Ok(typed)
    }

    /// One request/classification cycle. Fatal conditions come back as
    /// `Err`; transport failures and retriable statuses as
    /// `Attempt::Retriable`.
    async fn execute_once(&self, url: &str, payload: &JsonValue) -> Result<Attempt> {
        let response = match self.client.post(url).json(payload).send().await {
            Ok(response) => response,
            // Timeouts and connection failures are indistinguishable from a
            // flaky network here; all transport errors are retriable.
            Err(e) => return Ok(Attempt::Retriable(format!("transport error: {e}"))),
        };

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => return Ok(Attempt::Retriable(format!("failed to read body: {e}"))),
        };
        let message = format!(
            "status code: {status}, response: {text}, response url: {final_url}"
        );

        if status == 200 {
            let body: JsonValue = serde_json::from_str(&text)?;
            if body.get("error").and_then(JsonValue::as_str) == Some("rate_limit_exceeded") {
                info!(
                    "Rate limit exceeded, sleeping for {:?} before retrying...",
                    self.cooldown
                );
                tokio::time::sleep(self.cooldown).await;
                return Ok(Attempt::Retriable(message));
            }
            if body.get("ok").and_then(JsonValue::as_bool) == Some(false) {
                return Err(Error::api(status, text, final_url));
            }
            return Ok(Attempt::Success(body));
        }

        if self.extra_retry_statuses.contains(&status) || (500..600).contains(&status) {
            return Ok(Attempt::Retriable(message));
        }

        if (400..500).contains(&status) {
            return Err(Error::api(status, text, final_url));
        }

        // Unusual but non-error status: parse whatever came back.
        let body: JsonValue = serde_json::from_str(&text)?;
        Ok(Attempt::Success(body))
    }

    /// Backoff delay for a given 0-based attempt index
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff * (attempt + 1),
            BackoffType::Exponential => {
                let factor = 2u32.saturating_pow(attempt);
                self.initial_backoff * factor
            }
        };

        std::cmp::min(delay, self.max_backoff)
    }
}

impl std::fmt::Debug for KpaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KpaClient")
            .field("base_url", &self.base_url)
            .field("max_attempts", &self.max_attempts)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}
