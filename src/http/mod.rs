//! HTTP layer
//!
//! One client for the whole connector: every KPA endpoint is a POST with a
//! JSON body carrying the access token. The client classifies responses,
//! retries transient failures with backoff, and honors the API's
//! rate-limit cooldown.

mod client;
mod rate_limit;

pub use client::KpaClient;
pub use rate_limit::RateLimiter;
