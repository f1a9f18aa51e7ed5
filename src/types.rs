//! Common types used throughout the KPA connector
//!
//! Shared type aliases, small serde enums, and timestamp helpers used
//! across multiple modules.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

// ============================================================================
// Catalog Mode
// ============================================================================

/// Why the catalog is being built.
///
/// Passed explicitly by the caller; in `Discovery` mode the internal
/// `*_responses_list` parent streams are hidden from the catalog, in `Sync`
/// mode everything is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogMode {
    /// Building a catalog to show to the end user
    #[default]
    Discovery,
    /// Building the full working catalog for a sync run
    Sync,
}

// ============================================================================
// Backoff Type
// ============================================================================

/// Type of backoff for retries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffType {
    /// Constant delay between retries
    Constant,
    /// Linear increase in delay
    Linear,
    /// Exponential increase in delay
    #[default]
    Exponential,
}

// ============================================================================
// Timestamp helpers
// ============================================================================

/// Read an epoch-milliseconds value from a JSON number or numeric string.
pub fn epoch_millis(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Convert epoch-milliseconds to an absolute UTC timestamp.
pub fn datetime_from_millis(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}

/// Convert epoch-milliseconds to an RFC 3339 UTC timestamp string.
pub fn rfc3339_from_millis(millis: i64) -> Option<String> {
    datetime_from_millis(millis).map(|dt| dt.to_rfc3339())
}

// ============================================================================
// Truthiness
// ============================================================================

/// Loose truthiness for field settings values.
///
/// The field metadata is produced by a dynamically-typed backend, so flags
/// like `multiple` arrive as booleans, numbers, or strings depending on the
/// form version.
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}
