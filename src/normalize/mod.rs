//! Record normalization
//!
//! The detail endpoint returns one deeply nested payload per record: a map
//! from field id to a value container whose inner shape depends on the
//! field kind. Normalization flattens that payload into a flat record
//! matching the form's inferred schema, and drops records whose identifier
//! was already seen in this run.

use crate::schema::{JsonSchema, KPA_CREATED, KPA_ID, KPA_UPDATED};
use crate::types::{epoch_millis, rfc3339_from_millis, JsonObject, JsonValue};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Raw detail payload as returned by `/responses.info`
#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    /// Record identifier
    pub id: JsonValue,
    /// Creation time, epoch-milliseconds
    #[serde(default)]
    pub created: JsonValue,
    /// Update time, epoch-milliseconds
    #[serde(default)]
    pub updated: JsonValue,
    /// The wire nests per-field values under `latest.responses`
    #[serde(default)]
    latest: LatestResponses,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LatestResponses {
    #[serde(default)]
    responses: JsonObject,
}

impl RawResponse {
    /// The per-field value map: field id → value container
    pub fn values(&self) -> &JsonObject {
        &self.latest.responses
    }

    /// Canonical string form of the record identifier, for dedup
    pub fn id_key(&self) -> String {
        match &self.id {
            JsonValue::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Flatten a raw detail payload into a record matching the form's schema.
///
/// Returns `None` when the record's identifier is already in `seen_ids`
/// (duplicate: dropped, not emitted). Otherwise the identifier is added to
/// the set and a complete flat record comes back; partial records are never
/// produced.
///
/// Field ids with no entry in `resolution` are skipped silently: a value
/// can outlive its field when the form's metadata has drifted since the
/// record was written.
pub fn normalize(
    raw: &RawResponse,
    schema: &JsonSchema,
    resolution: &HashMap<String, String>,
    seen_ids: &mut HashSet<String>,
) -> Option<JsonObject> {
    let id_key = raw.id_key();
    if seen_ids.contains(&id_key) {
        return None;
    }
    seen_ids.insert(id_key);

    let mut record = JsonObject::new();
    record.insert(KPA_ID.to_string(), raw.id.clone());
    record.insert(KPA_CREATED.to_string(), millis_to_timestamp(&raw.created));
    record.insert(KPA_UPDATED.to_string(), millis_to_timestamp(&raw.updated));

    for (field_id, container) in raw.values() {
        let Some(title) = resolution.get(field_id) else {
            continue;
        };

        let Some(inner) = container.get("value").and_then(JsonValue::as_object) else {
            continue;
        };
        if inner.is_empty() {
            continue;
        }

        if let Some(value) = flatten_container(inner, is_string_typed(schema, title)) {
            record.insert(title.clone(), value);
        }
    }

    Some(record)
}

/// Extract a scalar or array from a value container, by precedence:
/// 1. string-typed field with a non-empty `values` sequence → first element
/// 2. non-null `attachments` → the array verbatim
/// 3. `utc_time` epoch-millis → UTC timestamp
/// 4. the value under the container's first remaining key
fn flatten_container(inner: &JsonObject, string_typed: bool) -> Option<JsonValue> {
    if string_typed {
        if let Some(values) = inner.get("values").and_then(JsonValue::as_array) {
            if let Some(first) = values.first() {
                return Some(first.clone());
            }
        }
    }

    if let Some(attachments) = inner.get("attachments") {
        if !attachments.is_null() {
            return Some(attachments.clone());
        }
    }

    if let Some(millis) = inner.get("utc_time").and_then(epoch_millis) {
        return Some(millis_value(millis));
    }

    inner.iter().next().map(|(_, value)| value.clone())
}

fn is_string_typed(schema: &JsonSchema, title: &str) -> bool {
    schema
        .get_property(title)
        .is_some_and(|p| p.is_string_typed())
}

fn millis_to_timestamp(raw: &JsonValue) -> JsonValue {
    epoch_millis(raw).map_or(JsonValue::Null, millis_value)
}

fn millis_value(millis: i64) -> JsonValue {
    rfc3339_from_millis(millis).map_or(JsonValue::Null, JsonValue::String)
}
