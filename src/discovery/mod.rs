//! Form and field discovery
//!
//! Forms are enumerated once per run; each form's field metadata defines
//! the schema of its detail stream. Field metadata is fetched once per form
//! and memoized for the process lifetime; a restart is the only
//! invalidation trigger.

use crate::error::{Error, Result};
use crate::http::KpaClient;
use crate::schema::{infer_schema, JsonSchema};
use crate::types::{JsonObject, JsonValue};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// A discovered form: the unit from which one stream pair is derived
#[derive(Debug, Clone, Deserialize)]
pub struct Form {
    /// Opaque form identifier
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Raw form name as the API reports it
    #[serde(default)]
    pub name: String,
}

impl Form {
    /// Sanitized stream name for this form
    pub fn stream_name(&self) -> String {
        sanitize_form_name(&self.name)
    }
}

/// One named, typed slot within a form's schema
#[derive(Debug, Clone, Deserialize)]
pub struct Field {
    /// Opaque field identifier; keys the per-record value map
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    /// Display title, not necessarily unique within the form
    #[serde(default)]
    pub title: String,
    /// Type tag, e.g. "datetime", "counter", "sketch", "attachments"
    #[serde(rename = "type", default)]
    pub field_type: String,
    /// Free-form field settings (input type, style, multiple flag, default)
    #[serde(default)]
    pub settings: JsonObject,
}

/// Identifiers arrive as strings or numbers depending on the endpoint;
/// normalize both to strings.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    let value = JsonValue::deserialize(deserializer)?;
    match value {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number identifier, got {other}"
        ))),
    }
}

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w]+").expect("static regex"));

/// Clean a form name into a stream name: spaces become underscores, then
/// every non-word character is dropped.
pub fn sanitize_form_name(name: &str) -> String {
    NON_WORD.replace_all(&name.replace(' ', "_"), "").to_string()
}

// ============================================================================
// Fetchers
// ============================================================================

#[derive(Deserialize)]
struct FormsListEnvelope {
    #[serde(default)]
    forms: Vec<Form>,
}

#[derive(Deserialize)]
struct FormInfoEnvelope {
    #[serde(default)]
    form: FormInfo,
}

#[derive(Deserialize, Default)]
struct FormInfo {
    #[serde(default)]
    latest: FormRevision,
}

#[derive(Deserialize, Default)]
struct FormRevision {
    #[serde(default)]
    fields: Vec<Field>,
}

/// Enumerate all forms. Failure here is fatal for the whole run: no stream
/// can be discovered without the form list.
pub async fn fetch_forms(client: &KpaClient) -> Result<Vec<Form>> {
    let envelope: FormsListEnvelope = client.post_typed("/forms.list", json!({})).await?;
    debug!("Discovered {} forms", envelope.forms.len());
    Ok(envelope.forms)
}

/// Fetch the field metadata for one form. Failure here is fatal for that
/// form's pair of streams only.
pub async fn fetch_fields(client: &KpaClient, form_id: &str) -> Result<Vec<Field>> {
    let envelope: FormInfoEnvelope = client
        .post_typed("/forms.info", json!({ "form_id": form_id }))
        .await
        .map_err(|e| {
            Error::discovery(format!(
                "failed to fetch fields for form id {form_id}: {e}"
            ))
        })?;
    Ok(envelope.form.latest.fields)
}

// ============================================================================
// Per-form schema cache
// ============================================================================

/// Everything the detail stream needs to know about one form, computed once
#[derive(Debug)]
pub struct FormSchema {
    /// The form this schema belongs to
    pub form: Form,
    /// Field metadata snapshot taken at first access
    pub fields: Vec<Field>,
    /// Declared record schema
    pub schema: JsonSchema,
    /// Field id → resolved title
    pub resolution: HashMap<String, String>,
}

/// Explicit memoization of per-form (fields, schema, resolution) tuples.
///
/// Computed on first access, reused for the stream's full lifetime.
#[derive(Debug, Default)]
pub struct FormCache {
    inner: Mutex<HashMap<String, Arc<FormSchema>>>,
}

impl FormCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached schema for a form, fetching and inferring it on
    /// first access.
    pub async fn get_or_fetch(&self, client: &KpaClient, form: &Form) -> Result<Arc<FormSchema>> {
        let mut cache = self.inner.lock().await;
        if let Some(cached) = cache.get(&form.id) {
            return Ok(Arc::clone(cached));
        }

        let fields = fetch_fields(client, &form.id).await?;
        let inferred = infer_schema(&fields);
        let entry = Arc::new(FormSchema {
            form: form.clone(),
            fields,
            schema: inferred.schema,
            resolution: inferred.resolution,
        });
        cache.insert(form.id.clone(), Arc::clone(&entry));
        Ok(entry)
    }
}

#[cfg(test)]
mod tests;
