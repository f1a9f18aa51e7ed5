//! Detail streams
//!
//! The detail stream consumes record identifiers produced by its form's
//! list stream. Each identifier costs exactly one unpaginated request; the
//! payload is flattened against the form's cached schema and deduplicated
//! by identifier within the run.

use crate::discovery::FormSchema;
use crate::error::Result;
use crate::http::KpaClient;
use crate::normalize::{normalize, RawResponse};
use crate::types::{JsonObject, JsonValue};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;

/// Normalizing fetcher for one form's detail records
pub struct DetailStream {
    client: Arc<KpaClient>,
    form: Arc<FormSchema>,
    /// Identifiers already normalized in this run. Private to this stream
    /// instance; discarded when the run ends.
    seen_ids: HashSet<String>,
}

impl DetailStream {
    /// Create a detail stream over a form's cached schema
    pub fn new(client: Arc<KpaClient>, form: Arc<FormSchema>) -> Self {
        Self {
            client,
            form,
            seen_ids: HashSet::new(),
        }
    }

    /// Fetch and normalize one record by identifier.
    ///
    /// Returns `None` for a duplicate identifier (dropped, not emitted).
    pub async fn fetch(&mut self, response_id: &JsonValue) -> Result<Option<JsonObject>> {
        let envelope = self
            .client
            .post(
                "/responses.info",
                json!({
                    "form_id": self.form.form.id,
                    "response_id": response_id,
                }),
            )
            .await?;

        let raw: RawResponse =
            serde_json::from_value(envelope.get("response").cloned().unwrap_or(JsonValue::Null))?;

        Ok(normalize(
            &raw,
            &self.form.schema,
            &self.form.resolution,
            &mut self.seen_ids,
        ))
    }

    /// Number of distinct identifiers normalized so far
    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }
}
