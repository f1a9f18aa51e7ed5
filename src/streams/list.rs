//! List streams
//!
//! A pull-based lazy sequence over a paginated list endpoint. One page is
//! buffered at a time; the next page is requested only after the previous
//! page's records have been consumed, so fetch order is strictly
//! increasing page numbers.

use crate::error::Result;
use crate::http::KpaClient;
use crate::pagination::{PageToken, Pagination};
use crate::types::{epoch_millis, rfc3339_from_millis, JsonObject, JsonValue};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::debug;

use super::fixed::FixedStream;
use super::REPLICATION_KEY;

/// Lazy sequence of records from a paginated list endpoint
pub struct ListStream {
    client: Arc<KpaClient>,
    path: String,
    records_key: String,
    body: JsonObject,
    updated_after: Option<i64>,
    pagination: Pagination,
    convert_timestamps: bool,
    track_bookmark: bool,
    page: Option<PageToken>,
    buffer: VecDeque<JsonObject>,
    done: bool,
    pages_fetched: u64,
    max_updated: Option<i64>,
}

impl ListStream {
    /// The response summary stream for one form. Carries the form id in
    /// every request body, plus the incremental lower bound when one
    /// exists; tracks the maximum `updated` value seen for the bookmark.
    pub fn responses(client: Arc<KpaClient>, form_id: &str, updated_after: Option<i64>) -> Self {
        let mut body = JsonObject::new();
        body.insert("form_id".to_string(), json!(form_id));
        Self {
            client,
            path: "/responses.list".to_string(),
            records_key: "responses".to_string(),
            body,
            updated_after,
            pagination: Pagination::LastPage,
            convert_timestamps: true,
            track_bookmark: true,
            page: None,
            buffer: VecDeque::new(),
            done: false,
            pages_fetched: 0,
            max_updated: None,
        }
    }

    /// A fixed auxiliary stream; records pass through verbatim
    pub fn fixed(client: Arc<KpaClient>, stream: &FixedStream) -> Self {
        Self {
            client,
            path: stream.path.to_string(),
            records_key: stream.records_key.to_string(),
            body: JsonObject::new(),
            updated_after: None,
            pagination: Pagination::LastPage,
            convert_timestamps: false,
            track_bookmark: false,
            page: None,
            buffer: VecDeque::new(),
            done: false,
            pages_fetched: 0,
            max_updated: None,
        }
    }

    /// Next record, or `None` when the server signals no more pages.
    pub async fn next(&mut self) -> Result<Option<JsonObject>> {
        loop {
            if let Some(raw) = self.buffer.pop_front() {
                return Ok(Some(self.emit(raw)));
            }
            if self.done {
                return Ok(None);
            }
            self.fetch_page().await?;
        }
    }

    /// Maximum `updated` value observed across emitted summaries, for the
    /// stream's bookmark. Advanced only at emission, so abandoned pages
    /// never move replication forward.
    pub fn bookmark(&self) -> Option<i64> {
        self.max_updated
    }

    /// Pages fetched so far
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    async fn fetch_page(&mut self) -> Result<()> {
        let mut body = self.body.clone();
        if let Some(page) = self.page {
            body.insert("page".to_string(), json!(page));
        }
        if let Some(bound) = self.updated_after {
            body.insert("updated_after".to_string(), json!(bound));
        }

        let response = self.client.post(&self.path, JsonValue::Object(body)).await?;
        self.pages_fetched += 1;

        let records = response
            .get(&self.records_key)
            .and_then(JsonValue::as_array)
            .cloned()
            .unwrap_or_default();
        debug!(
            "Fetched page {} of {}: {} records",
            self.page.unwrap_or(1),
            self.path,
            records.len()
        );

        self.buffer.extend(
            records
                .into_iter()
                .filter_map(|r| r.as_object().cloned()),
        );

        self.page = self.pagination.next_token(self.page, &response);
        if self.page.is_none() {
            self.done = true;
        }
        Ok(())
    }

    fn emit(&mut self, raw: JsonObject) -> JsonObject {
        if self.track_bookmark {
            if let Some(updated) = raw.get(REPLICATION_KEY).and_then(epoch_millis) {
                if self.max_updated.is_none_or(|max| updated > max) {
                    self.max_updated = Some(updated);
                }
            }
        }

        if !self.convert_timestamps {
            return raw;
        }

        let mut record = raw;
        for key in ["created", "updated"] {
            if let Some(ts) = record.get(key).and_then(epoch_millis) {
                if let Some(formatted) = rfc3339_from_millis(ts) {
                    record.insert(key.to_string(), JsonValue::String(formatted));
                }
            }
        }
        record
    }
}
