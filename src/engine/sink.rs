//! Output collaborator interface
//!
//! The engine hands each stream's declared schema, its records as they are
//! produced, and its final bookmark to a `RecordSink`. What happens beyond
//! that boundary (structured-output protocol, catalogs on the wire) is the
//! surrounding tooling's business.

use crate::error::Result;
use crate::types::{JsonObject, JsonValue};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;

/// Receiver for everything a sync run produces
#[async_trait]
pub trait RecordSink: Send {
    /// A stream's declared schema, announced before its first record
    async fn schema(
        &mut self,
        stream: &str,
        schema: &JsonValue,
        replication_key: Option<&str>,
    ) -> Result<()>;

    /// One normalized record
    async fn record(&mut self, stream: &str, record: JsonObject) -> Result<()>;

    /// A stream's bookmark to persist for the next run, epoch-milliseconds
    async fn bookmark(&mut self, stream: &str, bookmark: i64) -> Result<()>;
}

// ============================================================================
// Collecting sink
// ============================================================================

/// Sink that buffers everything in memory; used by tests and callers that
/// want the run's output as plain data.
#[derive(Debug, Default)]
pub struct CollectingSink {
    /// Declared schemas by stream
    pub schemas: HashMap<String, JsonValue>,
    /// Records by stream, in emission order
    pub records: HashMap<String, Vec<JsonObject>>,
    /// Final bookmarks by stream
    pub bookmarks: HashMap<String, i64>,
}

impl CollectingSink {
    /// Create an empty collecting sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Records collected for a stream
    pub fn stream_records(&self, stream: &str) -> &[JsonObject] {
        self.records.get(stream).map_or(&[], Vec::as_slice)
    }
}

#[async_trait]
impl RecordSink for CollectingSink {
    async fn schema(
        &mut self,
        stream: &str,
        schema: &JsonValue,
        _replication_key: Option<&str>,
    ) -> Result<()> {
        self.schemas.insert(stream.to_string(), schema.clone());
        Ok(())
    }

    async fn record(&mut self, stream: &str, record: JsonObject) -> Result<()> {
        self.records.entry(stream.to_string()).or_default().push(record);
        Ok(())
    }

    async fn bookmark(&mut self, stream: &str, bookmark: i64) -> Result<()> {
        self.bookmarks.insert(stream.to_string(), bookmark);
        Ok(())
    }
}

// ============================================================================
// JSONL sink
// ============================================================================

/// Sink that prints one JSON message per line to stdout
#[derive(Debug, Default)]
pub struct JsonlSink;

impl JsonlSink {
    /// Create a JSONL sink
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RecordSink for JsonlSink {
    async fn schema(
        &mut self,
        stream: &str,
        schema: &JsonValue,
        replication_key: Option<&str>,
    ) -> Result<()> {
        let mut message = json!({
            "type": "SCHEMA",
            "stream": stream,
            "schema": schema,
        });
        if let Some(key) = replication_key {
            message["replication_key"] = json!(key);
        }
        println!("{message}");
        Ok(())
    }

    async fn record(&mut self, stream: &str, record: JsonObject) -> Result<()> {
        println!(
            "{}",
            json!({"type": "RECORD", "stream": stream, "record": record})
        );
        Ok(())
    }

    async fn bookmark(&mut self, stream: &str, bookmark: i64) -> Result<()> {
        println!(
            "{}",
            json!({"type": "STATE", "stream": stream, "bookmark": bookmark})
        );
        Ok(())
    }
}
