//! Execution engine
//!
//! Composes discovery, pagination, schema inference, and normalization into
//! the per-form stream pairs and drives a full run: check, discover, sync.
//!
//! Error isolation follows the API's blast radius: the top-level forms
//! enumeration failing aborts the run, one form's field discovery or fetch
//! failing aborts only that form's pair, and independent streams keep
//! going.

mod sink;
mod types;

pub use sink::{CollectingSink, JsonlSink, RecordSink};
pub use types::{SyncConfig, SyncStats};

use crate::discovery::{fetch_forms, Form, FormCache};
use crate::error::{Error, Result};
use crate::http::KpaClient;
use crate::state::StateManager;
use crate::streams::{
    build_catalog, descriptors_for_forms, fixed_schema, Catalog, DetailStream, FixedStream,
    ListStream, StreamDescriptor, StreamKind, REPLICATION_KEY, RESPONSE_LIST_SCHEMA,
};
use crate::types::{CatalogMode, JsonValue};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Orchestrates a connector run against one configured account
pub struct SyncEngine {
    client: Arc<KpaClient>,
    cache: FormCache,
    state: StateManager,
    config: SyncConfig,
    stats: SyncStats,
}

impl SyncEngine {
    /// Create a new engine
    pub fn new(client: Arc<KpaClient>, state: StateManager) -> Self {
        Self {
            client,
            cache: FormCache::new(),
            state,
            config: SyncConfig::default(),
            stats: SyncStats::default(),
        }
    }

    /// Set sync configuration
    #[must_use]
    pub fn with_config(mut self, config: SyncConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the state manager
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Statistics from the last sync
    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    /// Verify the connection by enumerating forms once
    pub async fn check(&self) -> Result<()> {
        let forms = fetch_forms(&self.client).await?;
        info!("Connection OK, {} forms visible", forms.len());
        Ok(())
    }

    /// Build the stream catalog.
    ///
    /// The mode is explicit: `Discovery` hides internal parent streams,
    /// `Sync` shows the full working set.
    pub async fn discover(&self, mode: CatalogMode) -> Result<Catalog> {
        let forms = fetch_forms(&self.client).await?;
        Ok(build_catalog(&self.client, &self.cache, &forms, mode).await)
    }

    /// Run a sync, emitting into the sink.
    ///
    /// `selection` limits the run to the named streams (a form's detail
    /// stream name selects its whole pair); `None` syncs everything.
    pub async fn sync(
        &mut self,
        selection: Option<&[String]>,
        sink: &mut dyn RecordSink,
    ) -> Result<SyncStats> {
        let start = Instant::now();
        self.stats = SyncStats::new();

        // Global fatal: nothing can run without the form list.
        let forms = fetch_forms(&self.client).await?;

        let descriptors = descriptors_for_forms(&forms);
        if let Some(selection) = selection {
            validate_selection(selection, &descriptors)?;
        }

        for descriptor in &descriptors {
            let result = match &descriptor.kind {
                StreamKind::Fixed(fixed) => {
                    if !selected(selection, &[descriptor.name.as_str()]) {
                        continue;
                    }
                    self.sync_fixed(*fixed, sink).await.map(|()| 1)
                }
                StreamKind::FormDetail { form } => {
                    let list_name = StreamDescriptor::form_list(form).name;
                    if !selected(selection, &[descriptor.name.as_str(), list_name.as_str()]) {
                        continue;
                    }
                    self.sync_form(form, sink).await.map(|()| 2)
                }
                // A parent list stream is driven by its form's detail stream.
                StreamKind::FormList { .. } => continue,
            };

            match result {
                Ok(streams) => {
                    for _ in 0..streams {
                        self.stats.add_stream();
                    }
                }
                Err(e) => {
                    self.stats.add_error();
                    error!("Stream '{}' failed: {e}", descriptor.name);
                    if self.config.fail_fast {
                        return Err(e);
                    }
                }
            }
        }

        self.stats.set_duration(start.elapsed().as_millis() as u64);
        info!(
            "Sync complete: {} records across {} streams, {} errors",
            self.stats.records_synced, self.stats.streams_synced, self.stats.errors
        );
        Ok(self.stats.clone())
    }

    /// Sync one fixed stream in full
    async fn sync_fixed(&mut self, fixed: FixedStream, sink: &mut dyn RecordSink) -> Result<()> {
        info!("Syncing stream: {}", fixed.name);
        sink.schema(fixed.name, &fixed_schema(fixed.name).to_json(), None)
            .await?;

        let mut stream = ListStream::fixed(Arc::clone(&self.client), &fixed);
        while let Some(record) = stream.next().await? {
            sink.record(fixed.name, record).await?;
            self.stats.add_records(1);
        }
        self.stats.add_pages(stream.pages_fetched());
        Ok(())
    }

    /// Sync one form's pair: summaries from the list stream, one detail
    /// fetch per summary, bookmark advance at the end.
    async fn sync_form(&mut self, form: &Form, sink: &mut dyn RecordSink) -> Result<()> {
        // Schema first; without it the pair cannot run.
        let form_schema = self.cache.get_or_fetch(&self.client, form).await?;

        let list_name = StreamDescriptor::form_list(form).name;
        let detail_name = form.stream_name();
        info!("Syncing stream pair: {list_name} / {detail_name}");

        sink.schema(
            &list_name,
            &RESPONSE_LIST_SCHEMA.to_json(),
            Some(REPLICATION_KEY),
        )
        .await?;
        sink.schema(&detail_name, &form_schema.schema.to_json(), None)
            .await?;

        // Bookmark wins over the configured start date.
        let updated_after = match self.state.get_bookmark(&list_name).await {
            Some(bookmark) => Some(bookmark),
            None => self.config.start_date_millis,
        };

        let mut list = ListStream::responses(Arc::clone(&self.client), &form.id, updated_after);
        let mut detail = DetailStream::new(Arc::clone(&self.client), Arc::clone(&form_schema));

        while let Some(summary) = list.next().await? {
            let response_id = summary.get("id").cloned().unwrap_or(JsonValue::Null);
            sink.record(&list_name, summary).await?;
            self.stats.add_records(1);

            if let Some(record) = detail.fetch(&response_id).await? {
                sink.record(&detail_name, record).await?;
                self.stats.add_records(1);
            }
        }
        self.stats.add_pages(list.pages_fetched());

        if let Some(observed) = list.bookmark() {
            self.state.advance_bookmark(&list_name, observed).await?;
            if let Some(bookmark) = self.state.get_bookmark(&list_name).await {
                sink.bookmark(&list_name, bookmark).await?;
            }
        }

        Ok(())
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("client", &self.client)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

/// Whether any of a stream group's names is in the selection
fn selected(selection: Option<&[String]>, names: &[&str]) -> bool {
    match selection {
        None => true,
        Some(list) => names.iter().any(|name| list.iter().any(|s| s == name)),
    }
}

/// Reject selections naming streams that do not exist
fn validate_selection(selection: &[String], descriptors: &[StreamDescriptor]) -> Result<()> {
    for name in selection {
        if !descriptors.iter().any(|d| &d.name == name) {
            return Err(Error::StreamNotFound {
                stream: name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
