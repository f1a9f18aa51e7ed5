//! Engine types
//!
//! Sync configuration and run statistics.

/// Configuration for a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Abort the whole run on the first stream failure instead of
    /// continuing with the remaining streams
    pub fail_fast: bool,

    /// Incremental lower bound used when a stream has no bookmark yet,
    /// epoch-milliseconds
    pub start_date_millis: Option<i64>,
}

impl SyncConfig {
    /// Create a new sync config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set fail fast mode
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    /// Set the fallback start date
    #[must_use]
    pub fn with_start_date_millis(mut self, millis: Option<i64>) -> Self {
        self.start_date_millis = millis;
        self
    }
}

/// Statistics from a sync run
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Total records emitted
    pub records_synced: usize,
    /// Total pages fetched
    pub pages_fetched: u64,
    /// Streams synced to completion
    pub streams_synced: usize,
    /// Streams that failed
    pub errors: usize,
    /// Run duration in milliseconds
    pub duration_ms: u64,
}

impl SyncStats {
    /// Create new stats
    pub fn new() -> Self {
        Self::default()
    }

    /// Add emitted records
    pub fn add_records(&mut self, count: usize) {
        self.records_synced += count;
    }

    /// Add fetched pages
    pub fn add_pages(&mut self, count: u64) {
        self.pages_fetched += count;
    }

    /// Add a completed stream
    pub fn add_stream(&mut self) {
        self.streams_synced += 1;
    }

    /// Add a failed stream
    pub fn add_error(&mut self) {
        self.errors += 1;
    }

    /// Set duration
    pub fn set_duration(&mut self, ms: u64) {
        self.duration_ms = ms;
    }
}
