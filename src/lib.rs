// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # KPA EHS Forms Connector
//!
//! Extracts records from the KPA EHS v1 API, whose schema is not fixed at
//! build time: every form defines its own fields, and each field's metadata
//! determines how its values are typed and flattened.
//!
//! ## Features
//!
//! - **Dynamic schema discovery**: one inferred schema per form, from its
//!   field metadata
//! - **Two-level streams**: a paginated list stream of record summaries
//!   feeding one detail fetch per record, deduplicated by identifier
//! - **Incremental sync**: per-stream `updated` bookmarks persisted between
//!   runs
//! - **Resilient HTTP**: bounded exponential backoff plus the API's
//!   mandatory rate-limit cooldown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use kpa_connector::{CollectingSink, KpaClient, KpaConfig, StateManager, SyncEngine};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> kpa_connector::Result<()> {
//!     let config = KpaConfig::new("my-access-token");
//!     let client = Arc::new(KpaClient::new(&config)?);
//!
//!     let mut engine = SyncEngine::new(client, StateManager::in_memory());
//!     let mut sink = CollectingSink::new();
//!     let stats = engine.sync(None, &mut sink).await?;
//!
//!     println!("{} records", stats.records_synced);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          SyncEngine                             │
//! │  check()        discover(mode) → Catalog                        │
//! │  sync(selection, sink) → records + bookmarks into RecordSink    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌───────────┬───────────┬──────┴──────┬─────────────┬────────────┐
//! │ Discovery │  Schema   │   Streams   │  Normalize  │   State    │
//! ├───────────┼───────────┼─────────────┼─────────────┼────────────┤
//! │ forms.list│ rule table│ list/detail │ flatten     │ bookmarks  │
//! │ forms.info│ titles    │ pagination  │ dedup       │ atomic save│
//! │ memoized  │ fixed meta│ fixed aux   │ timestamps  │            │
//! └───────────┴───────────┴─────────────┴─────────────┴────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the connector
pub mod error;

/// Common types and type aliases
pub mod types;

/// Connector configuration
pub mod config;

/// HTTP client with retry, backoff, and rate limiting
pub mod http;

/// Pagination over the list endpoints
pub mod pagination;

/// Form and field discovery
pub mod discovery;

/// Schema model and inference
pub mod schema;

/// Record flattening and deduplication
pub mod normalize;

/// Replication state and bookmarks
pub mod state;

/// Stream descriptors, catalog, and stream implementations
pub mod streams;

/// Main execution engine
pub mod engine;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use config::KpaConfig;
pub use engine::{CollectingSink, JsonlSink, RecordSink, SyncConfig, SyncEngine, SyncStats};
pub use error::{Error, Result};
pub use http::KpaClient;
pub use state::StateManager;
pub use streams::{Catalog, CatalogStream};
pub use types::CatalogMode;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
