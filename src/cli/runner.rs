//! CLI command runner
//!
//! Wires config → client → engine → sink for each subcommand.

use super::commands::{Cli, Commands};
use crate::config::KpaConfig;
use crate::engine::{JsonlSink, SyncConfig, SyncEngine};
use crate::error::{Error, Result};
use crate::http::KpaClient;
use crate::state::StateManager;
use crate::types::CatalogMode;
use std::sync::Arc;
use tracing::info;

/// Executes a parsed CLI invocation
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a runner for a parsed CLI
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the selected command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let client = Arc::new(KpaClient::new(&config)?);
        let state = self.load_state()?;
        let start_date_millis = config.start_timestamp_millis();

        match &self.cli.command {
            Commands::Check => {
                let engine = SyncEngine::new(client, state);
                engine.check().await?;
                println!("Connection OK");
                Ok(())
            }

            Commands::Discover { full } => {
                let mode = if *full {
                    CatalogMode::Sync
                } else {
                    CatalogMode::Discovery
                };
                let engine = SyncEngine::new(client, state);
                let catalog = engine.discover(mode).await?;
                println!("{}", serde_json::to_string_pretty(&catalog)?);
                Ok(())
            }

            Commands::Sync { streams, fail_fast } => {
                let selection: Option<Vec<String>> = streams.as_ref().map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                });

                let sync_config = SyncConfig::new()
                    .with_fail_fast(*fail_fast)
                    .with_start_date_millis(start_date_millis);

                let mut engine = SyncEngine::new(client, state).with_config(sync_config);
                let mut sink = JsonlSink::new();
                let stats = engine.sync(selection.as_deref(), &mut sink).await?;

                engine.state().save().await?;
                info!(
                    "Synced {} records across {} streams in {}ms ({} errors)",
                    stats.records_synced,
                    stats.streams_synced,
                    stats.duration_ms,
                    stats.errors
                );
                Ok(())
            }
        }
    }

    fn load_config(&self) -> Result<KpaConfig> {
        if let Some(json) = &self.cli.config_json {
            return KpaConfig::from_json(json);
        }
        if let Some(path) = &self.cli.config {
            return KpaConfig::from_file(path);
        }
        Err(Error::config("provide --config or --config-json"))
    }

    fn load_state(&self) -> Result<StateManager> {
        if let Some(json) = &self.cli.state_json {
            return StateManager::from_json(json);
        }
        if let Some(path) = &self.cli.state {
            return StateManager::from_file(path);
        }
        Ok(StateManager::in_memory())
    }
}
