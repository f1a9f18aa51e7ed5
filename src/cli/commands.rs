//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// KPA EHS forms connector CLI
#[derive(Parser, Debug)]
#[command(name = "kpa-connector")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Inline config JSON
    #[arg(long, global = true)]
    pub config_json: Option<String>,

    /// State file (JSON); bookmarks are written back here after a sync
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, global = true)]
    pub state_json: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the connection to the API
    Check,

    /// Print the stream catalog
    Discover {
        /// Include the internal *_responses_list parent streams
        #[arg(long)]
        full: bool,
    },

    /// Extract data from streams
    Sync {
        /// Streams to sync (comma-separated, empty = all)
        #[arg(long)]
        streams: Option<String>,

        /// Abort on the first stream failure
        #[arg(long)]
        fail_fast: bool,
    },
}
