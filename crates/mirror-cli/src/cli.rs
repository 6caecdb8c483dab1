//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Library Mirror - Replicate a content library to replica directories
#[derive(Parser, Debug)]
#[command(name = "mirror")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a TOML settings file; overrides the individual path options
    #[arg(short, long, global = true, env = "MIRROR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Root of the content library
    #[arg(long, global = true, env = "MIRROR_LIBRARY_PATH")]
    pub library_path: Option<String>,

    /// Comma-separated list of replica roots
    #[arg(long, global = true, env = "MIRROR_REPLICA_PATHS")]
    pub replica_paths: Option<String>,

    /// Where run history is persisted
    #[arg(long, global = true, env = "MIRROR_HISTORY_PATH")]
    pub history_path: Option<String>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Replicate the library to every configured replica
    Sync {
        /// Preview changes without applying them
        #[arg(long)]
        dry_run: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the current run state
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Probe library reachability and replica configuration
    Health {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Query the persisted run history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

/// History subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum HistoryAction {
    /// List recent runs, most recent first
    List {
        /// Maximum number of entries to return
        #[arg(long, default_value_t = 20)]
        limit: usize,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show aggregate history statistics
    Stats {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the most recent run entry
    Latest {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Delete the persisted history
    Clear,
}
