//! Library Mirror CLI
//!
//! The command-line interface for replicating a content library to its
//! replica directories and inspecting run history.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands, HistoryAction};
use error::{CliError, Result};
use mirror_core::Settings;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing if verbose
    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    match cli.command {
        Some(ref command) => {
            let settings = load_settings(&cli)?;
            execute_command(command, &settings)
        }
        None => {
            // No command provided - show help hint
            println!("{} Library Mirror CLI", "mirror".green().bold());
            println!();
            println!("Run {} for available commands.", "mirror --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(command: &Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Sync { dry_run, json } => commands::run_sync(settings, *dry_run, *json),
        Commands::Status { json } => commands::run_status(settings, *json),
        Commands::Health { json } => commands::run_health(settings, *json),
        Commands::History { action } => match action {
            HistoryAction::List { limit, json } => {
                commands::run_history_list(settings, *limit, *json)
            }
            HistoryAction::Stats { json } => commands::run_history_stats(settings, *json),
            HistoryAction::Latest { json } => commands::run_history_latest(settings, *json),
            HistoryAction::Clear => commands::run_history_clear(settings),
        },
    }
}

/// Resolve settings from the config file when given, otherwise from the
/// individual options and their environment variables.
fn load_settings(cli: &Cli) -> Result<Settings> {
    if let Some(config) = &cli.config {
        return Ok(Settings::load(config)?);
    }

    let library_path = cli.library_path.as_deref().ok_or_else(|| {
        CliError::user("missing library path: pass --library-path or set MIRROR_LIBRARY_PATH")
    })?;
    let replica_paths = cli.replica_paths.as_deref().ok_or_else(|| {
        CliError::user("missing replica paths: pass --replica-paths or set MIRROR_REPLICA_PATHS")
    })?;

    Ok(Settings::from_parts(
        library_path,
        replica_paths,
        cli.history_path.as_deref(),
    )?)
}
