//! Sync, status, and health command implementations

use colored::Colorize;

use mirror_core::{ReplicaOutcome, RunStats, Settings, SyncStatus};

use crate::error::{CliError, Result};

use super::build_coordinator;

/// Run the sync command
///
/// Replicates the library to every configured replica on the calling
/// thread and prints the per-replica statistics.
pub fn run_sync(settings: &Settings, dry_run: bool, json: bool) -> Result<()> {
    if !json {
        println!(
            "{} Synchronizing library to {} replica(s)...",
            "=>".blue().bold(),
            settings.replica_paths.len()
        );
    }

    let coordinator = build_coordinator(settings);
    let Some(entry) = coordinator.run_blocking(dry_run) else {
        println!(
            "{} A sync run is already in progress.",
            "BUSY".yellow().bold()
        );
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
        return Ok(());
    }

    match entry.status {
        SyncStatus::Completed => {
            let verb = if dry_run { "previewed" } else { "completed" };
            println!(
                "{} Sync {} in {:.2}s:",
                "OK".green().bold(),
                verb,
                entry.duration
            );
            for (replica, outcome) in &entry.results {
                match outcome {
                    ReplicaOutcome::Stats(stats) => {
                        println!("   {} {}: {}", "+".green(), replica.cyan(), summarize(stats));
                    }
                    ReplicaOutcome::Failed { error } => {
                        println!("   {} {}: {}", "!".red(), replica.cyan(), error);
                    }
                }
            }
            Ok(())
        }
        SyncStatus::Failed => {
            println!(
                "{} Sync failed: {}",
                "ERROR".red().bold(),
                entry.error.as_deref().unwrap_or("unknown error")
            );
            Err(CliError::user("Sync failed"))
        }
    }
}

/// Run the status command
///
/// Shows the current run state: idle or in progress, the last completion
/// timestamp, and the last result or error.
pub fn run_status(settings: &Settings, json: bool) -> Result<()> {
    let coordinator = build_coordinator(settings);
    let state = coordinator.status();

    if json {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    let phase = if state.in_progress {
        "in progress".yellow().bold()
    } else {
        "idle".green().bold()
    };
    println!("{} Sync status: {}", "=>".blue().bold(), phase);

    match state.last_sync {
        Some(timestamp) => println!(
            "   last completed: {}",
            timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => println!("   last completed: never"),
    }
    if let Some(error) = &state.last_error {
        println!("   {} {}", "!".red(), error);
    }

    Ok(())
}

/// Run the health command
///
/// Probes library reachability and reports the replica configuration.
pub fn run_health(settings: &Settings, json: bool) -> Result<()> {
    let coordinator = build_coordinator(settings);
    let health = coordinator.engine().health();

    if json {
        println!("{}", serde_json::to_string_pretty(&health)?);
        return Ok(());
    }

    if health.library_accessible && health.library_listable {
        println!(
            "{} Library is reachable; {} replica(s) configured.",
            "OK".green().bold(),
            health.replica_count
        );
    } else {
        println!(
            "{} Library at {} is not reachable.",
            "ERROR".red().bold(),
            settings.library_path.display().to_string().cyan()
        );
    }

    Ok(())
}

fn summarize(stats: &RunStats) -> String {
    format!(
        "{} added, {} updated, {} deleted, {} unchanged, {} ignored, {} errors",
        stats.added, stats.updated, stats.deleted, stats.unchanged, stats.ignored, stats.errors
    )
}
