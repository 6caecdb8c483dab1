//! History query command implementations

use colored::Colorize;

use mirror_core::{Settings, SyncHistoryEntry, SyncStatus, SyncType};

use crate::error::Result;

use super::build_store;

/// Run the history list command
pub fn run_history_list(settings: &Settings, limit: usize, json: bool) -> Result<()> {
    let entries = build_store(settings).list(Some(limit));

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("{} No sync runs recorded yet.", "OK".green().bold());
        return Ok(());
    }

    println!("{} Last {} run(s):", "=>".blue().bold(), entries.len());
    for entry in &entries {
        println!("   {} {}", "-".dimmed(), describe(entry));
    }

    Ok(())
}

/// Run the history stats command
pub fn run_history_stats(settings: &Settings, json: bool) -> Result<()> {
    let stats = build_store(settings).stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{} Sync history:", "=>".blue().bold());
    println!("   total runs:      {}", stats.total_syncs);
    println!("   completed:       {}", stats.successful_syncs);
    println!("   failed:          {}", stats.failed_syncs);
    println!("   mean duration:   {:.2}s", stats.average_duration);
    match stats.last_sync {
        Some(entry) => println!("   most recent:     {}", describe(&entry)),
        None => println!("   most recent:     none"),
    }

    Ok(())
}

/// Run the history latest command
pub fn run_history_latest(settings: &Settings, json: bool) -> Result<()> {
    let latest = build_store(settings).latest();

    if json {
        println!("{}", serde_json::to_string_pretty(&latest)?);
        return Ok(());
    }

    match latest {
        Some(entry) => println!("{} {}", "=>".blue().bold(), describe(&entry)),
        None => println!("{} No sync runs recorded yet.", "OK".green().bold()),
    }

    Ok(())
}

/// Run the history clear command
pub fn run_history_clear(settings: &Settings) -> Result<()> {
    build_store(settings).clear()?;
    println!("{} Sync history cleared.", "OK".green().bold());
    Ok(())
}

fn describe(entry: &SyncHistoryEntry) -> String {
    let kind = match entry.sync_type {
        SyncType::Sync => "sync",
        SyncType::DryRun => "dry run",
    };
    let status = match entry.status {
        SyncStatus::Completed => "completed".green(),
        SyncStatus::Failed => "failed".red(),
    };
    format!(
        "{} {} {} ({:.2}s)",
        entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        kind,
        status,
        entry.duration
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::build_coordinator;
    use mirror_test_utils::LibraryFixture;

    fn settings_for(fixture: &LibraryFixture) -> Settings {
        Settings::from_parts(
            fixture.library().to_str().unwrap(),
            fixture.replica("replica1").to_str().unwrap(),
            fixture.root().join("history.json").to_str(),
        )
        .unwrap()
    }

    #[test]
    fn test_history_commands_on_empty_store() {
        let fixture = LibraryFixture::new();
        fixture.standard_library();
        let settings = settings_for(&fixture);

        assert!(run_history_list(&settings, 20, false).is_ok());
        assert!(run_history_stats(&settings, false).is_ok());
        assert!(run_history_latest(&settings, false).is_ok());
        assert!(run_history_clear(&settings).is_ok());
    }

    #[test]
    fn test_clear_after_a_recorded_run() {
        let fixture = LibraryFixture::new();
        fixture.standard_library();
        let settings = settings_for(&fixture);

        build_coordinator(&settings).run_blocking(false).unwrap();
        fixture.assert_file_exists("history.json");

        run_history_clear(&settings).unwrap();
        fixture.assert_file_not_exists("history.json");
    }
}
