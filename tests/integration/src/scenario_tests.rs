//! End-to-end replication scenarios across the public surface

use std::time::Duration;

use mirror_core::{
    HistoryStore, ReplicaOutcome, RunCoordinator, Settings, SyncEngine, SyncStatus, SyncType,
    TriggerOutcome,
};
use mirror_test_utils::LibraryFixture;

fn coordinator_for(fixture: &LibraryFixture) -> RunCoordinator {
    let settings = Settings::from_parts(
        fixture.library().to_str().unwrap(),
        fixture.replica("replica1").to_str().unwrap(),
        fixture.root().join("history.json").to_str(),
    )
    .unwrap();
    RunCoordinator::new(
        SyncEngine::new(&settings),
        HistoryStore::new(&settings.history_path),
    )
}

fn wait_until_idle(coordinator: &RunCoordinator) {
    for _ in 0..200 {
        if !coordinator.status().in_progress {
            return;
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    panic!("run did not finish in time");
}

#[test]
fn orphan_deletion_is_visible_in_the_history_ledger() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();
    fixture.write_file("replica1/book2/book2.epub", b"orphan");
    let coordinator = coordinator_for(&fixture);

    coordinator.run_blocking(false).unwrap();
    fixture.assert_file_not_exists("replica1/book2/book2.epub");

    let latest = coordinator.history().latest().unwrap();
    assert_eq!(latest.status, SyncStatus::Completed);
    let replica_key = fixture.replica("replica1").to_string_lossy().to_string();
    match &latest.results[&replica_key] {
        ReplicaOutcome::Stats(stats) => {
            assert_eq!(stats.added, 2);
            assert_eq!(stats.deleted, 1);
            assert_eq!(stats.deleted_files, vec!["book2/book2.epub"]);
        }
        ReplicaOutcome::Failed { error } => panic!("replica failed: {error}"),
    }
}

#[test]
fn replica_content_matches_source_checksums() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();
    let coordinator = coordinator_for(&fixture);

    coordinator.run_blocking(false).unwrap();

    for rel in ["book1/book1.epub", "book1/metadata.opf"] {
        let source = mirror_fs::checksum::compute_file_checksum(&fixture.library().join(rel))
            .unwrap();
        let replica =
            mirror_fs::checksum::compute_file_checksum(&fixture.replica("replica1").join(rel))
                .unwrap();
        assert_eq!(source, replica, "checksum mismatch for {rel}");
    }
}

#[test]
fn background_trigger_completes_and_returns_to_idle() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();
    let coordinator = coordinator_for(&fixture);

    let outcome = coordinator.trigger(false);
    assert!(matches!(outcome, TriggerOutcome::Started { .. }));

    wait_until_idle(&coordinator);

    let status = coordinator.status();
    assert!(!status.in_progress);
    assert!(status.last_sync.is_some());
    assert_eq!(coordinator.history().list(None).len(), 1);

    // Idle again: a new trigger is accepted and reports the last completion
    match coordinator.trigger(false) {
        TriggerOutcome::Started { last_sync } => assert!(last_sync.is_some()),
        TriggerOutcome::AlreadyRunning { .. } => panic!("coordinator should be idle"),
    }
    wait_until_idle(&coordinator);
}

#[test]
fn dry_run_and_real_run_are_both_recorded_in_order() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();
    let coordinator = coordinator_for(&fixture);

    coordinator.run_blocking(true).unwrap();
    std::thread::sleep(Duration::from_millis(5));
    coordinator.run_blocking(false).unwrap();

    let entries = coordinator.history().list(None);
    assert_eq!(entries.len(), 2);
    // Most recent first
    assert_eq!(entries[0].sync_type, SyncType::Sync);
    assert_eq!(entries[1].sync_type, SyncType::DryRun);

    let stats = coordinator.history().stats();
    assert_eq!(stats.total_syncs, 2);
    assert_eq!(stats.successful_syncs, 2);
    assert_eq!(stats.failed_syncs, 0);
}

#[test]
fn two_consecutive_runs_converge_to_no_changes() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();
    let coordinator = coordinator_for(&fixture);

    coordinator.run_blocking(false).unwrap();
    let second = coordinator.run_blocking(false).unwrap();

    let replica_key = fixture.replica("replica1").to_string_lossy().to_string();
    match &second.results[&replica_key] {
        ReplicaOutcome::Stats(stats) => {
            assert_eq!(stats.added, 0);
            assert_eq!(stats.updated, 0);
            assert_eq!(stats.deleted, 0);
            assert_eq!(stats.unchanged, 2);
        }
        ReplicaOutcome::Failed { error } => panic!("replica failed: {error}"),
    }
}
