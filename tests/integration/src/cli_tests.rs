//! End-to-end tests driving the `mirror` binary

use assert_cmd::Command;
use mirror_test_utils::LibraryFixture;
use predicates::prelude::*;

fn mirror_cmd(fixture: &LibraryFixture) -> Command {
    let mut cmd = Command::cargo_bin("mirror").unwrap();
    cmd.env("MIRROR_LIBRARY_PATH", fixture.library())
        .env("MIRROR_REPLICA_PATHS", fixture.replica("replica1"))
        .env("MIRROR_HISTORY_PATH", fixture.root().join("history.json"));
    cmd
}

#[test]
fn sync_populates_replica_and_reports_counts() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture)
        .arg("sync")
        .assert()
        .success()
        .stdout(predicate::str::contains("2 added"));

    fixture.assert_file_exists("replica1/book1/book1.epub");
    fixture.assert_file_exists("replica1/book1/metadata.opf");
}

#[test]
fn sync_json_output_is_machine_readable() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    let output = mirror_cmd(&fixture)
        .args(["sync", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let entry: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(entry["status"], "completed");
    assert_eq!(entry["sync_type"], "sync");
    let replica_key = fixture.replica("replica1").to_string_lossy().to_string();
    assert_eq!(entry["results"][&replica_key]["added"], 2);
}

#[test]
fn dry_run_leaves_the_replica_untouched() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture)
        .args(["sync", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("previewed"));

    fixture.assert_file_not_exists("replica1");
}

#[test]
fn history_lists_the_recorded_run() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture).arg("sync").assert().success();

    mirror_cmd(&fixture)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("completed"));

    mirror_cmd(&fixture)
        .args(["history", "stats"])
        .assert()
        .success()
        .stdout(predicate::str::contains("total runs:").and(predicate::str::contains("1")));
}

#[test]
fn history_clear_empties_the_ledger() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture).arg("sync").assert().success();
    mirror_cmd(&fixture)
        .args(["history", "clear"])
        .assert()
        .success();

    mirror_cmd(&fixture)
        .args(["history", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No sync runs recorded yet."));
}

#[test]
fn health_reports_reachable_library() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture)
        .arg("health")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 replica(s) configured"));
}

#[test]
fn status_shows_idle_before_any_run() {
    let fixture = LibraryFixture::new();
    fixture.standard_library();

    mirror_cmd(&fixture)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("idle"))
        .stdout(predicate::str::contains("last completed: never"));
}

#[test]
fn missing_settings_fail_before_any_run() {
    let fixture = LibraryFixture::new();

    let mut cmd = Command::cargo_bin("mirror").unwrap();
    cmd.env_remove("MIRROR_LIBRARY_PATH")
        .env_remove("MIRROR_REPLICA_PATHS")
        .env("MIRROR_HISTORY_PATH", fixture.root().join("history.json"));

    cmd.arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing library path"));
}
