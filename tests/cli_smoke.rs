//! CLI smoke tests: exercise the `elon` binary end to end against a
//! throwaway repo/data directory, without touching a real oracle.

use assert_cmd::Command;
use predicates::str::contains;
use tempfile::TempDir;

fn elon() -> Command {
    Command::cargo_bin("elon").unwrap()
}

/// §6 "Environment sanity check": a repo with no identity files at all
/// is a failing doctor run (missing AGENTS.md/IDENTITY.md/etc.), exit
/// code 65 per `ElonError::ValidationFailed`.
#[test]
fn doctor_on_bare_repo_reports_missing_identity_files() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("doctor")
        .assert()
        .code(65)
        .stdout(contains("identity_files_present"));
}

#[test]
fn doctor_json_output_is_valid_json_with_ok_false() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    let output = elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("doctor")
        .arg("--json")
        .output()
        .unwrap();

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["ok"], serde_json::json!(false));
}

/// §4.1 identity integrity: verifying a repo with no pinned state and no
/// identity files on disk is vacuously valid (nothing to disagree with).
#[test]
fn identity_verify_on_bare_repo_is_valid() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("identity")
        .arg("verify")
        .assert()
        .success()
        .stdout(contains("identity OK"));
}

/// §3 identity tamper halt (S3): pin checksums, then mutate a tracked
/// file externally — verify must fail and name the changed file.
#[test]
fn identity_verify_detects_tamper_after_acknowledge() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();
    std::fs::write(repo.path().join("AGENTS.md"), "safePaths:\n  - src/**\n").unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("identity")
        .arg("acknowledge")
        .assert()
        .success();

    std::fs::write(repo.path().join("AGENTS.md"), "safePaths:\n  - other/**\n").unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("identity")
        .arg("verify")
        .assert()
        .code(77)
        .stdout(contains("AGENTS.md"));
}

/// §4.3 Work Queue: an empty pending bucket lists as empty, and
/// approving an id that was never filed is a queue I/O error.
#[test]
fn queue_list_empty_then_approve_unknown_id_fails() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("queue")
        .arg("list")
        .assert()
        .success()
        .stdout(contains("(empty)"));

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("queue")
        .arg("approve")
        .arg("does-not-exist")
        .assert()
        .code(74);
}

/// §10.4: `status` must run even with no prior cycle (engine log, last
/// crawl, and ledger all default to empty/zero).
#[test]
fn status_on_fresh_data_dir_succeeds() {
    let repo = TempDir::new().unwrap();
    let data = TempDir::new().unwrap();

    elon()
        .arg("--repo-root")
        .arg(repo.path())
        .arg("--data-dir")
        .arg(data.path())
        .arg("status")
        .assert()
        .success()
        .stdout(contains("no active constraint"));
}
