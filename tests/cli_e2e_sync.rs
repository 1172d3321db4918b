//! End-to-end tests for the `sync` command.
//!
//! A shell script named `git` is put first on `PATH` so the binary runs its
//! real command sequence without network access. The script records every
//! invocation, creates the clone directory and reports one modified file.

#![cfg(unix)]

mod common;
use common::prelude::*;

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

const MOCK_GIT: &str = r#"#!/bin/sh
echo "$*" >> "$MOCK_GIT_LOG"
case "$1" in
  clone)
    for last; do :; done
    case "$*" in
      *broken*) echo "fatal: Repository not found" >&2; exit 128 ;;
    esac
    mkdir -p "$last"
    ;;
  status) echo " M file1.txt" ;;
  rev-parse) echo "main" ;;
esac
exit 0
"#;

/// Writes the mock into `<fixture>/bin/git` and returns the `PATH` to use.
fn install_mock_git(fixture: &TestFixture) -> String {
    let bin = fixture.path().join("bin");
    fs::create_dir_all(&bin).unwrap();
    let git = bin.join("git");
    fs::write(&git, MOCK_GIT).unwrap();
    fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).unwrap();

    let path = std::env::var("PATH").unwrap_or_default();
    format!("{}:{}", bin.display(), path)
}

fn sync_command(fixture: &TestFixture) -> (assert_cmd::Command, PathBuf, PathBuf) {
    let path = install_mock_git(fixture);
    let log = fixture.path().join("git.log");
    let tmp = fixture.path().join("tmp");

    let mut cmd = fixture.command();
    cmd.arg("sync")
        .env("PATH", path)
        .env("MOCK_GIT_LOG", &log)
        .env("GITHUB_SERVER_URL", "https://gitrepo.local")
        .env("GITHUB_REPOSITORY", "owner/source-repo")
        .env("INPUT_GH_PAT", "test-token")
        .env("INPUT_SKIP_PR", "true")
        .env("INPUT_SKIP_CLEANUP", "true")
        .env("INPUT_TMP_DIR", &tmp);
    (cmd, log, tmp)
}

fn read_log(log: &Path) -> String {
    fs::read_to_string(log).unwrap_or_default()
}

#[test]
fn test_sync_copies_commits_and_pushes() {
    let fixture = TestFixture::new()
        .with_config("owner/target-repo:\n  - file1.txt\n")
        .with_file("file1.txt", "synced content\n");
    let (mut cmd, log, tmp) = sync_command(&fixture);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "gitrepo.local/owner/target-repo@default: synced",
        ));

    let copied = tmp.join("gitrepo.local/owner/target-repo@default/file1.txt");
    assert_eq!(fs::read_to_string(copied).unwrap(), "synced content\n");

    let calls = read_log(&log);
    assert!(calls.contains("clone --depth 1 https://test-token@gitrepo.local/owner/target-repo.git"));
    assert!(calls.contains("add -f file1.txt"));
    assert!(calls.contains("commit -m 🔄 created local 'file1.txt' from remote 'file1.txt'"));
    assert!(calls.contains("push origin HEAD"));
    assert!(!calls.contains("checkout -b"));
}

#[test]
fn test_sync_dry_run_does_not_commit_or_push() {
    let fixture = TestFixture::new()
        .with_config("owner/target-repo:\n  - file1.txt\n")
        .with_file("file1.txt", "synced content\n");
    let (mut cmd, log, tmp) = sync_command(&fixture);

    cmd.arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("dry run"));

    assert!(tmp
        .join("gitrepo.local/owner/target-repo@default/file1.txt")
        .exists());
    let calls = read_log(&log);
    assert!(!calls.contains("commit"));
    assert!(!calls.contains("push"));
}

#[test]
fn test_sync_continues_after_failed_clone() {
    let fixture = TestFixture::new()
        .with_config("owner/broken:\n  - file1.txt\nowner/target-repo:\n  - file1.txt\n")
        .with_file("file1.txt", "synced content\n");
    let (mut cmd, log, _tmp) = sync_command(&fixture);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("owner/broken@default: failed"))
        .stdout(predicate::str::contains("Failed: 1"))
        .stdout(predicate::str::contains("owner/target-repo@default: synced"));

    let calls = read_log(&log);
    assert!(calls.contains("owner/target-repo.git"));
    assert!(calls.contains("push origin HEAD"));
}

#[test]
fn test_sync_cleans_up_tmp_dir() {
    let fixture = TestFixture::new()
        .with_config("owner/target-repo:\n  - file1.txt\n")
        .with_file("file1.txt", "synced content\n");
    let (mut cmd, _log, tmp) = sync_command(&fixture);

    cmd.env("INPUT_SKIP_CLEANUP", "false").assert().success();

    assert!(!tmp.exists());
}

#[test]
fn test_sync_requires_a_token() {
    let fixture = TestFixture::new().with_config("owner/target-repo:\n  - file1.txt\n");
    let (mut cmd, log, _tmp) = sync_command(&fixture);

    cmd.env_remove("INPUT_GH_PAT")
        .assert()
        .failure()
        .stderr(predicate::str::contains("GH_PAT"));

    assert!(read_log(&log).is_empty());
}

#[test]
fn test_sync_missing_config_fails() {
    let fixture = TestFixture::new();
    let (mut cmd, _log, _tmp) = sync_command(&fixture);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Cannot read configuration file"));
}
