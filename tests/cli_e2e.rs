//! End-to-end CLI tests for the batchfetch binary.

#![allow(deprecated)]

use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[macro_use]
mod support;
use support::archive_names;

fn batchfetch(workdir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("batchfetch").unwrap();
    cmd.current_dir(workdir).env_remove("RUST_LOG");
    cmd
}

fn write_records(dir: &Path, server: &MockServer, lines: &[(&str, &str)]) -> std::path::PathBuf {
    let text: String = lines
        .iter()
        .map(|(head, rest)| format!("{head} {}{rest}\n", server.uri()))
        .collect();
    let path = dir.join("records.txt");
    std::fs::write(&path, format!("# test records\n{text}")).unwrap();
    path
}

async fn mount(server: &MockServer, route: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(route.to_owned()))
        .respond_with(ResponseTemplate::new(status).set_body_bytes(b"img".as_slice()))
        .mount(server)
        .await;
}

// ==================== Argument Handling ====================

#[test]
fn test_binary_help_displays_usage() {
    let dir = TempDir::new().unwrap();
    batchfetch(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Fetch a bounded batch"));
}

#[test]
fn test_binary_version_displays_version() {
    let dir = TempDir::new().unwrap();
    batchfetch(dir.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("batchfetch"));
}

#[test]
fn test_binary_invalid_concurrency_rejected() {
    let dir = TempDir::new().unwrap();
    batchfetch(dir.path())
        .args(["records.txt", "-c", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_missing_source_file_is_failure() {
    let dir = TempDir::new().unwrap();
    let assert = batchfetch(dir.path()).arg("absent.txt").assert().failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
    assert!(!dir.path().join("result.zip").exists());
}

#[test]
fn test_binary_malformed_source_file_is_failure() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("records.txt"), "not-a-number https://h/a.jpg\n").unwrap();

    let assert = batchfetch(dir.path())
        .arg("records.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("records.txt"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_empty_source_exits_no_new_records() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("records.txt"), "# nothing yet\n").unwrap();

    let assert = batchfetch(dir.path()).args(["records.txt", "-q"]).assert();
    assert_eq!(assert.get_output().status.code(), Some(3));
    assert!(!dir.path().join("result.zip").exists());
    assert!(!dir.path().join("images").exists());
}

#[test]
fn test_binary_unknown_config_key_is_failure() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("records.txt"), "").unwrap();
    std::fs::write(dir.path().join("run.toml"), "concurency = 4\n").unwrap();

    let assert = batchfetch(dir.path())
        .args(["records.txt", "--config", "run.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("run.toml"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_archive_inside_dot_prefixed_storage_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("records.txt"), "").unwrap();

    let assert = batchfetch(dir.path())
        .args(["records.txt", "-s", "./images", "-o", "images/result.zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must not be inside storage"));
    assert_eq!(assert.get_output().status.code(), Some(1));
    assert!(!dir.path().join("images").exists());
}

#[test]
fn test_binary_working_directory_as_storage_rejected() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("records.txt"), "").unwrap();

    let assert = batchfetch(dir.path())
        .args(["records.txt", "-s", "."])
        .assert()
        .failure();
    assert_eq!(assert.get_output().status.code(), Some(1));
    assert!(dir.path().join("records.txt").exists());
}

// ==================== Full Runs ====================

#[tokio::test]
async fn test_binary_full_run_writes_archive_and_json_summary() {
    let mock_server = require_mock_server!();
    mount(&mock_server, "/a.jpg", 200).await;
    mount(&mock_server, "/b.gif", 200).await;

    let dir = TempDir::new().unwrap();
    write_records(
        dir.path(),
        &mock_server,
        &[("1", "/a.jpg?x=1 eva,unit01"), ("2", "/b.gif")],
    );

    let assert = batchfetch(dir.path())
        .args(["records.txt", "-q", "--json"])
        .assert()
        .success();

    let summary: serde_json::Value =
        serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(summary["completed"], 2);
    assert_eq!(summary["storage_removed"], true);
    assert_eq!(
        archive_names(&dir.path().join("result.zip")),
        vec!["images/1.jpg", "images/2.gif", "tags.csv"]
    );
    assert!(!dir.path().join("images").exists());
}

#[tokio::test]
async fn test_binary_partial_run_exits_two() {
    let mock_server = require_mock_server!();
    mount(&mock_server, "/ok.jpg", 200).await;
    mount(&mock_server, "/gone.jpg", 404).await;

    let dir = TempDir::new().unwrap();
    write_records(dir.path(), &mock_server, &[("1", "/ok.jpg"), ("2", "/gone.jpg")]);

    let assert = batchfetch(dir.path()).args(["records.txt", "-q"]).assert();
    assert_eq!(assert.get_output().status.code(), Some(2));
    assert_eq!(
        archive_names(&dir.path().join("result.zip")),
        vec!["images/1.jpg", "tags.csv"]
    );
}

#[tokio::test]
async fn test_binary_config_file_and_flag_override() {
    let mock_server = require_mock_server!();
    mount(&mock_server, "/a.jpg", 200).await;

    let dir = TempDir::new().unwrap();
    write_records(dir.path(), &mock_server, &[("7", "/a.jpg")]);
    std::fs::write(
        dir.path().join("run.toml"),
        "storage_dir = \"work\"\narchive_path = \"from-config.zip\"\nconcurrency = 4\n",
    )
    .unwrap();

    batchfetch(dir.path())
        .args([
            "records.txt",
            "-q",
            "--config",
            "run.toml",
            "-o",
            "from-flag.zip",
            "--keep-storage",
        ])
        .assert()
        .success();

    assert!(!dir.path().join("from-config.zip").exists());
    assert_eq!(
        archive_names(&dir.path().join("from-flag.zip")),
        vec!["tags.csv", "work/7.jpg"]
    );
    assert!(dir.path().join("work").join("status.dat").exists());
}
