//! CLI smoke tests for the `ra` binary

use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// `ra` with config and log locations inside a scratch directory
fn ra(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("ra").expect("ra binary is built");
    cmd.current_dir(dir.path())
        .env("XDG_DATA_HOME", dir.path().join("data"))
        .env("XDG_CONFIG_HOME", dir.path().join("config"))
        .env("NO_COLOR", "1");
    cmd
}

fn fast_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("fast.yml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        "scheduler:\n  tick-interval-ms: 5\nsimulator:\n  init-delay-ms: 5\n  load-latency-ms: 5\n  ms-per-char: 1\n  progress-interval-ms: 10"
    )
    .unwrap();
    path
}

#[test]
fn test_segment_prints_fragments() {
    let dir = TempDir::new().unwrap();
    ra(&dir)
        .args(["segment", "Hello. World"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello").and(predicate::str::contains("World")));
}

#[test]
fn test_segment_json() {
    let dir = TempDir::new().unwrap();
    let output = ra(&dir)
        .args(["segment", "One; two", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = parsed.as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["normalized"], "one");
    assert_eq!(entries[1]["text"], "two");
}

#[test]
fn test_url_uses_template() {
    let dir = TempDir::new().unwrap();
    ra(&dir)
        .args(["url", "hi there"])
        .assert()
        .success()
        .stdout(predicate::str::contains("speak?text=hi%20there"));
}

#[test]
fn test_keys_lists_backspace() {
    let dir = TempDir::new().unwrap();
    ra(&dir)
        .arg("keys")
        .assert()
        .success()
        .stdout(predicate::str::contains("back space").and(predicate::str::contains("\"~\"")));
}

#[test]
fn test_speak_reads_every_node() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    ra(&dir)
        .arg("--config")
        .arg(&config)
        .args(["speak", "First node.", "Second node"])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("First node")
                .and(predicate::str::contains("Second node"))
                .and(predicate::str::contains("sounds played: 2")),
        );
}

#[test]
fn test_speak_reports_fallback_in_json() {
    let dir = TempDir::new().unwrap();
    let config = fast_config(&dir);
    let output = ra(&dir)
        .arg("--config")
        .arg(&config)
        .args(["speak", "hello", "--fail-streaming", "--format", "json"])
        .timeout(std::time::Duration::from_secs(30))
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed["engine"], "embedded");
    assert_eq!(parsed["timing"]["stats"]["sounds_played"], 1);
}

#[test]
fn test_invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.yml");
    std::fs::write(&path, "audio:\n  sound-url-base: https://tts.example/say\n").unwrap();
    ra(&dir)
        .arg("--config")
        .arg(&path)
        .args(["url", "hi"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid configuration"));
}
