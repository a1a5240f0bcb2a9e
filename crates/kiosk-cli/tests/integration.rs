#![allow(deprecated)]
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn kiosk(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("kiosk").unwrap();
    cmd.current_dir(dir.path()).env("KIOSK_ROOT", dir.path());
    cmd
}

fn write_settings(dir: &TempDir, yaml: &str) {
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/kiosk.yaml"), yaml).unwrap();
}

fn write_session(dir: &TempDir, json: &str) {
    std::fs::create_dir_all(dir.path().join("data")).unwrap();
    std::fs::write(dir.path().join("data/electron.json"), json).unwrap();
}

// ---------------------------------------------------------------------------
// kiosk timers
// ---------------------------------------------------------------------------

#[test]
fn timers_json_shows_defaults() {
    let dir = TempDir::new().unwrap();
    let output = kiosk(&dir).args(["timers", "--json"]).output().unwrap();
    assert!(output.status.success());

    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v["callout"]["value"], 30000);
    assert_eq!(v["breathe"]["value"], 1000);
    assert_eq!(v["tick"]["pattern"], serde_json::json!([0, 0, 250]));
}

#[test]
fn timers_reads_settings_file() {
    let dir = TempDir::new().unwrap();
    write_settings(
        &dir,
        "timers:\n  callout:\n    pattern: [1, 0, 0]\n  idle:\n    pattern: \"[0,2,500]\"\n",
    );

    kiosk(&dir)
        .arg("timers")
        .assert()
        .success()
        .stdout(predicate::str::contains("callout"))
        .stdout(predicate::str::contains("60.00s"))
        .stdout(predicate::str::contains("idle"))
        .stdout(predicate::str::contains("2.50s"));
}

#[test]
fn malformed_settings_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_settings(&dir, "timers: [not, a, map\n");

    kiosk(&dir)
        .arg("timers")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
}

// ---------------------------------------------------------------------------
// kiosk session
// ---------------------------------------------------------------------------

#[test]
fn session_show_empty_when_missing() {
    let dir = TempDir::new().unwrap();
    kiosk(&dir)
        .args(["session", "show", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("{}"));
}

#[test]
fn session_show_lists_keys() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, r#"{"computerId":"pc-17","room":4}"#);

    kiosk(&dir)
        .args(["session", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("computerId"))
        .stdout(predicate::str::contains("pc-17"))
        .stdout(predicate::str::contains("room"));
}

#[test]
fn session_show_tolerates_corrupt_file() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, "{ not json");

    let output = kiosk(&dir)
        .args(["session", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let v: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(v, serde_json::json!({}));
}

#[test]
fn session_clear_removes_file() {
    let dir = TempDir::new().unwrap();
    write_session(&dir, r#"{"computerId":"pc-17"}"#);

    kiosk(&dir).args(["session", "clear"]).assert().success();
    assert!(!dir.path().join("data/electron.json").exists());

    // Clearing twice is fine.
    kiosk(&dir).args(["session", "clear"]).assert().success();
}

// ---------------------------------------------------------------------------
// kiosk handshake
// ---------------------------------------------------------------------------

#[test]
fn handshake_unreachable_server_fails() {
    let dir = TempDir::new().unwrap();
    write_settings(
        &dir,
        "server:\n  ping_server: http://127.0.0.1:9\ntimers:\n  callout:\n    pattern: [0, 2, 0]\n",
    );

    kiosk(&dir)
        .arg("handshake")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("handshake with"));
}

#[test]
fn handshake_does_not_touch_session() {
    let dir = TempDir::new().unwrap();
    write_settings(&dir, "server:\n  ping_server: http://127.0.0.1:9\n");
    write_session(&dir, r#"{"computerId":"pc-17"}"#);

    kiosk(&dir).arg("handshake").assert().failure();

    let content = std::fs::read_to_string(dir.path().join("data/electron.json")).unwrap();
    assert!(content.contains("pc-17"));
}
