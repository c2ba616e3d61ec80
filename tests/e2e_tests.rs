//! End-to-End Tests for the timer-sync binary.
//!
//! These tests run the compiled CLI:
//! - Help and completions
//! - Argument validation
//! - Error reporting when no daemon is running
//! - Two daemons kept in sync through real processes

use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::time::{Duration, Instant};

use assert_cmd::Command;
use predicates::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

fn create_temp_dir() -> PathBuf {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().to_path_buf();
    // Keep the directory so it's not deleted
    std::mem::forget(dir);
    path
}

fn timer_sync(base_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("timer-sync").unwrap();
    cmd.arg("--base-dir").arg(base_dir);
    cmd
}

/// A daemon process killed on drop.
struct DaemonProcess(Child);

impl DaemonProcess {
    fn spawn(base_dir: &Path, role: &str) -> Self {
        let child = StdCommand::new(assert_cmd::cargo::cargo_bin("timer-sync"))
            .arg("--base-dir")
            .arg(base_dir)
            .args(["daemon", "--role", role])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .unwrap();

        let socket = base_dir.join(format!("{}.ctl.sock", role));
        let deadline = Instant::now() + Duration::from_secs(5);
        while !socket.exists() {
            assert!(Instant::now() < deadline, "{} daemon did not start", role);
            std::thread::sleep(Duration::from_millis(50));
        }

        Self(child)
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        let _ = self.0.kill();
        let _ = self.0.wait();
    }
}

/// Polls `status` on `device` until its output contains `expected`.
fn wait_for_status(base_dir: &Path, device: &str, expected: &str) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let output = timer_sync(base_dir)
            .args(["status", "--device", device])
            .output()
            .unwrap();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        if stdout.contains(expected) {
            return stdout;
        }
        assert!(
            Instant::now() < deadline,
            "{} never reported '{}', last output:\n{}",
            device,
            expected,
            stdout
        );
        std::thread::sleep(Duration::from_millis(100));
    }
}

// ============================================================================
// Help, completions and argument validation
// ============================================================================

#[test]
fn test_help_lists_subcommands() {
    Command::cargo_bin("timer-sync")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("daemon"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_completions_bash() {
    Command::cargo_bin("timer-sync")
        .unwrap()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("timer-sync"));
}

#[test]
fn test_daemon_rejects_tick_out_of_range() {
    Command::cargo_bin("timer-sync")
        .unwrap()
        .args(["daemon", "--role", "phone", "--tick-ms", "5"])
        .assert()
        .failure();
}

#[test]
fn test_rejects_unknown_device() {
    Command::cargo_bin("timer-sync")
        .unwrap()
        .args(["start", "--device", "tablet"])
        .assert()
        .failure();
}

#[test]
fn test_status_without_daemon_fails() {
    let base_dir = create_temp_dir();

    timer_sync(&base_dir)
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("エラー"));
}

// ============================================================================
// Two daemons
// ============================================================================

#[test]
fn test_two_daemons_stay_in_sync() {
    let base_dir = create_temp_dir();
    let _phone = DaemonProcess::spawn(&base_dir, "phone");
    let _watch = DaemonProcess::spawn(&base_dir, "watch");

    timer_sync(&base_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("タイマーを開始しました"));

    wait_for_status(&base_dir, "watch", "Running");

    timer_sync(&base_dir)
        .args(["pause", "--device", "watch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("タイマーを一時停止しました"));

    wait_for_status(&base_dir, "phone", "Paused");

    timer_sync(&base_dir).arg("stop").assert().success();

    let status = wait_for_status(&base_dir, "watch", "Ready");
    assert!(status.contains("00:00.0"), "Unexpected status:\n{}", status);
}

#[test]
fn test_watch_started_later_picks_up_context() {
    let base_dir = create_temp_dir();
    let _phone = DaemonProcess::spawn(&base_dir, "phone");

    timer_sync(&base_dir)
        .arg("start")
        .assert()
        .success()
        .stdout(predicate::str::contains("後で同期"));

    let _watch = DaemonProcess::spawn(&base_dir, "watch");

    wait_for_status(&base_dir, "watch", "Running");
}
