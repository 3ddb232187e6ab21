//! Basic CLI E2E tests.
//!
//! Each test runs the built `pomodoro` binary against its own data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn pomodoro(data_dir: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_pomodoro"));
    cmd.env("POMODORO_DATA_DIR", data_dir).env_remove("RUST_LOG");
    cmd
}

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(data_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = pomodoro(data_dir)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    (
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "durations.work"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "25");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "sound.finish_tone_enabled"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");
    assert!(dir.path().join("config.toml").exists());
}

#[test]
fn test_config_set_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["config", "set", "durations.short_break", "7"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "ok");

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "durations.short_break"]);
    assert_eq!(stdout.trim(), "7");

    let (_, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["durations"]["short_break"], 7);
    assert_eq!(json["durations"]["work"], 25);
}

#[test]
fn test_config_rejects_bad_values() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "durations.work", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.starts_with("error:"));

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "durations.work", "soon"]);
    assert_eq!(code, 1);

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "theme"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("theme"));

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "durations.work"]);
    assert_eq!(stdout.trim(), "25");
}

#[test]
fn test_config_reset_and_path() {
    let dir = tempfile::tempdir().unwrap();
    run_cli(dir.path(), &["config", "set", "durations.long_break", "30"]);
    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);

    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "durations.long_break"]);
    assert_eq!(stdout.trim(), "15");

    let (_, stdout, _) = run_cli(dir.path(), &["config", "path"]);
    assert_eq!(Path::new(stdout.trim()), dir.path().join("config.toml"));
}

#[test]
fn test_history_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["history", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json, serde_json::json!([]));

    let (code, stdout, _) = run_cli(dir.path(), &["history"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("No sessions yet."));
}

#[test]
fn test_stats_all_empty() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["stats", "all"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["total_sessions"], 0);
    assert_eq!(json["work_min"], 0);

    let (code, _, _) = run_cli(dir.path(), &["stats", "today"]);
    assert_eq!(code, 0);
}

#[test]
fn test_tracks_lists_sound_files() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["tracks"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("No tracks found"));

    let sounds = dir.path().join("sounds");
    std::fs::create_dir_all(&sounds).unwrap();
    std::fs::write(sounds.join("track_03.ogg"), b"").unwrap();
    std::fs::write(sounds.join("track_01.mp3"), b"").unwrap();
    run_cli(dir.path(), &["config", "set", "sound.ambient_track", "track_03"]);

    let (code, stdout, _) = run_cli(dir.path(), &["tracks"]);
    assert_eq!(code, 0);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["track_01", "track_03  (ambient)"]);
}

#[test]
fn test_timer_quits_on_q() {
    let dir = tempfile::tempdir().unwrap();
    let mut child = pomodoro(dir.path())
        .args(["timer", "--mode", "short"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start timer");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"r\nlong\nq\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Short Break 05:00"));
    assert!(stdout.contains("Long Break  15:00"));
    assert!(dir.path().join("pomodoro.db").exists());
}

#[test]
fn test_timer_rejects_unknown_mode() {
    let dir = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(dir.path(), &["timer", "--mode", "nap"]);
    assert_ne!(code, 0);
}

#[cfg(unix)]
#[test]
fn test_timer_stops_on_interrupt_with_stdin_open() {
    use std::time::{Duration, Instant};

    let dir = tempfile::tempdir().unwrap();
    let mut child = pomodoro(dir.path())
        .arg("timer")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start timer");
    // Keep stdin open so the timer is blocked waiting for a command.
    let stdin = child.stdin.take().unwrap();

    std::thread::sleep(Duration::from_millis(1500));
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    let deadline = Instant::now() + Duration::from_secs(5);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break exit;
        }
        if Instant::now() > deadline {
            child.kill().unwrap();
            panic!("timer still running 5s after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(exit.success());
    drop(stdin);
}
