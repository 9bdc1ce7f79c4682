//! End-to-end tests for the `cf` binary.
//!
//! Each test runs the binary against a database in a fresh temp directory.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cf_binary() -> String {
    env!("CARGO_BIN_EXE_cf").to_string()
}

struct Env {
    temp: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn db_path(&self) -> PathBuf {
        self.temp.path().join("data/cf.db")
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(cf_binary());
        cmd.env("HOME", self.temp.path())
            .env_remove("XDG_CONFIG_HOME")
            .env_remove("XDG_DATA_HOME")
            .env_remove("RUST_LOG")
            .env("CF_DATABASE_PATH", self.db_path());
        cmd
    }

    fn run(&self, args: &[&str]) -> Output {
        self.command()
            .args(args)
            .output()
            .expect("failed to run cf")
    }

    fn ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "cf {args:?} should succeed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        serde_json::from_str(&self.ok(args)).expect("valid JSON output")
    }
}

fn logged_id(stdout: &str) -> String {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("ID: "))
        .expect("log output includes the ID")
        .trim()
        .to_string()
}

fn exists(path: &Path) -> bool {
    path.try_exists().unwrap()
}

#[test]
fn test_log_edit_delete_flow() {
    let env = Env::new();

    let stdout = env.ok(&["log", "--drink", "drip-coffee"]);
    assert!(stdout.starts_with("Logged Drip coffee (95 mg) at "));
    assert!(exists(&env.db_path()), "database is created on first use");
    let id = logged_id(&stdout);

    let status = env.json(&["status", "--json"]);
    assert_eq!(status["status"]["daily_consumed_mg"], 95);
    assert!(status["timezone"].is_string());
    assert!(status["guidance"]["headline"].is_string());

    env.ok(&["edit", &id, "--mg", "63"]);
    let status = env.json(&["status", "--json"]);
    assert_eq!(status["status"]["daily_consumed_mg"], 63);

    env.ok(&["delete", &id]);
    let status = env.json(&["status", "--json"]);
    assert_eq!(status["status"]["daily_consumed_mg"], 0);

    let output = env.run(&["delete", &id]);
    assert!(!output.status.success(), "deleting twice should fail");
}

#[test]
fn test_log_rejects_bad_input() {
    let env = Env::new();

    let output = env.run(&["log", "--drink", "mate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("cf drinks"));

    let output = env.run(&["log", "--mg", "-20"]);
    assert!(!output.status.success());

    let output = env.run(&["log", "--drink", "latte", "--at", "sometime"]);
    assert!(!output.status.success());
}

#[test]
fn test_checkin_once_per_day() {
    let env = Env::new();

    let stdout = env.ok(&["checkin", "--quality", "great", "--date", "2025-01-15"]);
    assert!(stdout.starts_with("Checked in for 2025-01-15: slept great."));

    let output = env.run(&["checkin", "--quality", "poor", "--date", "2025-01-15"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Already checked in"));

    let output = env.run(&["checkin", "--quality", "meh"]);
    assert!(!output.status.success());
}

#[test]
fn test_prefs_flow_into_status() {
    let env = Env::new();

    let stdout = env.ok(&[
        "prefs",
        "--bedtime",
        "22:00",
        "--limit",
        "300",
        "--sensitivity",
        "high",
    ]);
    assert!(stdout.contains("Daily limit   300 mg"));
    assert!(stdout.contains("Sensitivity   high"));

    let status = env.json(&["status", "--json"]);
    assert_eq!(status["status"]["daily_limit_mg"], 300);
    assert_eq!(status["sensitivity"]["level"], "high");
    assert_eq!(status["sensitivity"]["source"], "override");

    // Reading back without flags keeps the stored values.
    let stdout = env.ok(&["prefs"]);
    assert!(stdout.contains("Bedtime       22:00"));
}

#[test]
fn test_profile_reports_badges_once() {
    let env = Env::new();
    env.ok(&["log", "--mg", "50", "--name", "Mystery tea"]);

    let profile = env.json(&["profile", "--json"]);
    assert_eq!(profile["new_badges"], serde_json::json!(["mixologist"]));
    assert_eq!(profile["is_unlocked"], false);
    assert_eq!(profile["days_until_unlock"], 6);

    let profile = env.json(&["profile", "--json"]);
    assert_eq!(profile["new_badges"], serde_json::json!([]));
}

#[test]
fn test_patterns_window_override() {
    let env = Env::new();
    env.ok(&["log", "--drink", "espresso"]);

    let patterns = env.json(&["patterns", "--days", "7", "--json"]);
    assert_eq!(patterns["window_days"], 7);
    assert_eq!(patterns["total_doses"], 1);

    let output = env.run(&["patterns", "--days", "0"]);
    assert!(!output.status.success());
}

#[test]
fn test_watch_single_tick() {
    let env = Env::new();
    let stdout = env.ok(&["watch", "--interval", "0", "--ticks", "1"]);
    assert!(stdout.contains("GREEN  Good to go"));
}

#[test]
fn test_invalid_thresholds_abort() {
    let env = Env::new();
    let output = env
        .command()
        .env("CF_THRESHOLDS__HALF_LIFE_HOURS", "-1")
        .arg("status")
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid configuration"));
}

#[test]
fn test_config_file_sets_database_path() {
    let env = Env::new();
    let db_path = env.temp.path().join("elsewhere/custom.db");
    let config_path = env.temp.path().join("cf.toml");
    std::fs::write(
        &config_path,
        format!("database_path = {:?}\n", db_path.display().to_string()),
    )
    .unwrap();

    let output = Command::new(cf_binary())
        .env("HOME", env.temp.path())
        .env_remove("XDG_CONFIG_HOME")
        .env_remove("XDG_DATA_HOME")
        .arg("--config")
        .arg(&config_path)
        .args(["log", "--drink", "cola"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(exists(&db_path));
}

#[test]
fn test_drinks_lists_catalog() {
    let env = Env::new();
    let stdout = env.ok(&["drinks"]);
    assert!(stdout.contains("drip-coffee"));
    assert!(stdout.contains("cold-brew"));
}
