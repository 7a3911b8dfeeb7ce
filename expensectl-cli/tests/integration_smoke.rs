//! Smoke tests to verify command wiring

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const GOOD_CSV: &str = "title,category,amount,currency,date,description\n\
                        Coffee,Food & Dining,4.50,USD,2024-03-01,\"flat white, oat\"\n\
                        Bus,Transportation,2.75,EUR,2024-03-02,\n";

/// `expensectl` isolated from the real config and database
fn expensectl(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("expensectl").unwrap();
    cmd.env("EXPENSECTL_CONFIG", dir.join("config.toml"))
        .env("DATABASE_URL", format!("sqlite://{}", dir.join("expenses.db").display()))
        .env_remove("RUST_LOG")
        .env_remove("EXPENSECTL_BIND");
    cmd
}

// === Help Tests ===

#[test]
fn test_top_level_help() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("import"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_serve_help() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["serve", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Allow permissive CORS"));
}

#[test]
fn test_export_help() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["export", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("current-month"));
}

// === CSV Command Tests ===

#[test]
fn test_csv_template() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["csv", "template"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "title,category,amount,currency,date,description",
        ));
}

#[test]
fn test_csv_validate_good_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("good.csv");
    fs::write(&file, GOOD_CSV).unwrap();

    expensectl(dir.path())
        .args(["csv", "validate"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 rows valid"));
}

#[test]
fn test_csv_validate_reports_every_row() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.csv");
    fs::write(
        &file,
        "title,category,amount,currency,date\n,Other,5,USD,2024-01-01\nTaxi,Travel,-1,USD,2024-01-02\n",
    )
    .unwrap();

    expensectl(dir.path())
        .args(["csv", "validate"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Row 2: title is required"))
        .stderr(predicate::str::contains("Row 3: amount must be a positive number"));
}

#[test]
fn test_csv_validate_missing_headers() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("headers.csv");
    fs::write(&file, "name,price\nCoffee,4\n").unwrap();

    expensectl(dir.path())
        .args(["csv", "validate"])
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Missing required headers"));
}

// === Config Command Tests ===

#[test]
fn test_config_path_uses_env() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn test_config_init_then_show() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["config", "init"])
        .assert()
        .success();
    assert!(dir.path().join("config.toml").exists());

    expensectl(dir.path())
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    expensectl(dir.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[server]"))
        .stdout(predicate::str::contains("expenses.db"));
}

// === Completions Test ===

#[test]
fn test_completions_bash() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("expensectl"));
}

// === Database Flow ===

#[test]
fn test_user_import_export_report_flow() {
    let dir = TempDir::new().unwrap();

    expensectl(dir.path())
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    expensectl(dir.path())
        .args(["user", "create", "--email", "ada@example.com", "--name", "Ada"])
        .args(["--password", "correct horse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created user Ada"));

    expensectl(dir.path())
        .args(["user", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ada@example.com"));

    let file = dir.path().join("import.csv");
    fs::write(&file, GOOD_CSV).unwrap();
    expensectl(dir.path())
        .args(["import", "--user", "ada@example.com"])
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("Imported 2 expenses"));

    expensectl(dir.path())
        .args(["export", "--user", "ada@example.com", "--category", "Transportation"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Bus\""))
        .stdout(predicate::str::contains("Coffee").not());

    let out = dir.path().join("out.csv");
    expensectl(dir.path())
        .args(["export", "--user", "ada@example.com", "--output"])
        .arg(&out)
        .assert()
        .success();
    let exported = fs::read_to_string(&out).unwrap();
    assert!(exported.contains("\"flat white, oat\""));

    expensectl(dir.path())
        .args(["report", "--user", "ada@example.com", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"total_transactions\": 2"));

    expensectl(dir.path())
        .args(["report", "--user", "ada@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("$4.50"));

    expensectl(dir.path())
        .args(["board", "init", "--user", "ada@example.com"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Expense Tracker"))
        .stdout(predicate::str::contains("4. Reimburse"));
}

#[test]
fn test_default_database_location_is_created() {
    let home = TempDir::new().unwrap();
    Command::cargo_bin("expensectl")
        .unwrap()
        .env("HOME", home.path())
        .env_remove("DATABASE_URL")
        .env_remove("EXPENSECTL_CONFIG")
        .env_remove("RUST_LOG")
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("up to date"));

    assert!(home.path().join(".expensectl/expenses.db").exists());
}

#[test]
fn test_unknown_user_fails() {
    let dir = TempDir::new().unwrap();
    expensectl(dir.path())
        .args(["report", "--user", "nobody@example.com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No user with email"));
}
