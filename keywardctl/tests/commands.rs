use assert_cmd::cargo::cargo_bin_cmd;
use base64::{Engine, engine::general_purpose::STANDARD};
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SECRET: &str = "cli-test-secret-0123456789abcdefghijkl";

#[test]
fn generate_secret_prints_requested_length() {
    let mut cmd = cargo_bin_cmd!("keywardctl");
    let output = cmd
        .arg("generate-secret")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let secret = String::from_utf8_lossy(&output);
    assert_eq!(STANDARD.decode(secret.trim()).unwrap().len(), 48);

    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.args(["generate-secret", "--bytes", "16"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 32"));
}

#[test]
fn hashed_credential_verifies() {
    let mut cmd = cargo_bin_cmd!("keywardctl");
    let output = cmd
        .args(["hash-password", "--stdin", "--iterations", "1000"])
        .write_stdin("Password@123\n")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let credential = String::from_utf8_lossy(&output).trim().to_string();
    assert!(credential.contains("\"version\":1"));

    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.args(["verify-password", "--credential", &credential, "--stdin"])
        .write_stdin("Password@123\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("match"));

    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.args(["verify-password", "--credential", &credential, "Password@124"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("no match"));
}

#[test]
fn weak_passwords_are_refused() {
    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.args(["hash-password", "--iterations", "1000", "Sh0rt!"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("at least 10 characters"));
}

#[test]
fn check_config_accepts_a_sound_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keyward.toml");
    fs::write(
        &path,
        format!("[tokens]\nsigning_secret = \"{SECRET}\"\nissuer = \"accounts.example\"\n"),
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.current_dir(dir.path())
        .env_remove("KEYWARD_SIGNING_SECRET")
        .env_remove("KEYWARD_DEV_MODE")
        .arg("check-config")
        .arg("--config")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("issuer=accounts.example"));
}

#[test]
fn check_config_rejects_a_weak_secret() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("keyward.toml");
    fs::write(&path, "[tokens]\nsigning_secret = \"short\"\n").unwrap();

    let mut cmd = cargo_bin_cmd!("keywardctl");
    cmd.current_dir(dir.path())
        .env_remove("KEYWARD_SIGNING_SECRET")
        .env_remove("KEYWARD_DEV_MODE")
        .arg("check-config")
        .arg("--config")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("signing secret"));
}
