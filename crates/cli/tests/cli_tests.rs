//! CLI integration tests

use std::process::Command;

fn vp(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_vp"))
        .args(args)
        .env_remove("VP_API_URL")
        .output()
        .expect("Failed to execute command")
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = vp(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Voyage Predictor"), "Should show app name");
    assert!(stdout.contains("train"), "Should show train command");
    assert!(stdout.contains("models"), "Should show models command");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("maintenance"), "Should show maintenance command");
}

/// Test that the CLI shows version
#[test]
fn test_cli_version() {
    let output = vp(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("vp"), "Should show binary name");
}

#[test]
fn test_models_help() {
    let output = vp(&["models", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--model-type"));
    assert!(stdout.contains("--active-only"));
}

#[test]
fn test_predict_route_help() {
    let output = vp(&["predict", "route", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for flag in ["--cargo-weight", "--distance", "--weather-severity", "--wind-speed"] {
        assert!(stdout.contains(flag), "Should show {}", flag);
    }
}

#[test]
fn test_predict_fuel_requires_features() {
    let output = vp(&["predict", "fuel", "--distance", "1200"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("--cargo-weight"));
}

#[test]
fn test_maintenance_requires_ship_id() {
    let output = vp(&["maintenance"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_format_rejected() {
    let output = vp(&["--format", "yaml", "models"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("yaml"));
}

#[test]
fn test_unreachable_server_fails_cleanly() {
    let output = vp(&["--api-url", "http://127.0.0.1:9", "models"]);
    let stderr = String::from_utf8_lossy(&output.stderr);

    assert!(!output.status.success());
    assert!(stderr.contains("Failed to send request"));
}
