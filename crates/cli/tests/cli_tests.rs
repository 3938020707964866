//! CLI integration tests

use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn rulctl(args: &[&str]) -> Output {
    Command::new("cargo")
        .args(["run", "-q", "-p", "rul-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute command")
}

fn write_bundle(dir: &Path) {
    let files = [
        (
            "feature_schema.json",
            json!({
                "artifact_version": "baseline_v1",
                "features": ["sensor_4", "sensor_11"],
                "training_stats": {
                    "sensor_4": {"min": 0.0, "max": 10.0, "mean": 5.0, "std": 2.0},
                    "sensor_11": {"min": 0.0, "max": 1.0, "mean": 0.5, "std": 0.1}
                }
            }),
        ),
        (
            "metrics.json",
            json!({
                "artifact_version": "baseline_v1",
                "validation_metrics": {"mae": 2.0, "rmse": 2.6, "r2": 0.71},
                "model_coefficients": {"sensor_4": -3.0, "sensor_11": 1.0},
                "intercept": 70.0,
                "decision_policy": {"k": 1.0}
            }),
        ),
        (
            "scaler.json",
            json!({"features": ["sensor_4", "sensor_11"], "mean": [5.0, 0.5], "scale": [2.0, 0.1]}),
        ),
    ];
    for (name, value) in files {
        fs::write(dir.join(name), value.to_string()).unwrap();
    }
}

/// Test that the CLI shows help
#[test]
fn test_cli_help() {
    let output = rulctl(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("RUL Decision Engine"), "Should show app name");
    assert!(stdout.contains("predict"), "Should show predict command");
    assert!(stdout.contains("model"), "Should show model command");
    assert!(stdout.contains("health"), "Should show health command");
    assert!(stdout.contains("audit"), "Should show audit command");
}

#[test]
fn test_cli_version() {
    let output = rulctl(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("rulctl"), "Should show binary name");
}

#[test]
fn test_predict_help() {
    let output = rulctl(&["predict", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--feature"), "Should show feature option");
    assert!(stdout.contains("--input"), "Should show input option");
    assert!(stdout.contains("--artifacts"), "Should show artifacts option");
}

#[test]
fn test_malformed_feature_rejected() {
    let output = rulctl(&["predict", "--feature", "sensor_4"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("NAME=VALUE"));
}

#[test]
fn test_local_predict_writes_audit_log() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path());
    let audit_log = temp_dir.path().join("logs").join("inference.jsonl");
    let artifacts = temp_dir.path().to_str().unwrap();
    let audit = audit_log.to_str().unwrap();

    let output = rulctl(&[
        "predict",
        "--artifacts",
        artifacts,
        "--audit-log",
        audit,
        "--format",
        "json",
        "-F",
        "sensor_4=5.0",
        "-F",
        "sensor_11=0.5",
    ]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["rul_pred"], 70.0);
    assert_eq!(body["rul_lower"], 68.0);
    assert_eq!(body["risk_band"], "GREEN");
    assert_eq!(body["audit_logged"], true);

    let raw = fs::read_to_string(&audit_log).unwrap();
    assert_eq!(raw.lines().count(), 1);

    let output = rulctl(&["audit", audit, "--format", "json"]);
    assert!(output.status.success());
    let records: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(records.as_array().unwrap().len(), 1);
}

#[test]
fn test_local_predict_reports_missing_feature() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path());
    let audit_log = temp_dir.path().join("inference.jsonl");

    let output = rulctl(&[
        "predict",
        "--artifacts",
        temp_dir.path().to_str().unwrap(),
        "--audit-log",
        audit_log.to_str().unwrap(),
        "-F",
        "sensor_4=5.0",
    ]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("sensor_11"), "stderr: {}", stderr);
}

#[test]
fn test_local_model_shows_bundle() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path());
    let audit_log = temp_dir.path().join("inference.jsonl");

    let output = rulctl(&[
        "model",
        "--artifacts",
        temp_dir.path().to_str().unwrap(),
        "--audit-log",
        audit_log.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(output.status.success());
    let body: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(body["artifact_version"], "baseline_v1");
    assert_eq!(body["feature_order"], json!(["sensor_4", "sensor_11"]));
}

#[test]
fn test_health_fails_without_service() {
    let output = rulctl(&["--api-url", "http://127.0.0.1:1", "health"]);
    assert!(!output.status.success());
}

#[test]
fn test_invalid_command() {
    let output = rulctl(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
}
