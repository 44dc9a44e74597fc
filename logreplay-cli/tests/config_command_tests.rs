//! Integration tests for `logreplay config` and the replay command's
//! configuration path.
//!
//! Library-level tests load real TOML files through the core crate; the
//! binary-level tests run `logreplay` for paths that fail before any AWS call.

use std::fs;
use std::process::{Command, Output};

use serial_test::serial;
use tempfile::TempDir;

use logreplay_core::config::LogReplayConfig;
use logreplay_pipeline::{ReplayError, ReplayPipelineConfig};

fn logreplay(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_logreplay"))
        .args(args)
        .env_clear()
        .output()
        .expect("should spawn logreplay binary")
}

// =============================================================================
// Config loading
// =============================================================================

#[tokio::test]
#[serial]
async fn test_config_validate_valid_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("logreplay.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[aws]
region = "us-west-2"
account_id = "123456789012"

[replay]
topic = "panther-processed-data-notifications"
concurrency = 10
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    let result = LogReplayConfig::load(&config_path).await;
    assert!(result.is_ok(), "valid config should load successfully");
}

#[tokio::test]
#[serial]
async fn test_config_validate_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    fs::write(&config_path, "[replay\nconcurrency = 10\n").expect("should write bad config");

    let result = LogReplayConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
#[serial]
async fn test_config_validate_missing_file() {
    let result = LogReplayConfig::load("/nonexistent/logreplay.toml").await;
    assert!(result.is_err(), "missing file should fail to load");
}

#[tokio::test]
#[serial]
async fn test_config_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");
    fs::write(&config_path, "").expect("should write empty file");

    let config = LogReplayConfig::load(&config_path)
        .await
        .expect("empty file should fall back to defaults");
    assert_eq!(config.replay.concurrency, 50);
    assert_eq!(config.log_types.method, "listAvailableLogTypes");
}

// =============================================================================
// Core config -> pipeline config
// =============================================================================

#[test]
fn test_pipeline_config_from_topic_name() {
    let config = LogReplayConfig::parse(
        r#"
[aws]
region = "us-west-2"
account_id = "123456789012"

[replay]
topic = "panther-processed-data-notifications"
attributes = true
concurrency = 8
limit = 100
"#,
    )
    .expect("should parse");

    let pipeline = ReplayPipelineConfig::from_core(&config).expect("should derive pipeline config");
    assert_eq!(
        pipeline.topic_arn,
        "arn:aws:sns:us-west-2:123456789012:panther-processed-data-notifications"
    );
    assert!(pipeline.attributes);
    assert_eq!(pipeline.concurrency, 8);
    assert_eq!(pipeline.limit, 100);
}

#[test]
fn test_pipeline_config_topic_arn_used_verbatim() {
    let config = LogReplayConfig::parse(
        r#"
[replay]
topic = "arn:aws:sns:eu-central-1:210987654321:replay"
"#,
    )
    .expect("should parse");

    let pipeline = ReplayPipelineConfig::from_core(&config).expect("ARN needs no region/account");
    assert_eq!(pipeline.topic_arn, "arn:aws:sns:eu-central-1:210987654321:replay");
}

#[test]
fn test_pipeline_config_missing_account_is_config_error() {
    let config = LogReplayConfig::parse(
        r#"
[aws]
region = "us-west-2"

[replay]
topic = "my-topic"
"#,
    )
    .expect("should parse");

    let err = ReplayPipelineConfig::from_core(&config).expect_err("account id is required");
    assert!(matches!(err, ReplayError::Config { .. }));
    assert!(err.to_string().contains("account_id"));
}

// =============================================================================
// Binary
// =============================================================================

#[test]
#[serial]
fn test_binary_config_show_section_json() {
    let out = logreplay(&["config", "show", "--section", "replay", "--output", "json"]);
    assert!(out.status.success(), "config show should succeed: {out:?}");

    let parsed: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["section"].as_str(), Some("replay"));
    assert_eq!(parsed["source"].as_str(), Some("(defaults + environment)"));
}

#[test]
#[serial]
fn test_binary_config_validate_invalid_file_exits_2() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[replay]\nconcurrency = 0\n").expect("should write config");
    let path = config_path.to_str().expect("utf-8 temp path");

    let out = logreplay(&["config", "validate", "--config", path, "--output", "json"]);
    assert_eq!(out.status.code(), Some(2));

    let parsed: serde_json::Value =
        serde_json::from_slice(&out.stdout).expect("stdout should be JSON");
    assert_eq!(parsed["valid"].as_bool(), Some(false));
    assert!(
        parsed["errors"][0]
            .as_str()
            .is_some_and(|e| e.contains("replay.concurrency"))
    );
}

#[test]
#[serial]
fn test_binary_replay_malformed_locator_exits_2() {
    let out = logreplay(&[
        "replay",
        "gs://bucket/logs/",
        "--topic",
        "arn:aws:sns:us-east-1:123456789012:t",
    ]);
    assert_eq!(out.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("gs://bucket/logs/"), "stderr: {stderr}");
}

#[test]
#[serial]
fn test_binary_replay_invalid_concurrency_exits_2() {
    let out = logreplay(&["replay", "s3://bucket/logs/", "--concurrency", "5000"]);
    assert_eq!(out.status.code(), Some(2));
}

#[test]
#[serial]
fn test_binary_unknown_log_format_exits_2() {
    let out = Command::new(env!("CARGO_BIN_EXE_logreplay"))
        .args(["config", "show"])
        .env_clear()
        .env("LOGREPLAY_GENERAL_LOG_FORMAT", "xml")
        .output()
        .expect("should spawn logreplay binary");
    assert_eq!(out.status.code(), Some(2));
}
