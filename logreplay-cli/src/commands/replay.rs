//! `logreplay replay` command handler
//!
//! Wires the AWS-backed store, sink and log type lookup into a
//! [`ReplayPipeline`](logreplay_pipeline::ReplayPipeline), runs it once and
//! renders a report. Statistics are reported even when the run fails.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use serde::Serialize;
use tracing::{info, warn};

use logreplay_core::config::LogReplayConfig;
use logreplay_core::metrics as m;
use logreplay_core::types::{RunStats, StatsSnapshot};
use logreplay_pipeline::aws;
use logreplay_pipeline::{
    LambdaLogTypeApi, Locator, LogTypeClassifier, ReplayPipelineBuilder, ReplayPipelineConfig,
    S3ObjectStore, SnsNotificationSink,
};

use crate::cli::ReplayArgs;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `replay` command.
///
/// # Errors
///
/// - `CliError::Config` for an invalid configuration or a malformed S3 path
/// - `CliError::Replay` for the last error reported during the run
pub async fn execute(
    args: ReplayArgs,
    mut config: LogReplayConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    apply_args(&mut config, &args);
    config.validate()?;

    // Reject a bad path before touching AWS.
    let locator = Locator::parse(&args.s3_path)?;

    let metrics = match args.metrics_file {
        Some(ref path) => Some((path.clone(), install_metrics_recorder()?)),
        None => None,
    };

    let sdk = aws::load_sdk_config(&config.aws).await;
    if config.aws.region.is_empty() {
        config.aws.region = aws::effective_region(&sdk, &config.aws);
    }
    let pipeline_config = ReplayPipelineConfig::from_core(&config)?;
    let topic_arn = pipeline_config.topic_arn.clone();

    let store = S3ObjectStore::new(aws::s3_client(&sdk, &config.aws));
    let sink = SnsNotificationSink::new(aws::sns_client(&sdk));
    let classifier = LogTypeClassifier::new(LambdaLogTypeApi::new(
        aws::lambda_client(&sdk),
        config.log_types.function_name.as_str(),
        config.log_types.method.as_str(),
    ));

    let pipeline = ReplayPipelineBuilder::new()
        .config(pipeline_config)
        .store(Arc::new(store))
        .sink(Arc::new(sink))
        .classifier(Arc::new(classifier))
        .build()?;

    info!(locator = %locator, topic_arn = %topic_arn, "replaying objects");

    let stats = Arc::new(RunStats::new());
    let started = Instant::now();
    let result = pipeline.run(&args.s3_path, &stats).await;

    let report = ReplayReport::new(
        &locator,
        topic_arn,
        stats.snapshot(),
        result.as_ref().ok().map(|summary| summary.published),
        started.elapsed(),
        result.as_ref().err().map(ToString::to_string),
    );
    writer.render(&report)?;

    if let Some((path, handle)) = metrics {
        write_metrics_snapshot(&path, &handle).await?;
    }

    result?;
    Ok(())
}

/// Fold command-line flags over the loaded configuration.
fn apply_args(config: &mut LogReplayConfig, args: &ReplayArgs) {
    if let Some(ref topic) = args.topic {
        config.replay.topic = topic.clone();
    }
    if let Some(ref account) = args.account {
        config.aws.account_id = account.clone();
    }
    if let Some(ref region) = args.region {
        config.aws.region = region.clone();
    }
    if let Some(ref s3_region) = args.s3_region {
        config.aws.s3_region = s3_region.clone();
    }
    if args.attributes {
        config.replay.attributes = true;
    }
    if let Some(concurrency) = args.concurrency {
        config.replay.concurrency = concurrency;
    }
    if let Some(limit) = args.limit {
        config.replay.limit = limit;
    }
}

/// Install a process-wide Prometheus recorder (no HTTP listener).
fn install_metrics_recorder() -> Result<PrometheusHandle, CliError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| CliError::Command(format!("failed to install metrics recorder: {e}")))?;
    m::describe_all();
    Ok(handle)
}

/// Write the current metrics in Prometheus text format.
async fn write_metrics_snapshot(path: &Path, handle: &PrometheusHandle) -> Result<(), CliError> {
    match tokio::fs::write(path, handle.render()).await {
        Ok(()) => {
            info!(path = %path.display(), "metrics snapshot written");
            Ok(())
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to write metrics snapshot");
            Err(CliError::Io(e))
        }
    }
}

/// Result of one replay run.
#[derive(Debug, Serialize)]
pub struct ReplayReport {
    pub locator: String,
    pub topic_arn: String,
    pub objects: u64,
    pub bytes: u64,
    /// Notifications published (absent when the run failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published: Option<u64>,
    pub elapsed_secs: f64,
    pub objects_per_sec: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReplayReport {
    fn new(
        locator: &Locator,
        topic_arn: String,
        stats: StatsSnapshot,
        published: Option<u64>,
        elapsed: Duration,
        error: Option<String>,
    ) -> Self {
        let elapsed_secs = elapsed.as_secs_f64();
        let objects_per_sec = if elapsed_secs > 0.0 {
            stats.objects as f64 / elapsed_secs
        } else {
            0.0
        };

        Self {
            locator: locator.to_string(),
            topic_arn,
            objects: stats.objects,
            bytes: stats.bytes,
            published,
            elapsed_secs,
            objects_per_sec,
            error,
        }
    }
}

impl Render for ReplayReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Replay: {}", self.locator.bold())?;
        writeln!(w, "  Topic:      {}", self.topic_arn)?;
        writeln!(w, "  Objects:    {}", self.objects)?;
        writeln!(w, "  Bytes:      {}", self.bytes)?;
        if let Some(published) = self.published {
            writeln!(w, "  Published:  {}", published)?;
        }
        writeln!(
            w,
            "  Elapsed:    {:.2}s ({:.1} objects/s)",
            self.elapsed_secs, self.objects_per_sec
        )?;

        match self.error {
            Some(ref err) => {
                writeln!(w, "  Result:     {}", "FAILED".red().bold())?;
                writeln!(w, "  Error:      {}", err.red())?;
            }
            None => writeln!(w, "  Result:     {}", "OK".green().bold())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    use crate::cli::{Cli, Commands};

    fn replay_args(extra: &[&str]) -> ReplayArgs {
        let mut argv = vec!["logreplay", "replay", "s3://bucket/logs/"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).expect("parse succeeded").command {
            Commands::Replay(args) => args,
            _ => panic!("expected Replay command"),
        }
    }

    fn locator() -> Locator {
        Locator::parse("s3://bucket/logs/").expect("valid locator")
    }

    #[test]
    fn test_apply_args_overrides_config() {
        let mut config = LogReplayConfig::default();
        let args = replay_args(&[
            "--topic",
            "my-topic",
            "--account",
            "123456789012",
            "--region",
            "eu-west-1",
            "--s3-region",
            "us-east-1",
            "--attributes",
            "--concurrency",
            "7",
            "--limit",
            "20",
        ]);

        apply_args(&mut config, &args);

        assert_eq!(config.replay.topic, "my-topic");
        assert_eq!(config.aws.account_id, "123456789012");
        assert_eq!(config.aws.region, "eu-west-1");
        assert_eq!(config.aws.s3_region, "us-east-1");
        assert!(config.replay.attributes);
        assert_eq!(config.replay.concurrency, 7);
        assert_eq!(config.replay.limit, 20);
    }

    #[test]
    fn test_apply_args_keeps_config_when_flags_absent() {
        let mut config = LogReplayConfig::default();
        config.replay.topic = "from-file".to_owned();
        config.replay.attributes = true;
        config.replay.concurrency = 3;

        apply_args(&mut config, &replay_args(&[]));

        assert_eq!(config.replay.topic, "from-file");
        assert!(config.replay.attributes, "absent flag must not clear file setting");
        assert_eq!(config.replay.concurrency, 3);
    }

    #[test]
    fn test_apply_args_out_of_range_concurrency_fails_validation() {
        let mut config = LogReplayConfig::default();
        apply_args(&mut config, &replay_args(&["--concurrency", "0"]));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_report_rates() {
        let report = ReplayReport::new(
            &locator(),
            "arn:aws:sns:us-east-1:123456789012:t".to_owned(),
            StatsSnapshot { objects: 100, bytes: 4096 },
            Some(100),
            Duration::from_secs(4),
            None,
        );
        assert_eq!(report.locator, "s3://bucket/logs/");
        assert!((report.objects_per_sec - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_report_zero_elapsed_has_zero_rate() {
        let report = ReplayReport::new(
            &locator(),
            "arn".to_owned(),
            StatsSnapshot::default(),
            Some(0),
            Duration::ZERO,
            None,
        );
        assert_eq!(report.objects_per_sec, 0.0);
    }

    #[test]
    fn test_report_render_text_success() {
        let report = ReplayReport::new(
            &locator(),
            "arn:aws:sns:us-east-1:123456789012:t".to_owned(),
            StatsSnapshot { objects: 2, bytes: 30 },
            Some(2),
            Duration::from_secs(1),
            None,
        );
        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("s3://bucket/logs/"));
        assert!(output.contains("Objects:    2"));
        assert!(output.contains("Bytes:      30"));
        assert!(output.contains("Published:  2"));
        assert!(output.contains("OK"));
        assert!(!output.contains("Error:"));
    }

    #[test]
    fn test_report_failed_run_keeps_partial_stats() {
        let report = ReplayReport::new(
            &locator(),
            "arn".to_owned(),
            StatsSnapshot { objects: 5, bytes: 50 },
            None,
            Duration::from_secs(1),
            Some("publish failed for 'logs/a/b'".to_owned()),
        );

        let json = serde_json::to_value(&report).expect("JSON serialization should succeed");
        assert_eq!(json["objects"].as_u64(), Some(5));
        assert_eq!(json["bytes"].as_u64(), Some(50));
        assert!(json.get("published").is_none());
        assert!(json["error"].as_str().is_some_and(|e| e.contains("logs/a/b")));

        let mut buffer = Vec::new();
        report.render_text(&mut buffer).expect("render should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");
        assert!(output.contains("FAILED"));
    }
}
