//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// logreplay -- re-publish stored log objects as ingestion notifications.
///
/// Use `logreplay <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "logreplay", version, about, long_about = None)]
pub struct Cli {
    /// Path to a logreplay.toml configuration file (defaults + env when omitted).
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay every object under an S3 path as an "object created" notification.
    Replay(ReplayArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- replay ----

/// Replay stored objects to a notification topic.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Objects to replay, as s3://bucket[/prefix].
    pub s3_path: String,

    /// Topic name or full topic ARN.
    #[arg(long)]
    pub topic: Option<String>,

    /// AWS account id used to build the topic ARN.
    #[arg(long)]
    pub account: Option<String>,

    /// Region of the topic and the log type function.
    #[arg(long)]
    pub region: Option<String>,

    /// Region of the bucket, when different from --region.
    #[arg(long)]
    pub s3_region: Option<String>,

    /// Attach data type and log type message attributes.
    #[arg(long)]
    pub attributes: bool,

    /// Number of concurrent publisher workers.
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Stop after this many objects (0 = no limit).
    #[arg(long)]
    pub limit: Option<u64>,

    /// Write a Prometheus text snapshot of run metrics to this file.
    #[arg(long)]
    pub metrics_file: Option<PathBuf>,
}

// ---- config ----

/// Manage logreplay configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, aws, replay, log_types).
        #[arg(long)]
        section: Option<String>,
    },
}
