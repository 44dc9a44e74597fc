//! CLI-specific error types and exit code mapping

use logreplay_core::error::LogReplayError;
use logreplay_pipeline::ReplayError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure (including a malformed S3 path).
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The replay run reported an error.
    #[error("replay failed: {0}")]
    Replay(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from logreplay-core.
    #[error("{0}")]
    Core(#[from] LogReplayError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | Replay / command error           |
    /// | 2    | Configuration or S3 path error   |
    /// | 10   | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(LogReplayError::Config(_)) => 2,
            Self::Io(_) | Self::Core(LogReplayError::Io(_)) => 10,
            Self::JsonSerialize(_) | Self::Command(_) | Self::Replay(_) | Self::Core(_) => 1,
        }
    }
}

impl From<ReplayError> for CliError {
    fn from(e: ReplayError) -> Self {
        match e {
            ReplayError::Locator { .. } | ReplayError::Config { .. } => Self::Config(e.to_string()),
            other => Self::Replay(other.to_string()),
        }
    }
}
