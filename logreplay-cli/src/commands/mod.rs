//! Command handlers -- one module per subcommand

pub mod config;
pub mod replay;

use std::path::Path;

use logreplay_core::config::LogReplayConfig;
use logreplay_core::error::LogReplayError;

/// Load the effective configuration.
///
/// With a path: file + env overrides. Without: defaults + env overrides.
pub async fn load_config(path: Option<&Path>) -> Result<LogReplayConfig, LogReplayError> {
    match path {
        Some(path) => LogReplayConfig::load(path).await,
        None => LogReplayConfig::from_env(),
    }
}

/// Human-readable description of where the configuration came from.
pub fn config_source(path: Option<&Path>) -> String {
    match path {
        Some(path) => path.display().to_string(),
        None => "(defaults + environment)".to_owned(),
    }
}
