//! logreplay -- replays stored log objects as "object created" notifications.
//!
//! Startup order:
//! 1. Parse arguments
//! 2. Load configuration (file or defaults, then env overrides)
//! 3. Initialize tracing from `[general]` (`--log-level` wins over the file)
//! 4. Dispatch the subcommand and map failures to exit codes

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();
    let loaded = commands::load_config(config_path).await;

    // `config validate` reports load failures itself, so tracing falls back to defaults.
    let mut general = loaded
        .as_ref()
        .map(|config| config.general.clone())
        .unwrap_or_default();
    if let Some(ref level) = cli.log_level {
        general.log_level = level.clone();
    }
    logging::init_tracing(&general).map_err(|e| CliError::Config(format!("{e:#}")))?;

    let writer = OutputWriter::new(cli.output);

    match cli.command {
        Commands::Replay(args) => commands::replay::execute(args, loaded?, &writer).await,
        Commands::Config(args) => commands::config::execute(args, config_path, &writer).await,
    }
}
