//! upcoming CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use upcoming_client::cli::{Cli, Command, ConfigAction};
use upcoming_client::commands;
use upcoming_client::config::AppConfig;
use upcoming_client::error::ClientResult;
use upcoming_core::init_tracing;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<()> {
    let config = AppConfig::resolve(&cli)?;
    init_tracing(config.tracing_config())?;
    debug!(config_dir = %config.config_dir.display(), "configuration resolved");

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => commands::show::run(&config).await,
        Command::Auth { force } => commands::auth::run(&config, force).await,
        Command::Config { action } => match action {
            ConfigAction::Path => commands::config::path(&config),
        },
    }
}
