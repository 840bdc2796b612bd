//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use upcoming_core::TracingOutputFormat;

/// upcoming - Your next Google Calendar events in a box
#[derive(Debug, Parser)]
#[command(name = "upcoming")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory holding credentials.json, token.json and config.toml
    #[arg(long, env = "UPCOMING_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Calendar to list events from
    #[arg(long)]
    pub calendar: Option<String>,

    /// Maximum number of events to show
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub limit: Option<u32>,

    /// Box width in columns, instead of the detected terminal width
    #[arg(long)]
    pub width: Option<usize>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    pub debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show upcoming events (the default)
    Show,

    /// Authorize access to Google Calendar and cache the token
    Auth {
        /// Run the authorization flow even if a token is cached
        #[arg(long, short)]
        force: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum ConfigAction {
    /// Show configuration directory and file paths
    Path,
}

/// Log formats accepted by `--log-format`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}
