//! Client configuration.
//!
//! Settings are resolved once at startup, in priority order: command-line
//! flags, the optional `config.toml` in the configuration directory, then
//! built-in defaults. The configuration directory defaults to
//! `~/.config/calendar` and also holds `credentials.json` and `token.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use upcoming_core::{RenderError, Terminal, TracingConfig, TracingOutputFormat};
use upcoming_providers::google::EventQuery;

use crate::cli::Cli;
use crate::error::{ClientError, ClientResult};

/// OAuth client configuration file name.
pub const CREDENTIALS_FILE: &str = "credentials.json";
/// Cached token file name.
pub const TOKEN_FILE: &str = "token.json";
/// Optional settings file name.
pub const CONFIG_FILE: &str = "config.toml";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Calendar to list events from.
    pub calendar_id: Option<String>,

    /// Maximum number of events to show.
    pub max_results: Option<u32>,

    /// Box width in columns.
    pub width: Option<usize>,

    /// Debug mode.
    pub debug: bool,
}

impl FileConfig {
    /// Loads `config.toml` from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> ClientResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            ClientError::Config(format!("failed to parse {}: {}", path.display(), e))
        })
    }
}

/// Fully resolved settings, built in `main` and passed to the commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Directory holding the credential, token and settings files.
    pub config_dir: PathBuf,
    pub calendar_id: String,
    pub max_results: u32,
    /// Fixed box width; `None` means the detected terminal width.
    pub width: Option<usize>,
    pub debug: bool,
    pub log_format: TracingOutputFormat,
}

impl AppConfig {
    /// Resolves the configuration from parsed command-line flags.
    pub fn resolve(cli: &Cli) -> ClientResult<Self> {
        let config_dir = cli
            .config_dir
            .clone()
            .unwrap_or_else(Self::default_config_dir);
        let file = FileConfig::load(&config_dir.join(CONFIG_FILE))?;
        Self::merge(cli, config_dir, file)
    }

    fn merge(cli: &Cli, config_dir: PathBuf, file: FileConfig) -> ClientResult<Self> {
        let max_results = cli
            .limit
            .or(file.max_results)
            .unwrap_or(EventQuery::DEFAULT_MAX_RESULTS);
        if max_results == 0 {
            return Err(ClientError::Config(
                "max_results must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            config_dir,
            calendar_id: cli
                .calendar
                .clone()
                .or(file.calendar_id)
                .unwrap_or_else(|| EventQuery::PRIMARY.to_string()),
            max_results,
            width: cli.width.or(file.width),
            debug: cli.debug || file.debug,
            log_format: cli.log_format.into(),
        })
    }

    /// Returns the default configuration directory, `~/.config/calendar`.
    pub fn default_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("calendar")
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILE)
    }

    pub fn token_path(&self) -> PathBuf {
        self.config_dir.join(TOKEN_FILE)
    }

    pub fn config_file_path(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE)
    }

    /// The events query these settings describe.
    pub fn event_query(&self) -> EventQuery {
        EventQuery::new(&self.calendar_id).with_max_results(self.max_results)
    }

    /// Logging setup: warnings by default, debug with locations under `--debug`.
    pub fn tracing_config(&self) -> TracingConfig {
        let config = if self.debug {
            TracingConfig::cli_debug()
        } else {
            TracingConfig::default()
        };
        config.with_format(self.log_format)
    }

    /// The drawing surface: the configured width, or the terminal's.
    pub fn terminal(&self) -> Result<Terminal, RenderError> {
        match self.width {
            Some(width) => {
                let height = Terminal::detect().map_or(0, |t| t.height());
                Terminal::new(width, height)
            }
            None => Terminal::detect(),
        }
    }
}
