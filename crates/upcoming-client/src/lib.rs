//! CLI, configuration resolution and commands
//!
//! This crate provides the `upcoming` command-line interface.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;

pub use cli::Cli;
pub use config::AppConfig;
pub use error::{ClientError, ClientResult};
