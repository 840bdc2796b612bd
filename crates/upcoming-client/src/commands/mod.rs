//! Command implementations.

pub mod auth;
pub mod config;
pub mod show;

use std::io::{StdinLock, Stdout};

use upcoming_providers::google::{
    Authenticator, ClientSecret, OAuthClient, PromptCodeSource, TokenStore, default_http_client,
};

use crate::config::AppConfig;
use crate::error::ClientResult;

type TerminalAuthenticator = Authenticator<PromptCodeSource<StdinLock<'static>, Stdout>>;

/// Authenticator for the configured credential and token files that prompts
/// for the authorization code on the terminal.
fn terminal_authenticator(config: &AppConfig) -> ClientResult<TerminalAuthenticator> {
    let secret = ClientSecret::load(config.credentials_path())?;
    let oauth = OAuthClient::new(secret, default_http_client()?);
    Ok(Authenticator::new(
        oauth,
        TokenStore::new(config.token_path()),
        PromptCodeSource::stdio(),
    ))
}
