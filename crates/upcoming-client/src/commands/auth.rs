//! Authorization command.

use tracing::info;
use upcoming_providers::google::TokenStore;

use crate::config::AppConfig;
use crate::error::ClientResult;

/// Makes sure a token is cached, running the interactive flow when none is,
/// or unconditionally with `force`.
pub async fn run(config: &AppConfig, force: bool) -> ClientResult<()> {
    let store = TokenStore::new(config.token_path());

    if !force && has_cached_token(&store)? {
        println!(
            "Already authorized with Google Calendar, token cached at {}.",
            store.path().display()
        );
        println!("Use --force to re-authorize.");
        return Ok(());
    }

    super::terminal_authenticator(config)?.reauthorize().await?;

    info!("Google authorization successful");
    println!("Authorization successful.");
    Ok(())
}

fn has_cached_token(store: &TokenStore) -> ClientResult<bool> {
    match store.load() {
        Ok(_) => Ok(true),
        Err(e) if e.is_recoverable() => Ok(false),
        Err(e) => Err(e.into()),
    }
}
