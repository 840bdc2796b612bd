//! Turns a client configuration into an [`AuthorizedClient`].
//!
//! A cached token is used as-is. When none can be read, the interactive
//! authorization-code flow runs once through the injected [`AuthCodeSource`]
//! and its result is written to the token cache.

use tracing::info;

use crate::error::ProviderResult;

use super::client::AuthorizedClient;
use super::oauth::{AuthCodeSource, OAuthClient};
use super::tokens::{Token, TokenStore};

/// Drives authorization for one client configuration and token cache.
#[derive(Debug)]
pub struct Authenticator<S> {
    oauth: OAuthClient,
    store: TokenStore,
    codes: S,
}

impl<S: AuthCodeSource> Authenticator<S> {
    /// Creates an authenticator reading codes from `codes`.
    pub fn new(oauth: OAuthClient, store: TokenStore, codes: S) -> Self {
        Self {
            oauth,
            store,
            codes,
        }
    }

    /// Returns a client for the cached token, authorizing interactively
    /// first when there is no usable cache.
    pub async fn ensure_authorized_client(mut self) -> ProviderResult<AuthorizedClient> {
        let token = match self.store.load() {
            Ok(token) => token,
            Err(e) if e.is_recoverable() => {
                info!("{}; starting interactive authorization", e);
                self.authorize_and_save().await?
            }
            Err(e) => return Err(e),
        };
        Ok(self.into_client(token))
    }

    /// Authorizes interactively even when a cached token exists, replacing it.
    pub async fn reauthorize(mut self) -> ProviderResult<AuthorizedClient> {
        let token = self.authorize_and_save().await?;
        Ok(self.into_client(token))
    }

    async fn authorize_and_save(&mut self) -> ProviderResult<Token> {
        let token = self.oauth.authorize(&mut self.codes).await?;
        self.store.save(&token)?;
        self.codes.token_saved(self.store.path());
        info!("authorization successful");
        Ok(token)
    }

    fn into_client(self, token: Token) -> AuthorizedClient {
        AuthorizedClient::new(self.oauth, self.store, token)
    }
}
