//! Google Calendar access for the agenda view.
//!
//! # Authentication Flow
//!
//! 1. The OAuth client configuration is read from `credentials.json`
//! 2. A cached token is read from `token.json`, if present
//! 3. Otherwise the user opens the printed authorization URL, grants
//!    read-only calendar access and pastes the code back
//! 4. The code is exchanged for access and refresh tokens, which are
//!    written to `token.json` with owner-only permissions
//! 5. Expired access tokens are refreshed silently before each request
//!
//! # Example
//!
//! ```ignore
//! use upcoming_providers::google::{
//!     default_http_client, Authenticator, ClientSecret, EventQuery, OAuthClient,
//!     PromptCodeSource, TokenStore,
//! };
//!
//! let secret = ClientSecret::load("credentials.json")?;
//! let oauth = OAuthClient::new(secret, default_http_client()?);
//! let client = Authenticator::new(oauth, TokenStore::new("token.json"), PromptCodeSource::stdio())
//!     .ensure_authorized_client()
//!     .await?;
//! let events = client.fetch_upcoming_events(&EventQuery::default()).await?;
//! ```

mod authenticator;
mod client;
mod config;
mod oauth;
#[cfg(test)]
mod test_support;
mod tokens;

pub use authenticator::Authenticator;
pub use client::{AuthorizedClient, CALENDAR_API_BASE, EventQuery};
pub use config::{
    CALENDAR_READONLY_SCOPE, ClientSecret, DEFAULT_REDIRECT_URI, GOOGLE_AUTH_URI,
    GOOGLE_TOKEN_URI,
};
pub use oauth::{AuthCodeSource, OAuthClient, PromptCodeSource};
pub use tokens::{Token, TokenStore};

use crate::error::{ProviderError, ProviderResult};

/// Builds the HTTP client shared by the OAuth and Calendar API calls.
///
/// No request timeout is set.
pub fn default_http_client() -> ProviderResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("upcoming/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ProviderError::internal("failed to create HTTP client").with_source(e))
}
