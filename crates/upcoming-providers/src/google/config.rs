//! OAuth client configuration from a provider-issued `credentials.json`.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};

/// Google OAuth authorization endpoint.
pub const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
/// Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Read-only calendar scope.
pub const CALENDAR_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Redirect used when the credentials file lists none.
pub const DEFAULT_REDIRECT_URI: &str = "http://localhost";

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console layout with an `installed` or `web` section,
/// and the flat layout with the fields at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<CredentialFields>,
    web: Option<CredentialFields>,
    #[serde(flatten)]
    flat: CredentialFields,
}

#[derive(Debug, Default, Deserialize)]
struct CredentialFields {
    client_id: Option<String>,
    client_secret: Option<String>,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

/// OAuth client configuration: who we are and where the endpoints live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSecret {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Authorization endpoint the user is sent to.
    pub auth_uri: String,
    /// Token endpoint codes and refresh tokens are exchanged at.
    pub token_uri: String,
    /// Redirect URI registered for this client.
    pub redirect_uri: String,
    /// Scopes requested during authorization.
    pub scopes: Vec<String>,
}

impl ClientSecret {
    /// Creates a configuration for Google's endpoints.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URI.to_string(),
            token_uri: GOOGLE_TOKEN_URI.to_string(),
            redirect_uri: DEFAULT_REDIRECT_URI.to_string(),
            scopes: vec![CALENDAR_READONLY_SCOPE.to_string()],
        }
    }

    /// Loads the client configuration from a credentials JSON file.
    pub fn load(path: impl AsRef<Path>) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::configuration(format!(
                "unable to read client secret file {}",
                path.display()
            ))
            .with_source(e)
        })?;
        let secret = Self::from_json(&content)?;
        debug!(path = %path.display(), "loaded client secret");
        Ok(secret)
    }

    /// Parses the client configuration from a credentials JSON string.
    pub fn from_json(json: &str) -> ProviderResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ProviderError::configuration("unable to parse client secret file").with_source(e)
        })?;

        let fields = file.installed.or(file.web).unwrap_or(file.flat);

        let (Some(client_id), Some(client_secret)) = (fields.client_id, fields.client_secret)
        else {
            return Err(ProviderError::configuration(
                "client secret file must contain client_id and client_secret, \
                 either in an 'installed'/'web' section or at the root",
            ));
        };

        let mut secret = Self::new(client_id, client_secret);
        if let Some(auth_uri) = fields.auth_uri {
            secret.auth_uri = auth_uri;
        }
        if let Some(token_uri) = fields.token_uri {
            secret.token_uri = token_uri;
        }
        if let Some(redirect_uri) = fields.redirect_uris.into_iter().next() {
            secret.redirect_uri = redirect_uri;
        }
        secret.validate()?;
        Ok(secret)
    }

    /// Sets the token endpoint.
    pub fn with_token_uri(mut self, token_uri: impl Into<String>) -> Self {
        self.token_uri = token_uri.into();
        self
    }

    /// Checks the fields are usable.
    pub fn validate(&self) -> ProviderResult<()> {
        if self.client_id.is_empty() {
            return Err(ProviderError::configuration("client_id is empty"));
        }
        if self.client_secret.is_empty() {
            return Err(ProviderError::configuration("client_secret is empty"));
        }
        for (name, uri) in [("auth_uri", &self.auth_uri), ("token_uri", &self.token_uri)] {
            url::Url::parse(uri).map_err(|e| {
                ProviderError::configuration(format!("{name} is not a valid URL: {uri}"))
                    .with_source(e)
            })?;
        }
        if self.scopes.is_empty() {
            return Err(ProviderError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        Ok(())
    }
}
