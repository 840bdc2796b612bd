//! OAuth token model and the on-disk token cache.
//!
//! The cache layout is the one widely used by OAuth2 client libraries:
//!
//! ```json
//! {"access_token": "...", "token_type": "Bearer", "refresh_token": "...", "expiry": "2024-03-15T10:00:00Z"}
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ProviderError, ProviderResult};

/// Tokens are treated as expired this long before their stated expiry.
const EXPIRY_DELTA_SECS: i64 = 10;

/// An OAuth access token, with the refresh token used to renew it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer credential attached to API requests.
    pub access_token: String,

    /// Token type, `Bearer` in practice.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Long-lived credential used to obtain new access tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires. `None` means it never does.
    #[serde(
        default,
        serialize_with = "serialize_expiry",
        deserialize_with = "deserialize_expiry"
    )]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Written in place of a missing expiry.
const ZERO_EXPIRY: &str = "0001-01-01T00:00:00Z";

fn serialize_expiry<S>(expiry: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match expiry {
        Some(expiry) => expiry.serialize(serializer),
        None => serializer.serialize_str(ZERO_EXPIRY),
    }
}

/// Treats the zero timestamp (`0001-01-01T00:00:00Z`) as "no expiry".
fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let expiry = Option::<DateTime<Utc>>::deserialize(deserializer)?;
    Ok(expiry.filter(|e| e.year() > 1))
}

impl Token {
    /// Builds a token from a token endpoint response.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            refresh_token,
            expiry: expires_in_secs.map(|secs| Utc::now() + Duration::seconds(secs)),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the token counts as expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_DELTA_SECS) >= expiry,
            None => false,
        }
    }
}

/// File-backed token cache.
///
/// A missing, unreadable or malformed file is reported as
/// [`ProviderErrorCode::NotFound`](crate::ProviderErrorCode::NotFound), which
/// callers treat as "authorize again". Failing to write is fatal.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the cached token.
    pub fn load(&self) -> ProviderResult<Token> {
        let content = fs::read_to_string(&self.path).map_err(|e| {
            ProviderError::not_found(format!("no cached token at {}", self.path.display()))
                .with_source(e)
        })?;

        let token: Token = serde_json::from_str(&content).map_err(|e| {
            ProviderError::not_found(format!(
                "unreadable cached token at {}",
                self.path.display()
            ))
            .with_source(e)
        })?;

        debug!(path = %self.path.display(), "loaded cached token");
        Ok(token)
    }

    /// Writes `token`, replacing any previous cache. The file is readable and
    /// writable by its owner only.
    pub fn save(&self, token: &Token) -> ProviderResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ProviderError::configuration(format!(
                    "unable to create token directory {}",
                    parent.display()
                ))
                .with_source(e)
            })?;
        }

        let content = serde_json::to_string(token).map_err(|e| {
            ProviderError::internal("failed to serialize token").with_source(e)
        })?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let write_err = |e: std::io::Error| {
            ProviderError::configuration(format!(
                "unable to cache oauth token at {}",
                self.path.display()
            ))
            .with_source(e)
        };

        let mut file = options.open(&self.path).map_err(write_err)?;
        // `mode` only applies on creation; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(write_err)?;
        }
        file.write_all(content.as_bytes()).map_err(write_err)?;
        file.write_all(b"\n").map_err(write_err)?;

        info!(path = %self.path.display(), "saved token");
        Ok(())
    }
}
