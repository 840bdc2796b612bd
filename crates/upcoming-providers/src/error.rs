//! Errors raised while reading credentials, authorizing or listing events.

use std::fmt;
use thiserror::Error;

/// What went wrong, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// The token endpoint rejected the code or refresh token, or the API
    /// rejected the access token (401).
    AuthenticationFailed,
    /// The API refused access to the calendar, or the quota is used up (403).
    AuthorizationFailed,
    /// The request never got an HTTP response.
    NetworkError,
    /// 429 from the API.
    RateLimited,
    /// Any other non-success status.
    ServerError,
    /// A 2xx body that is not the expected JSON.
    InvalidResponse,
    /// No usable `token.json`.
    NotFound,
    /// The requested calendar does not exist (404).
    CalendarError,
    /// `credentials.json` is missing or malformed, or a file cannot be written.
    ConfigurationError,
    /// The authorization code could not be read from the user.
    InputError,
    InternalError,
}

impl ProviderErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::CalendarError => "calendar_error",
            Self::ConfigurationError => "configuration_error",
            Self::InputError => "input_error",
            Self::InternalError => "internal_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error from the credential files, the OAuth endpoints or the Calendar API.
///
/// Displays as `<code>: <message>`; the underlying cause, if any, is
/// available through [`std::error::Error::source`].
#[derive(Debug, Error)]
pub struct ProviderError {
    code: ProviderErrorCode,
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// The token cache is missing or unreadable.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    pub fn calendar(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::CalendarError, message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InputError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InternalError, message)
    }

    /// Attaches the underlying cause.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// True when the caller may fall back to interactive authorization,
    /// which is only the case for a missing or unreadable token cache.
    pub fn is_recoverable(&self) -> bool {
        self.code == ProviderErrorCode::NotFound
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn only_a_missing_token_cache_is_recoverable() {
        assert!(ProviderError::not_found("no token.json").is_recoverable());
        assert!(!ProviderError::calendar("calendar nope not found").is_recoverable());
        assert!(!ProviderError::configuration("bad credentials.json").is_recoverable());
        assert!(!ProviderError::authentication("invalid_grant").is_recoverable());
        assert!(!ProviderError::input("end of input").is_recoverable());
    }

    #[test]
    fn display_prefixes_the_code() {
        let err = ProviderError::rate_limited("rate limit exceeded");
        assert_eq!(err.to_string(), "rate_limited: rate limit exceeded");
        assert_eq!(err.code(), ProviderErrorCode::RateLimited);
        assert_eq!(err.message(), "rate limit exceeded");
        assert_eq!(ProviderErrorCode::CalendarError.to_string(), "calendar_error");
    }

    #[test]
    fn source_is_kept() {
        let err = ProviderError::configuration("unable to write token.json")
            .with_source(std::io::Error::other("read-only file system"));
        assert_eq!(
            err.source().map(|e| e.to_string()).as_deref(),
            Some("read-only file system")
        );
        assert!(ProviderError::network("request failed").source().is_none());
    }
}
