//! Credential handling and event fetching for the `upcoming` agenda.
//!
//! - [`google::ClientSecret`] - OAuth client configuration from `credentials.json`
//! - [`google::TokenStore`] - the `token.json` cache
//! - [`google::Authenticator`] - cached-or-interactive authorization
//! - [`google::AuthorizedClient`] - token refresh and the events query
//! - [`ProviderError`] - error type for all of the above

pub mod error;
pub mod google;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
