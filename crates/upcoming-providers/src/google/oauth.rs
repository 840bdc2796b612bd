//! OAuth 2.0 authorization-code flow with PKCE, for a copy/paste install.
//!
//! # Flow Overview
//!
//! 1. Generate a code verifier, its SHA-256 challenge and a state value
//! 2. Build the authorization URL (offline access, so a refresh token is issued)
//! 3. The user opens it, grants access and pastes the code back
//! 4. Exchange the code (with verifier) for access and refresh tokens
//!
//! Access tokens are later renewed with [`OAuthClient::refresh_token`].

use std::io::{BufRead, Write};
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{ProviderError, ProviderResult};

use super::config::ClientSecret;
use super::tokens::Token;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Supplies the authorization code for an authorization URL.
///
/// The interactive implementation is [`PromptCodeSource`]; tests plug in a
/// canned code instead.
pub trait AuthCodeSource {
    /// Shows `auth_url` to the user and blocks until a code is entered.
    fn read_code(&mut self, auth_url: &str) -> ProviderResult<String>;

    /// Called once the freshly obtained token was written to `path`.
    fn token_saved(&mut self, _path: &Path) {}
}

/// Prompts on a writer and reads the code from a line of input.
#[derive(Debug)]
pub struct PromptCodeSource<R, W> {
    input: R,
    output: W,
}

impl PromptCodeSource<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompts on stdout and reads from stdin.
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptCodeSource<R, W> {
    /// Creates a prompt over arbitrary input and output streams.
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Returns the output stream.
    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> AuthCodeSource for PromptCodeSource<R, W> {
    fn read_code(&mut self, auth_url: &str) -> ProviderResult<String> {
        let prompt_err =
            |e: std::io::Error| ProviderError::input("unable to show authorization URL").with_source(e);
        writeln!(
            self.output,
            "Go to the following link in your browser then type the authorization code:\n{}",
            auth_url
        )
        .map_err(prompt_err)?;
        self.output.flush().map_err(prompt_err)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(|e| {
            ProviderError::input("unable to read authorization code").with_source(e)
        })?;
        if read == 0 {
            return Err(ProviderError::input(
                "unable to read authorization code: end of input",
            ));
        }

        let code = line.trim();
        if code.is_empty() {
            return Err(ProviderError::input("no authorization code entered"));
        }
        Ok(code.to_string())
    }

    fn token_saved(&mut self, path: &Path) {
        if let Err(e) = writeln!(self.output, "Saving credential file to: {}", path.display()) {
            warn!(path = %path.display(), "unable to report saved token location: {}", e);
        }
    }
}

/// OAuth client bound to one client configuration.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    secret: ClientSecret,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(secret: ClientSecret, http_client: reqwest::Client) -> Self {
        Self {
            secret,
            http_client,
        }
    }

    /// Returns the underlying HTTP client.
    pub fn http_client(&self) -> &reqwest::Client {
        &self.http_client
    }

    /// Runs the interactive flow: shows the authorization URL through
    /// `codes`, then exchanges the entered code for a token.
    pub async fn authorize<S: AuthCodeSource + ?Sized>(&self, codes: &mut S) -> ProviderResult<Token> {
        let pkce = PkceFlow::new();
        let auth_url = pkce.build_auth_url(&self.secret)?;
        debug!("authorization URL built");

        let code = codes.read_code(auth_url.as_str())?;

        info!("received authorization code, exchanging for tokens...");
        self.exchange_code(&code, &pkce.verifier).await
    }

    /// Exchanges an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str, verifier: &str) -> ProviderResult<Token> {
        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.secret.redirect_uri.as_str()),
        ];

        let response = self.post_token_endpoint(&params, "token exchange").await?;

        info!("successfully obtained tokens");
        Ok(Token {
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            ..Token::new(
                response.access_token,
                response.refresh_token,
                response.expires_in,
            )
        })
    }

    /// Obtains a new access token with a refresh token.
    ///
    /// The returned token keeps `refresh_token` when the provider does not
    /// rotate it.
    pub async fn refresh_token(&self, refresh_token: &str) -> ProviderResult<Token> {
        let params = [
            ("client_id", self.secret.client_id.as_str()),
            ("client_secret", self.secret.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token_endpoint(&params, "token refresh").await?;

        info!("successfully refreshed access token");
        Ok(Token {
            token_type: response.token_type.unwrap_or_else(|| "Bearer".to_string()),
            ..Token::new(
                response.access_token,
                response
                    .refresh_token
                    .or_else(|| Some(refresh_token.to_string())),
                response.expires_in,
            )
        })
    }

    async fn post_token_endpoint(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ProviderResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.secret.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| ProviderError::network(format!("{what} request failed")).with_source(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ProviderError::network("failed to read token response").with_source(e)
        })?;

        if !status.is_success() {
            return Err(ProviderError::authentication(format!(
                "{what} failed ({status}): {}",
                body.trim()
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response("invalid token response").with_source(e)
        })
    }
}

/// PKCE flow state and utilities.
///
/// Implements RFC 7636 (Proof Key for Code Exchange).
#[derive(Debug)]
pub(crate) struct PkceFlow {
    /// The code verifier (high-entropy random string).
    pub verifier: String,
    /// The code challenge (SHA-256 hash of verifier, base64url encoded).
    pub challenge: String,
    /// Random state echoed back by the provider.
    pub state: String,
}

impl PkceFlow {
    /// Creates a new PKCE flow with random verifier and state.
    pub(crate) fn new() -> Self {
        let verifier = random_token(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        let state = random_token(16);

        Self {
            verifier,
            challenge,
            state,
        }
    }

    /// Computes the SHA-256 challenge for a code verifier.
    fn compute_challenge(verifier: &str) -> String {
        let digest = Sha256::digest(verifier.as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }

    /// Builds the authorization URL for `secret`.
    ///
    /// Any query already present on the configured endpoint is preserved.
    pub(crate) fn build_auth_url(&self, secret: &ClientSecret) -> ProviderResult<url::Url> {
        let mut url = url::Url::parse(&secret.auth_uri).map_err(|e| {
            ProviderError::configuration(format!("invalid auth_uri: {}", secret.auth_uri))
                .with_source(e)
        })?;

        url.query_pairs_mut()
            .append_pair("access_type", "offline")
            .append_pair("client_id", &secret.client_id)
            .append_pair("redirect_uri", &secret.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &secret.scopes.join(" "))
            .append_pair("state", &self.state)
            .append_pair("code_challenge", &self.challenge)
            .append_pair("code_challenge_method", "S256");

        Ok(url)
    }
}

fn random_token(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}
