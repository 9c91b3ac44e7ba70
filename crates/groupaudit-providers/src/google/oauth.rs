//! OAuth 2.0 authorization-code flow with PKCE for installed applications.
//!
//! # Flow Overview
//!
//! 1. The caller binds a [`CallbackServer`] on the loopback address
//! 2. Generate a PKCE verifier/challenge and a random state
//! 3. Print (and optionally open) the authorization URL
//! 4. The browser redirects back to the listener with `code` and `state`
//! 5. Verify the state and exchange the code (with the verifier) for a token

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng as _;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};

use super::callback::CallbackServer;
use super::config::OAuthCredentials;
use super::tokens::Token;

/// The PKCE code verifier length (in bytes, before base64 encoding).
const CODE_VERIFIER_LENGTH: usize = 32;

/// Client for Google's OAuth endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    credentials: OAuthCredentials,
    http_client: reqwest::Client,
}

/// Options for one interactive authorization.
#[derive(Debug, Clone)]
pub struct AuthorizeOptions<'a> {
    /// Redirect URI registered for the client; must reach the listener.
    pub redirect_uri: &'a str,
    /// Scopes to request.
    pub scopes: &'a [String],
    /// How long to wait for the browser callback.
    pub callback_timeout: Duration,
    /// Whether to also open the URL in the system browser.
    pub open_browser: bool,
}

impl OAuthClient {
    /// Creates a new OAuth client.
    pub fn new(credentials: OAuthCredentials, timeout: Duration) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            credentials,
            http_client,
        })
    }

    /// Runs the interactive flow for `pkce` on an already bound listener
    /// and returns the obtained token.
    ///
    /// # Errors
    ///
    /// Returns an error if the user denies access, the callback does not
    /// arrive within `options.callback_timeout`, the state does not match,
    /// or the token exchange fails.
    pub async fn authorize(
        &self,
        server: CallbackServer,
        pkce: PkceFlow,
        options: AuthorizeOptions<'_>,
    ) -> ApiResult<Token> {
        let auth_url = pkce.build_auth_url(
            &self.credentials.auth_uri,
            &self.credentials.client_id,
            options.redirect_uri,
            options.scopes,
        );

        debug!("authorization URL: {}", auth_url);
        eprintln!(
            "Go to the following link in your browser and complete the authentication:\n{}\n",
            auth_url
        );

        if options.open_browser
            && let Err(e) = open::that(&auth_url)
        {
            warn!("failed to open browser: {}", e);
        }

        let callback = server.wait_for_code(options.callback_timeout).await?;

        if callback.state.as_deref() != Some(pkce.state.as_str()) {
            return Err(ApiError::authentication(
                "OAuth state mismatch in authorization callback",
            ));
        }

        info!("received authorization code, exchanging for token");
        self.exchange_code(&callback.code, &pkce.verifier, options.redirect_uri)
            .await
    }

    /// Exchanges an authorization code for a token.
    pub async fn exchange_code(
        &self,
        code: &str,
        verifier: &str,
        redirect_uri: &str,
    ) -> ApiResult<Token> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("code", code),
            ("code_verifier", verifier),
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
        ];

        let response = self.post_token_request(&params, "token exchange").await?;
        info!("obtained OAuth token");
        Ok(response.into_token(None))
    }

    /// Obtains a fresh access token with a refresh token.
    ///
    /// Google usually omits the refresh token in refresh responses; the one
    /// passed in is kept in that case.
    pub async fn refresh_token(&self, refresh_token: &str) -> ApiResult<Token> {
        let params = [
            ("client_id", self.credentials.client_id.as_str()),
            ("client_secret", self.credentials.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.post_token_request(&params, "token refresh").await?;
        info!("refreshed access token");
        Ok(response.into_token(Some(refresh_token)))
    }

    async fn post_token_request(
        &self,
        params: &[(&str, &str)],
        what: &str,
    ) -> ApiResult<TokenResponse> {
        let response = self
            .http_client
            .post(&self.credentials.token_uri)
            .form(params)
            .send()
            .await
            .map_err(|e| ApiError::network(format!("{} request failed: {}", what, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("failed to read {} response: {}", what, e)))?;

        if !status.is_success() {
            return Err(ApiError::authentication(format!(
                "{} failed ({}): {}",
                what,
                status,
                describe_token_error(&body)
            )));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::invalid_response(format!("invalid {} response: {}", what, e))
        })
    }
}

/// PKCE verifier, challenge, and CSRF state for one authorization.
///
/// Implements RFC 7636 with the S256 method.
#[derive(Debug)]
pub struct PkceFlow {
    /// High-entropy random code verifier.
    pub verifier: String,
    /// SHA-256 of the verifier, base64url encoded.
    pub challenge: String,
    /// Random state echoed back by the authorization server.
    pub state: String,
}

impl PkceFlow {
    /// Creates a flow with a random verifier and state.
    pub fn new() -> Self {
        let verifier = random_urlsafe(CODE_VERIFIER_LENGTH);
        let challenge = Self::compute_challenge(&verifier);
        let state = random_urlsafe(16);

        Self {
            verifier,
            challenge,
            state,
        }
    }

    fn compute_challenge(verifier: &str) -> String {
        URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
    }

    /// Builds the authorization URL requesting offline access.
    pub fn build_auth_url(
        &self,
        auth_uri: &str,
        client_id: &str,
        redirect_uri: &str,
        scopes: &[String],
    ) -> String {
        let scope = scopes.join(" ");

        format!(
            "{}?access_type=offline&client_id={}&redirect_uri={}&response_type=code&scope={}&\
            state={}&code_challenge={}&code_challenge_method=S256",
            auth_uri,
            urlencoding::encode(client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(&scope),
            urlencoding::encode(&self.state),
            urlencoding::encode(&self.challenge),
        )
    }
}

impl Default for PkceFlow {
    fn default() -> Self {
        Self::new()
    }
}

fn random_urlsafe(len: usize) -> String {
    let mut rng = rand::rng();
    let bytes: Vec<u8> = (0..len).map(|_| rng.random()).collect();
    URL_SAFE_NO_PAD.encode(&bytes)
}

/// Response from Google's token endpoint.
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

impl TokenResponse {
    fn into_token(self, previous_refresh: Option<&str>) -> Token {
        let refresh_token = self
            .refresh_token
            .or_else(|| previous_refresh.map(String::from));
        Token::from_response(
            self.access_token,
            self.token_type,
            refresh_token,
            self.expires_in,
        )
    }
}

/// Error body returned by the token endpoint.
#[derive(Debug, serde::Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn describe_token_error(body: &str) -> String {
    match serde_json::from_str::<TokenErrorResponse>(body) {
        Ok(TokenErrorResponse {
            error,
            error_description: Some(description),
        }) => format!("{} ({})", error, description),
        Ok(TokenErrorResponse { error, .. }) => error,
        Err(_) => body.trim().to_string(),
    }
}
