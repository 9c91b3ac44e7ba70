//! Obtains a usable token: the cached one if still valid, otherwise a fresh
//! one from the interactive flow.

use tracing::info;

use crate::error::ApiResult;

use super::callback::CallbackServer;
use super::config::GoogleConfig;
use super::oauth::{AuthorizeOptions, OAuthClient, PkceFlow};
use super::tokens::{Token, TokenStore};

/// Where the token handed out by [`Authenticator::ensure_token`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Loaded from the token file.
    Cached(Token),
    /// Obtained through the browser flow and written to the token file.
    Authorized(Token),
}

impl AuthOutcome {
    /// Returns the token.
    pub fn into_token(self) -> Token {
        match self {
            Self::Cached(token) | Self::Authorized(token) => token,
        }
    }
}

/// Token cache plus interactive authorization.
#[derive(Debug)]
pub struct Authenticator {
    config: GoogleConfig,
    store: TokenStore,
    oauth: OAuthClient,
}

impl Authenticator {
    /// Creates an authenticator. Validates the configuration.
    pub fn new(config: GoogleConfig) -> ApiResult<Self> {
        config.validate()?;
        let store = TokenStore::new(&config.token_path);
        let oauth = OAuthClient::new(config.credentials.clone(), config.timeout)?;
        Ok(Self {
            config,
            store,
            oauth,
        })
    }

    /// The OAuth client, for later transparent refreshes.
    pub fn oauth_client(&self) -> &OAuthClient {
        &self.oauth
    }

    /// Returns a valid token.
    ///
    /// The listener is only bound when the cache has nothing usable.
    pub async fn ensure_token(&self) -> ApiResult<AuthOutcome> {
        if let Some(token) = self.store.load_valid() {
            info!("reusing existing token from {}", self.store.path().display());
            return Ok(AuthOutcome::Cached(token));
        }

        let server = CallbackServer::bind(&self.config.listen_addr).await?;
        self.authorize_and_save(server, PkceFlow::new()).await
    }

    /// Runs the browser flow on `server` and persists the resulting token.
    async fn authorize_and_save(
        &self,
        server: CallbackServer,
        pkce: PkceFlow,
    ) -> ApiResult<AuthOutcome> {
        let token = self
            .oauth
            .authorize(
                server,
                pkce,
                AuthorizeOptions {
                    redirect_uri: &self.config.redirect_uri,
                    scopes: &self.config.scopes,
                    callback_timeout: self.config.callback_timeout,
                    open_browser: self.config.open_browser,
                },
            )
            .await?;

        info!("saving credential file to {}", self.store.path().display());
        self.store.save(&token)?;
        Ok(AuthOutcome::Authorized(token))
    }
}
