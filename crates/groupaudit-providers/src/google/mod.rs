//! Google Workspace backend.
//!
//! # Authentication Flow
//!
//! 1. The operator provides an OAuth client secret file (`key.json`)
//! 2. A still-valid token in `token.json` is reused as-is
//! 3. Otherwise a one-shot callback listener is bound and the
//!    authorization URL is printed
//! 4. The browser redirects to the listener with the authorization code
//! 5. The code is exchanged (with the PKCE verifier) and the token is saved
//!
//! # Example
//!
//! ```ignore
//! use groupaudit_providers::google::{
//!     AuthorizedClient, Authenticator, GoogleConfig, GoogleWorkspace, OAuthCredentials,
//! };
//!
//! let config = GoogleConfig::new(OAuthCredentials::from_file("key.json")?);
//! let auth = Authenticator::new(config.clone())?;
//! let token = auth.ensure_token().await?.into_token();
//! let client = AuthorizedClient::new(
//!     token,
//!     auth.oauth_client().clone(),
//!     config.timeout,
//!     &config.user_agent,
//! )?;
//! let workspace = GoogleWorkspace::new(client);
//! ```

mod auth;
mod callback;
mod client;
mod config;
mod oauth;
mod tokens;
mod workspace;

pub use auth::{AuthOutcome, Authenticator};
pub use callback::{CallbackParams, CallbackServer};
pub use client::AuthorizedClient;
pub use config::{
    DIRECTORY_GROUP_READONLY_SCOPE, GOOGLE_AUTH_URL, GOOGLE_TOKEN_URL, GROUPS_SETTINGS_SCOPE,
    GoogleConfig, OAuthCredentials,
};
pub use oauth::{AuthorizeOptions, OAuthClient, PkceFlow};
pub use tokens::{Token, TokenStore};
pub use workspace::GoogleWorkspace;
