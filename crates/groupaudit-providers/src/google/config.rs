//! Google Workspace client configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

/// Read-only access to the directory's groups.
pub const DIRECTORY_GROUP_READONLY_SCOPE: &str =
    "https://www.googleapis.com/auth/admin.directory.group.readonly";

/// Access to the Groups Settings API.
pub const GROUPS_SETTINGS_SCOPE: &str = "https://www.googleapis.com/auth/apps.groups.settings";

/// Google OAuth authorization endpoint.
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google OAuth token endpoint.
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// OAuth 2.0 client credentials loaded from the key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// The OAuth 2.0 client ID from Google Cloud Console.
    pub client_id: String,
    /// The OAuth 2.0 client secret from Google Cloud Console.
    pub client_secret: String,
    /// Authorization endpoint.
    pub auth_uri: String,
    /// Token endpoint.
    pub token_uri: String,
    /// Redirect URIs registered for the client, in file order.
    pub redirect_uris: Vec<String>,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Supports the Cloud Console format with an `installed` or `web` section,
/// and a flat format with `client_id` / `client_secret` at the root.
#[derive(Debug, Deserialize)]
struct CredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
    client_id: Option<String>,
    client_secret: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
    auth_uri: Option<String>,
    token_uri: Option<String>,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl OAuthCredentials {
    /// Creates credentials with Google's default endpoints and no
    /// registered redirect URIs.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_uri: GOOGLE_AUTH_URL.to_string(),
            token_uri: GOOGLE_TOKEN_URL.to_string(),
            redirect_uris: Vec::new(),
        }
    }

    /// Loads credentials from a Google Cloud Console JSON key file.
    pub fn from_file(path: impl AsRef<Path>) -> ApiResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ApiError::configuration(format!(
                "unable to read client secret file {}: {}",
                path.display(),
                e
            ))
            .with_source(e)
        })?;
        Self::from_json(&content)
    }

    /// Parses credentials from the key file's JSON contents.
    pub fn from_json(json: &str) -> ApiResult<Self> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| {
            ApiError::configuration(format!("unable to parse client secret file: {}", e))
        })?;

        let creds = if let Some(nested) = file.installed.or(file.web) {
            let mut creds = Self::new(nested.client_id, nested.client_secret);
            if let Some(auth_uri) = nested.auth_uri {
                creds.auth_uri = auth_uri;
            }
            if let Some(token_uri) = nested.token_uri {
                creds.token_uri = token_uri;
            }
            creds.redirect_uris = nested.redirect_uris;
            creds
        } else if let (Some(id), Some(secret)) = (file.client_id, file.client_secret) {
            Self::new(id, secret)
        } else {
            return Err(ApiError::configuration(
                "client secret file must contain an 'installed' or 'web' section, \
                 or 'client_id' and 'client_secret' at the root",
            ));
        };

        creds.validate()?;
        Ok(creds)
    }

    /// Checks that the id and secret are present.
    pub fn validate(&self) -> ApiResult<()> {
        if self.client_id.is_empty() {
            return Err(ApiError::configuration("client_id is required"));
        }
        if self.client_secret.is_empty() {
            return Err(ApiError::configuration("client_secret is required"));
        }
        Ok(())
    }
}

/// Configuration for authenticating and talking to the Workspace APIs.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client credentials.
    pub credentials: OAuthCredentials,

    /// OAuth scopes to request.
    pub scopes: Vec<String>,

    /// Where the cached token is read from and written to.
    pub token_path: PathBuf,

    /// Address the one-shot callback listener binds to.
    pub listen_addr: String,

    /// Redirect URI sent in the authorization request.
    ///
    /// Defaults to the key file's first registered redirect URI, or
    /// `http://localhost:8080` when the key file has none.
    pub redirect_uri: String,

    /// How long to wait for the browser callback.
    pub callback_timeout: Duration,

    /// HTTP request timeout.
    pub timeout: Duration,

    /// Whether to also open the authorization URL in the system browser.
    pub open_browser: bool,

    /// User agent for API requests.
    pub user_agent: String,
}

impl GoogleConfig {
    /// Default token cache file.
    pub const DEFAULT_TOKEN_PATH: &'static str = "token.json";

    /// Default callback listener address.
    pub const DEFAULT_LISTEN_ADDR: &'static str = "localhost:8080";

    /// Default redirect URI when the key file registers none.
    pub const DEFAULT_REDIRECT_URI: &'static str = "http://localhost:8080";

    /// Default callback wait, in seconds.
    pub const DEFAULT_CALLBACK_TIMEOUT_SECS: u64 = 300;

    /// Default HTTP timeout, in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a configuration with the audit scopes and default paths.
    pub fn new(credentials: OAuthCredentials) -> Self {
        let redirect_uri = credentials
            .redirect_uris
            .first()
            .cloned()
            .unwrap_or_else(|| Self::DEFAULT_REDIRECT_URI.to_string());

        Self {
            credentials,
            scopes: vec![
                DIRECTORY_GROUP_READONLY_SCOPE.to_string(),
                GROUPS_SETTINGS_SCOPE.to_string(),
            ],
            token_path: PathBuf::from(Self::DEFAULT_TOKEN_PATH),
            listen_addr: Self::DEFAULT_LISTEN_ADDR.to_string(),
            redirect_uri,
            callback_timeout: Duration::from_secs(Self::DEFAULT_CALLBACK_TIMEOUT_SECS),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            open_browser: false,
            user_agent: format!("groupaudit/{}", env!("CARGO_PKG_VERSION")),
        }
    }

    /// Sets the token cache path.
    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }

    /// Sets the callback listener address.
    pub fn with_listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.listen_addr = addr.into();
        self
    }

    /// Sets the callback wait timeout.
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Sets the HTTP request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets whether the browser is opened automatically.
    pub fn with_open_browser(mut self, open: bool) -> Self {
        self.open_browser = open;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ApiResult<()> {
        self.credentials.validate()?;

        if self.scopes.is_empty() {
            return Err(ApiError::configuration(
                "at least one OAuth scope is required",
            ));
        }

        url::Url::parse(&self.redirect_uri).map_err(|e| {
            ApiError::configuration(format!(
                "invalid redirect URI '{}': {}",
                self.redirect_uri, e
            ))
        })?;

        if self.callback_timeout.is_zero() {
            return Err(ApiError::configuration("callback timeout must be positive"));
        }

        Ok(())
    }
}
