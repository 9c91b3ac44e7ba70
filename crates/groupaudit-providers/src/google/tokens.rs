//! Cached OAuth token and its on-disk store.
//!
//! The file format matches the `token.json` written by Go's
//! `golang.org/x/oauth2`, so caches produced by other Google tooling can be
//! reused as-is.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_DELTA_SECS: i64 = 10;

/// An OAuth access token with optional refresh token and expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    /// Bearer token for API requests.
    pub access_token: String,

    /// Usually `Bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Refresh token, present when offline access was granted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// When the access token expires. `None` means it does not expire.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl Token {
    /// Builds a token from a token-endpoint response.
    ///
    /// An `expires_in` too large to represent leaves the expiry unset.
    pub fn from_response(
        access_token: impl Into<String>,
        token_type: Option<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        let expiry = expires_in_secs.and_then(|secs| {
            let expiry =
                Duration::try_seconds(secs).and_then(|d| Utc::now().checked_add_signed(d));
            if expiry.is_none() {
                warn!("ignoring out-of-range expires_in of {} seconds", secs);
            }
            expiry
        });

        Self {
            access_token: access_token.into(),
            token_type: token_type.unwrap_or_else(default_token_type),
            refresh_token,
            expiry,
        }
    }

    /// Returns the expiry, ignoring the zero time (`0001-01-01T00:00:00Z`)
    /// that Go writes for tokens without one.
    fn effective_expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry.filter(|expiry| expiry.year() > 1)
    }

    /// Returns true if the access token has expired or is about to.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Returns true if the access token is expired at the given instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.effective_expiry() {
            Some(expiry) => expiry - Duration::seconds(EXPIRY_DELTA_SECS) < now,
            None => false,
        }
    }

    /// Returns true if the token can be used without reauthorization.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }

    /// Value for the `Authorization` header.
    pub fn authorization_header(&self) -> String {
        // Google rejects lowercase "bearer" on some endpoints.
        let kind = if self.token_type.eq_ignore_ascii_case("bearer") {
            "Bearer"
        } else {
            self.token_type.as_str()
        };
        format!("{} {}", kind, self.access_token)
    }
}

/// File-backed token cache.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: PathBuf,
}

impl TokenStore {
    /// Creates a store for the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the token file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the cached token.
    ///
    /// A missing, unreadable, or unparseable file all mean "no usable token"
    /// and yield `None`.
    pub fn load(&self) -> Option<Token> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!("no token loaded from {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str(&content) {
            Ok(token) => {
                debug!("loaded token from {}", self.path.display());
                Some(token)
            }
            Err(e) => {
                debug!("ignoring unparseable token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Loads the cached token only if it is still valid.
    pub fn load_valid(&self) -> Option<Token> {
        self.load().filter(Token::is_valid)
    }

    /// Overwrites the token file.
    ///
    /// Writes to a temporary file first and renames it into place. On Unix
    /// the file is made readable by the owner only.
    pub fn save(&self, token: &Token) -> ApiResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| {
                ApiError::configuration(format!(
                    "unable to create token directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = serde_json::to_string(token)
            .map_err(|e| ApiError::internal(format!("unable to serialize token: {}", e)))?;

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, content.as_bytes()).map_err(|e| {
            ApiError::configuration(format!(
                "unable to cache oauth token to {}: {}",
                temp_path.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let _ = fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600));
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            ApiError::configuration(format!(
                "unable to cache oauth token to {}: {}",
                self.path.display(),
                e
            ))
        })?;

        debug!("saved token to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn token_expiring_in(secs: i64) -> Token {
        Token {
            access_token: "ya29.access".to_string(),
            token_type: "Bearer".to_string(),
            refresh_token: Some("1//refresh".to_string()),
            expiry: Some(Utc::now() + Duration::seconds(secs)),
        }
    }

    #[test]
    fn future_expiry_is_valid() {
        assert!(token_expiring_in(3600).is_valid());
    }

    #[test]
    fn past_expiry_is_invalid() {
        let token = token_expiring_in(-3600);
        assert!(token.is_expired());
        assert!(!token.is_valid());
    }

    #[test]
    fn expiry_within_delta_counts_as_expired() {
        assert!(token_expiring_in(5).is_expired());
    }

    #[test]
    fn missing_or_zero_expiry_never_expires() {
        let mut token = token_expiring_in(0);
        token.expiry = None;
        assert!(token.is_valid());

        token.expiry = Some(Utc.with_ymd_and_hms(1, 1, 1, 0, 0, 0).unwrap());
        assert!(token.is_valid());
    }

    #[test]
    fn empty_access_token_is_invalid() {
        let mut token = token_expiring_in(3600);
        token.access_token.clear();
        assert!(!token.is_valid());
    }

    #[test]
    fn parses_go_oauth2_token_file() {
        let json = r#"{"access_token":"ya29.a0","token_type":"Bearer","refresh_token":"1//0g","expiry":"2031-04-05T10:20:30.123456789+02:00"}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "ya29.a0");
        assert_eq!(token.refresh_token.as_deref(), Some("1//0g"));
        assert_eq!(
            token.expiry.unwrap().timestamp(),
            Utc.with_ymd_and_hms(2031, 4, 5, 8, 20, 30).unwrap().timestamp()
        );
    }

    #[test]
    fn from_response_sets_expiry() {
        let token = Token::from_response("access", None, None, Some(3599));
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expiry.is_some());
        assert!(token.is_valid());
    }

    #[test]
    fn from_response_with_huge_expires_in_has_no_expiry() {
        for secs in [i64::MAX / 2, i64::MAX, i64::MIN] {
            let token = Token::from_response("access", None, None, Some(secs));
            assert_eq!(token.expiry, None, "{}", secs);
        }
    }

    #[test]
    fn authorization_header_normalizes_bearer() {
        let mut token = token_expiring_in(3600);
        token.token_type = "bearer".to_string();
        assert_eq!(token.authorization_header(), "Bearer ya29.access");
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        let token = token_expiring_in(3600);

        store.save(&token).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded, token);
    }

    #[test]
    fn save_overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));

        store.save(&token_expiring_in(-60)).unwrap();
        let fresh = token_expiring_in(3600);
        store.save(&fresh).unwrap();

        assert_eq!(store.load_valid(), Some(fresh));
        assert!(!dir.path().join("token.json.tmp").exists());
    }

    #[test]
    fn missing_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("absent.json"));
        assert!(store.load().is_none());
    }

    #[test]
    fn garbage_file_loads_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(TokenStore::new(path).load().is_none());
    }

    #[test]
    fn expired_file_is_not_valid() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&token_expiring_in(-3600)).unwrap();

        assert!(store.load().is_some());
        assert!(store.load_valid().is_none());
    }

    #[test]
    fn save_into_missing_directory_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("nested").join("token.json"));
        store.save(&token_expiring_in(3600)).unwrap();
        assert!(store.load().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn saved_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::new(dir.path().join("token.json"));
        store.save(&token_expiring_in(3600)).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
