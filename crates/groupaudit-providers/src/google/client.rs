//! Authorized HTTP transport for Google REST APIs.
//!
//! Wraps a `reqwest::Client` and the current token. An expired access token
//! is refreshed in memory before the next request when a refresh token is
//! available; the refreshed token is not written back to disk.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ApiError, ApiResult};

use super::oauth::OAuthClient;
use super::tokens::Token;

/// Sends authenticated GET requests and decodes JSON responses.
#[derive(Debug)]
pub struct AuthorizedClient {
    http_client: reqwest::Client,
    oauth: OAuthClient,
    token: Mutex<Token>,
}

impl AuthorizedClient {
    /// Creates a client using `token` for requests and `oauth` for refreshes.
    pub fn new(
        token: Token,
        oauth: OAuthClient,
        timeout: Duration,
        user_agent: &str,
    ) -> ApiResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ApiError::internal(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            oauth,
            token: Mutex::new(token),
        })
    }

    /// Returns the `Authorization` header value, refreshing first if needed.
    async fn authorization(&self) -> ApiResult<String> {
        let mut token = self.token.lock().await;

        if token.is_expired() {
            let refresh_token = token.refresh_token.clone().ok_or_else(|| {
                ApiError::authentication(
                    "access token expired and no refresh token is available",
                )
            })?;
            debug!("refreshing expired access token");
            *token = self.oauth.refresh_token(&refresh_token).await?;
            info!("access token refreshed for this run");
        }

        Ok(token.authorization_header())
    }

    /// Issues a GET request and decodes the JSON body.
    pub async fn get_json<T>(&self, url: &str, query: &[(&str, &str)]) -> ApiResult<T>
    where
        T: DeserializeOwned,
    {
        let authorization = self.authorization().await?;

        debug!("GET {}", url);
        let response = self
            .http_client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, authorization)
            .query(query)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::network("request timeout")
                } else if e.is_connect() {
                    ApiError::network(format!("connection failed: {}", e))
                } else {
                    ApiError::network(format!("request failed: {}", e))
                }
            })?;

        let status = response.status();
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::network(format!("failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(status_error(status, &body, retry_after));
        }

        serde_json::from_str(&body).map_err(|e| {
            ApiError::invalid_response(format!("failed to parse response: {}", e))
        })
    }
}

/// Google's JSON error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

fn error_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => envelope.error.message,
        _ => body.trim().to_string(),
    }
}

fn status_error(status: reqwest::StatusCode, body: &str, retry_after: Option<u64>) -> ApiError {
    let message = format!("API error ({}): {}", status, error_message(body));

    match status {
        reqwest::StatusCode::UNAUTHORIZED => ApiError::authentication(message),
        reqwest::StatusCode::FORBIDDEN => ApiError::authorization(message),
        reqwest::StatusCode::NOT_FOUND => ApiError::not_found(message),
        reqwest::StatusCode::TOO_MANY_REQUESTS => ApiError::rate_limited(format!(
            "{}{}",
            message,
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        )),
        _ => ApiError::server(message),
    }
}
