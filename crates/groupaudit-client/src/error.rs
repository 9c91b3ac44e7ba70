//! Client error types.

use groupaudit_core::TracingError;
use groupaudit_providers::ApiError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that end a run.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid or missing command-line configuration.
    #[error("{0}")]
    Config(String),

    /// Authentication or API failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Logging could not be set up.
    #[error("failed to initialize logging: {0}")]
    Tracing(#[from] TracingError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_display_unchanged() {
        let err: ClientError = ApiError::authorization("access denied").into();
        assert_eq!(err.to_string(), "authorization_failed: access denied");
    }

    #[test]
    fn config_error_is_bare_message() {
        let err = ClientError::Config("--customer_id is required".to_string());
        assert_eq!(err.to_string(), "--customer_id is required");
    }
}
