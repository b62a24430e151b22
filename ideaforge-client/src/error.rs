//! Error types for the IdeaForge client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when using the IdeaForge client
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// API returned an error status code
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Failed to parse response
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// The call needs a session and none was configured
    #[error("No session: run `ideaforge session init` or set IDEAFORGE_SESSION")]
    MissingSession,
}

impl ClientError {
    /// Create an API error from status code and a response body.
    ///
    /// The orchestrator answers errors as `{"error": "..."}`; that message is
    /// extracted when present.
    pub fn api_error(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
            .unwrap_or(body);

        Self::ApiError { status, message }
    }

    /// Check if this error is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ApiError { status: 404, .. })
    }

    /// Check if the session was rejected
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::MissingSession | Self::ApiError { status: 401, .. })
    }

    /// Check if a limit was hit
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::ApiError { status: 429, .. })
    }

    /// Check if this error is a client error (4xx status)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 400 && *status < 500)
    }

    /// Check if this error is a server error (5xx status)
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_extracts_message() {
        let err = ClientError::api_error(429, r#"{"error":"Rate limit exceeded"}"#);
        assert!(err.is_rate_limited());
        assert_eq!(
            err.to_string(),
            "API error (status 429): Rate limit exceeded"
        );
    }

    #[test]
    fn test_api_error_keeps_plain_body() {
        let err = ClientError::api_error(502, "Bad Gateway");
        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "API error (status 502): Bad Gateway");
    }

    #[test]
    fn test_classification() {
        assert!(ClientError::api_error(404, "").is_not_found());
        assert!(ClientError::api_error(401, "").is_unauthorized());
        assert!(ClientError::MissingSession.is_unauthorized());
        assert!(ClientError::api_error(400, "").is_client_error());
    }
}
