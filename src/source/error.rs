//! Error types for snapshot sources.

use thiserror::Error;

/// Errors that can occur when fetching a snapshot from the broker.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The management API rejected the credentials.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Connection, timeout or non-success HTTP status.
    #[error("Network error: {0}")]
    Network(String),

    /// The response was not the JSON shape we expected.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Network("request timed out".to_string())
        } else if err.is_decode() {
            FetchError::MalformedResponse(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::MalformedResponse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_malformed() {
        let err = serde_json::from_str::<u64>("\"nope\"").unwrap_err();
        assert!(matches!(FetchError::from(err), FetchError::MalformedResponse(_)));
    }

    #[test]
    fn test_display() {
        let err = FetchError::Authentication("401 Unauthorized".to_string());
        assert_eq!(err.to_string(), "Authentication failed: 401 Unauthorized");
    }
}
