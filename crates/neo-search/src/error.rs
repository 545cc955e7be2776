//! Document index error types.

use thiserror::Error;

/// Result type for index operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur talking to the document index.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Index unhealthy: {0}")]
    Unhealthy(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SearchError {
    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            404 => Self::NotFound(msg),
            429 => Self::RateLimited(msg),
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// HTTP status represented by this error, if any.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SearchError::NotFound(_) => Some(404),
            SearchError::RateLimited(_) => Some(429),
            SearchError::ServerError(code, _) => Some(*code),
            SearchError::RequestFailed(_) => Some(400),
            _ => None,
        }
    }

    /// Check if error is transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SearchError::Network(_) | SearchError::RateLimited(_) | SearchError::ServerError(..)
        )
    }
}
