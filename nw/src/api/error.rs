//! Transport error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur talking to the notifications API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },

    #[error("API rejected request: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// Map a reqwest failure, keeping timeouts distinct from other transport errors
    pub fn from_transport(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(timeout)
        } else {
            ApiError::Network(err)
        }
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Timeout(_))
    }

    /// Check if retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout(_) => true,
            ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status >= 500 || *status == 408 || *status == 429,
            ApiError::Rejected(_) => true,
            ApiError::InvalidResponse(_) => false,
        }
    }

    /// HTTP status code, when the server answered with one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
