//! Push channel error types

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Errors that can occur on the push channel
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Connection failed: {0}")]
    Connect(#[source] tungstenite::Error),

    #[error("Transport error: {0}")]
    Transport(#[from] tungstenite::Error),

    #[error("Malformed message: {0}")]
    Parse(#[source] serde_json::Error),
}

impl PushError {
    /// Connection-level errors drive reconnects; parse errors do not
    pub fn is_connection_level(&self) -> bool {
        !matches!(self, PushError::Parse(_))
    }
}
