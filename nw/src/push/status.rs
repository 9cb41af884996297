//! Push channel status

use serde::{Deserialize, Serialize};

/// Connection status of the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelStatus {
    /// Opening a connection
    Connecting,
    /// Connection open; heartbeat running
    Connected,
    /// No connection (initial state, closed, or intentionally disconnected)
    #[default]
    Disconnected,
    /// The last connection attempt or session failed
    Errored,
}

impl ChannelStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, ChannelStatus::Connected)
    }
}

impl std::fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Errored => write!(f, "errored"),
        }
    }
}
