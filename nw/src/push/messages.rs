//! Push channel wire messages

use serde::{Deserialize, Serialize};

use super::PushError;
use crate::domain::Notification;

/// JSON frames exchanged over the push channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushMessage {
    /// Server-initiated delivery of one notification
    NewNotification { data: Notification },

    /// Heartbeat reply
    Pong,

    /// Outbound heartbeat
    Ping,

    /// Any type this client does not understand
    #[serde(other)]
    Unknown,
}

impl PushMessage {
    /// Parse one inbound text frame
    pub fn parse(text: &str) -> Result<Self, PushError> {
        serde_json::from_str(text).map_err(PushError::Parse)
    }

    /// Encode for sending
    pub fn to_json(&self) -> Result<String, PushError> {
        serde_json::to_string(self).map_err(PushError::Parse)
    }
}

/// Events a push channel reports to its owner
#[derive(Debug, Clone, PartialEq)]
pub enum PushEvent {
    /// The channel changed status
    Status(super::ChannelStatus),

    /// A parsed message other than a heartbeat reply
    Message(PushMessage),
}
