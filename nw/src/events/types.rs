//! Event types for notifywatch activity streaming
//!
//! These events represent all observable activity:
//! - Monitoring lifecycle (start, stop, authoritative channel)
//! - Push channel status transitions
//! - Delivery (delivered, duplicate suppressed, acknowledgment failure)
//! - API failures
//! - Popup lifecycle (shown, closed)

use serde::{Deserialize, Serialize};

use crate::delivery::Channel;
use crate::domain::Notification;
use crate::push::ChannelStatus;

/// Core event enum - the vocabulary of notifywatch activity
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MonitorEvent {
    // === Monitoring Lifecycle ===
    /// Monitoring became active
    MonitoringStarted { push_enabled: bool },
    /// Monitoring became inactive
    MonitoringStopped,
    /// The channel responsible for surfacing new notifications changed
    PrimaryChannelChanged { channel: Channel },

    // === Push Channel ===
    /// The push channel reported a new status
    ChannelStatusChanged { status: ChannelStatus },

    // === Delivery ===
    /// A notification was shown to the user
    NotificationDelivered { notification: Notification, source: Channel },
    /// A notification already handled was seen again and skipped
    DuplicateSuppressed { id: String, source: Channel },
    /// A notification was acknowledged to the backend
    Acknowledged { id: String },
    /// Acknowledgment failed; the notification stays pending upstream
    AcknowledgeFailed { id: String, message: String },

    // === Errors ===
    /// A poll cycle could not fetch pending notifications
    ///
    /// `retryable` is false when the next cycle is likely to fail the same way.
    FetchFailed { message: String, retryable: bool },

    // === Popups ===
    /// A popup window was opened
    PopupShown { slot: u64, notification_id: String },
    /// A popup window was closed (dismissed, timed out or evicted)
    PopupClosed {
        slot: u64,
        notification_id: String,
        evicted: bool,
    },
}

impl MonitorEvent {
    /// Get the event type name (for logging/filtering)
    pub fn event_type(&self) -> &'static str {
        match self {
            MonitorEvent::MonitoringStarted { .. } => "MonitoringStarted",
            MonitorEvent::MonitoringStopped => "MonitoringStopped",
            MonitorEvent::PrimaryChannelChanged { .. } => "PrimaryChannelChanged",
            MonitorEvent::ChannelStatusChanged { .. } => "ChannelStatusChanged",
            MonitorEvent::NotificationDelivered { .. } => "NotificationDelivered",
            MonitorEvent::DuplicateSuppressed { .. } => "DuplicateSuppressed",
            MonitorEvent::Acknowledged { .. } => "Acknowledged",
            MonitorEvent::AcknowledgeFailed { .. } => "AcknowledgeFailed",
            MonitorEvent::FetchFailed { .. } => "FetchFailed",
            MonitorEvent::PopupShown { .. } => "PopupShown",
            MonitorEvent::PopupClosed { .. } => "PopupClosed",
        }
    }

    /// Whether this event reports a failure
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            MonitorEvent::AcknowledgeFailed { .. } | MonitorEvent::FetchFailed { .. }
        )
    }
}
