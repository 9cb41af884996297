//! Event Bus - central pub/sub system for notifywatch events
//!
//! The EventBus uses tokio broadcast channels to deliver events to all subscribers
//! with minimal latency. Components emit events, consumers (CLI printer, tests) subscribe.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::MonitorEvent;
use crate::delivery::Channel;
use crate::domain::Notification;
use crate::push::ChannelStatus;

/// Default channel capacity (events)
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1_024;

/// Central event bus for notifywatch activity streaming
pub struct EventBus {
    tx: broadcast::Sender<MonitorEvent>,
    #[allow(dead_code)]
    channel_capacity: usize,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            channel_capacity: capacity,
        }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// This is fire-and-forget: if there are no subscribers, the event is dropped.
    /// If the channel is full, oldest events are dropped.
    pub fn emit(&self, event: MonitorEvent) {
        debug!(event_type = event.event_type(), "EventBus::emit");
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to receive events
    ///
    /// Returns a receiver that will receive all events emitted after subscription.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle for a component
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter { tx: self.tx.clone() }
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for components to emit events without owning the bus
///
/// EventEmitter is cheap to clone and provides convenience methods.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<MonitorEvent>,
}

impl EventEmitter {
    /// Emit a raw event
    pub fn emit(&self, event: MonitorEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    pub fn monitoring_started(&self, push_enabled: bool) {
        self.emit(MonitorEvent::MonitoringStarted { push_enabled });
    }

    pub fn monitoring_stopped(&self) {
        self.emit(MonitorEvent::MonitoringStopped);
    }

    pub fn primary_channel_changed(&self, channel: Channel) {
        self.emit(MonitorEvent::PrimaryChannelChanged { channel });
    }

    pub fn channel_status(&self, status: ChannelStatus) {
        self.emit(MonitorEvent::ChannelStatusChanged { status });
    }

    pub fn delivered(&self, notification: &Notification, source: Channel) {
        self.emit(MonitorEvent::NotificationDelivered {
            notification: notification.clone(),
            source,
        });
    }

    pub fn duplicate_suppressed(&self, id: &str, source: Channel) {
        self.emit(MonitorEvent::DuplicateSuppressed {
            id: id.to_string(),
            source,
        });
    }

    pub fn acknowledged(&self, id: &str) {
        self.emit(MonitorEvent::Acknowledged { id: id.to_string() });
    }

    pub fn acknowledge_failed(&self, id: &str, message: &str) {
        self.emit(MonitorEvent::AcknowledgeFailed {
            id: id.to_string(),
            message: message.to_string(),
        });
    }

    pub fn fetch_failed(&self, message: &str, retryable: bool) {
        self.emit(MonitorEvent::FetchFailed {
            message: message.to_string(),
            retryable,
        });
    }

    pub fn popup_shown(&self, slot: u64, notification_id: &str) {
        self.emit(MonitorEvent::PopupShown {
            slot,
            notification_id: notification_id.to_string(),
        });
    }

    pub fn popup_closed(&self, slot: u64, notification_id: &str, evicted: bool) {
        self.emit(MonitorEvent::PopupClosed {
            slot,
            notification_id: notification_id.to_string(),
            evicted,
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}
