//! Delivery bookkeeping
//!
//! Tracks every notification id the coordinator has handled so that a
//! notification seen on both channels, or on consecutive polls, is shown
//! once and acknowledged once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Where a notification is in the deliver-then-acknowledge path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryState {
    /// Shown; acknowledgment not yet settled
    InFlight,
    /// Acknowledged to the backend
    Acknowledged,
    /// Shown, but the acknowledgment failed
    AckFailed,
}

/// Outcome of admitting a sighting of a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// First sighting: show it, then acknowledge
    Display,
    /// Shown before but never acknowledged: retry only the acknowledgment
    RetryAck,
    /// Already in flight or acknowledged: skip
    Suppress(DeliveryState),
}

/// Per-coordinator map from notification id to delivery state
#[derive(Debug, Default)]
pub struct DeliveryLedger {
    entries: HashMap<String, DeliveryState>,
}

impl DeliveryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a sighting and decide what to do with it
    pub fn admit(&mut self, id: &str) -> Admission {
        let admission = match self.entries.get(id).copied() {
            None => Admission::Display,
            Some(DeliveryState::AckFailed) => Admission::RetryAck,
            Some(state) => Admission::Suppress(state),
        };
        if matches!(admission, Admission::Display | Admission::RetryAck) {
            self.entries.insert(id.to_string(), DeliveryState::InFlight);
        }
        debug!(%id, ?admission, "DeliveryLedger::admit");
        admission
    }

    pub fn mark_acknowledged(&mut self, id: &str) {
        self.entries.insert(id.to_string(), DeliveryState::Acknowledged);
    }

    pub fn mark_ack_failed(&mut self, id: &str) {
        self.entries.insert(id.to_string(), DeliveryState::AckFailed);
    }

    /// Drop an id so its next sighting is treated as new
    pub fn forget(&mut self, id: &str) {
        self.entries.remove(id);
    }

    pub fn state(&self, id: &str) -> Option<DeliveryState> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
