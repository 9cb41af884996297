//! Message types for the delivery coordinator

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::state::MonitoringState;
use crate::api::ApiError;
use crate::domain::Notification;
use crate::push::PushEvent;

/// Requests to the coordinator task
///
/// Callers use the first five through [`super::DeliveryHandle`]; the rest are
/// sent by the coordinator's own helper tasks.
#[derive(Debug)]
pub enum DeliveryRequest {
    /// Begin monitoring
    Start { reply_tx: oneshot::Sender<MonitoringState> },

    /// End monitoring; the reply is sent after every timer is cancelled
    Stop { reply_tx: oneshot::Sender<MonitoringState> },

    /// Read the current state
    GetState { reply_tx: oneshot::Sender<MonitoringState> },

    /// Read the counters
    GetMetrics { reply_tx: oneshot::Sender<DeliveryMetrics> },

    /// Stop monitoring and end the coordinator task
    Shutdown,

    /// An event from the push channel of the given generation
    Push { generation: u64, event: PushEvent },

    /// The poller's period elapsed during monitoring run `run_id`
    PollTick { run_id: u64 },

    /// A fetch started during run `run_id` finished
    PollCompleted {
        run_id: u64,
        result: Result<Vec<Notification>, ApiError>,
    },

    /// An acknowledgment finished
    AckCompleted { id: String, result: Result<(), ApiError> },
}

/// Counters for observability
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryMetrics {
    pub polls: u64,
    pub polls_skipped: u64,
    pub fetch_failures: u64,
    pub push_messages: u64,
    pub delivered: u64,
    pub display_failures: u64,
    pub duplicates_suppressed: u64,
    pub acks_ok: u64,
    pub acks_failed: u64,
}
