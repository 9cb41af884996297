//! Delivery Coordinator
//!
//! Decides which channel is authoritative and owns delivery bookkeeping:
//! - **Push** is primary while its WebSocket is connected
//! - **Poll** takes over whenever push is disabled, connecting, closed or errored
//! - Every notification, whichever channel it came from, is shown once and
//!   acknowledged once through a single deliver-then-acknowledge path

mod config;
mod core;
mod display;
mod handle;
mod ledger;
mod messages;
mod state;

pub use config::DeliveryConfig;
pub use core::DeliveryCoordinator;
pub use display::NotificationDisplay;
pub use handle::DeliveryHandle;
pub use ledger::{Admission, DeliveryLedger, DeliveryState};
pub use messages::{DeliveryMetrics, DeliveryRequest};
pub use state::{Channel, MonitoringState, PollerAction, poller_action};
