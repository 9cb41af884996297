//! notifywatch - desktop notification delivery client
//!
//! Pulls pending notifications from a backend and shows them as popups.
//! A WebSocket push channel is the primary path; a timed poller takes over
//! whenever push is disabled or down. Every notification shown is
//! acknowledged back to the backend exactly once per process.
//!
//! # Modules
//!
//! - [`api`] - HTTP transport client for the notifications API
//! - [`push`] - WebSocket push channel with heartbeat and reconnect
//! - [`poller`] - fixed-period fallback poller
//! - [`delivery`] - coordinator choosing the authoritative channel
//! - [`popup`] - bounded on-screen popup stack
//! - [`events`] - broadcast bus of monitoring activity
//! - [`config`] - configuration types and loading
//! - [`cli`] - command-line interface

pub mod api;
pub mod cli;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod events;
pub mod poller;
pub mod popup;
pub mod push;

// Re-export commonly used types
pub use api::{ApiError, HttpApiClient, NotificationApi, create_client};
pub use config::Config;
pub use delivery::{
    Channel, DeliveryConfig, DeliveryCoordinator, DeliveryHandle, DeliveryMetrics, MonitoringState,
    NotificationDisplay,
};
pub use domain::{Notification, NotificationStatus};
pub use events::{EventBus, EventEmitter, MonitorEvent, create_event_bus};
pub use poller::TimedPoller;
pub use popup::{NotificationWindowQueue, PopupPresenter, TerminalHost, WindowHost};
pub use push::{ChannelStatus, PushChannel, PushError, PushEvent, PushMessage, PushSettings};
