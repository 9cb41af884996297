//! Event Bus Architecture for Live Observability
//!
//! Every significant action in notifywatch emits an event. All consumers (the
//! `nw watch` printer, integration tests) subscribe to the bus.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       EVENT BUS                              │
//! │            (tokio::sync::broadcast channel)                  │
//! └─────────────────────────────────────────────────────────────┘
//!         ↑                       ↑                       ↑
//!  Delivery Coordinator      Push status            Popup presenter
//!  emits:                    (via coordinator)      emits:
//!  - MonitoringStarted       - ChannelStatusChanged - PopupShown
//!  - NotificationDelivered                          - PopupClosed
//!  - FetchFailed
//!         ↓                       ↓
//! ┌───────────────┐       ┌───────────────┐
//! │ CLI printer   │       │ Tests         │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use notifywatch::events::{create_event_bus, MonitorEvent};
//!
//! let bus = create_event_bus();
//! let mut rx = bus.subscribe();
//! bus.emitter().monitoring_started(false);
//! while let Ok(event) = rx.recv().await {
//!     println!("Event: {:?}", event);
//! }
//! ```

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::MonitorEvent;
