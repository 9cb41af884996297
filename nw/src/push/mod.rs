//! Push channel
//!
//! A persistent WebSocket connection to the notification service. The
//! channel keeps itself alive with a periodic ping and reconnects with a
//! linear-capped backoff until it is intentionally disconnected. It reports
//! status transitions and parsed messages to its owner and never talks to
//! the HTTP API itself.

mod backoff;
mod channel;
mod error;
mod messages;
mod status;

pub use backoff::{ReconnectPolicy, ReconnectState};
pub use channel::{PushChannel, PushSettings};
pub use error::PushError;
pub use messages::{PushEvent, PushMessage};
pub use status::ChannelStatus;
