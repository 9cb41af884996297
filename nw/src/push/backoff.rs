//! Reconnect backoff for the push channel
//!
//! Linear-capped: attempt `n` waits `min(n * base, max)`.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::PushConfig;

/// Reconnect delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl ReconnectPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    pub fn from_config(config: &PushConfig) -> Self {
        Self::new(config.reconnect_base(), config.reconnect_max())
    }

    /// Delay before reconnect attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base.saturating_mul(attempt).min(self.max)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(5), Duration::from_secs(30))
    }
}

/// Reconnect bookkeeping owned by the push channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconnectState {
    /// Attempts since the last successful connect
    pub attempts: u32,

    /// Delay chosen for the most recent attempt
    pub delay: Duration,
}

impl ReconnectState {
    /// Count one more attempt and return its delay
    pub fn advance(&mut self, policy: &ReconnectPolicy) -> Duration {
        self.attempts = self.attempts.saturating_add(1);
        self.delay = policy.delay_for(self.attempts);
        debug!(attempts = self.attempts, delay_ms = self.delay.as_millis(), "ReconnectState::advance");
        self.delay
    }

    /// Forget past attempts after a successful connect
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay = Duration::ZERO;
    }
}
