//! Delivery coordinator configuration

use std::time::Duration;

use tracing::debug;

use crate::config::Config;
use crate::push::PushSettings;

/// Settings the coordinator needs from the application config
#[derive(Debug, Clone)]
pub struct DeliveryConfig {
    /// Period of the fallback poller
    pub poll_interval: Duration,

    /// Whether a push channel is opened at all
    pub push_enabled: bool,

    /// Push channel connection settings
    pub push: PushSettings,

    /// Buffer size of the coordinator's request channel
    pub channel_buffer: usize,
}

impl DeliveryConfig {
    pub fn from_config(config: &Config) -> Self {
        debug!("DeliveryConfig::from_config: called");
        Self {
            poll_interval: config.polling.interval(),
            push_enabled: config.push.enabled,
            push: PushSettings::from_config(&config.push),
            channel_buffer: default_channel_buffer(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config() {
        let config = DeliveryConfig::default();
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert!(!config.push_enabled);
        assert_eq!(config.push.heartbeat, Duration::from_secs(30));
        assert_eq!(config.channel_buffer, 256);
    }
}
