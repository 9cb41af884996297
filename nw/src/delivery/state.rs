//! Monitoring state published by the delivery coordinator

use serde::{Deserialize, Serialize};

use crate::push::ChannelStatus;

/// The channel a notification arrived on, or that is currently authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    Push,
    Poll,
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Push => write!(f, "push"),
            Self::Poll => write!(f, "poll"),
        }
    }
}

/// Snapshot of what the coordinator is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MonitoringState {
    /// Monitoring has been started and not stopped
    pub active: bool,

    /// The channel surfacing new notifications; `None` while inactive
    pub primary: Option<Channel>,

    /// Last status reported by the push channel
    pub push_status: ChannelStatus,
}

impl MonitoringState {
    /// Derive the state from the coordinator's flags
    pub fn derive(active: bool, poller_running: bool, push_status: ChannelStatus) -> Self {
        let primary = match (active, poller_running) {
            (false, _) => None,
            (true, true) => Some(Channel::Poll),
            (true, false) => Some(Channel::Push),
        };
        Self {
            active,
            primary,
            push_status,
        }
    }
}

/// What to do with the poller after a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerAction {
    Start,
    Stop,
    Keep,
}

/// Decide the poller's fate from the coordinator's flags
///
/// While active, the poller runs exactly when push is not connected. While
/// inactive it never runs.
pub fn poller_action(active: bool, push_connected: bool, poller_running: bool) -> PollerAction {
    let should_run = active && !push_connected;
    match (should_run, poller_running) {
        (true, false) => PollerAction::Start,
        (false, true) => PollerAction::Stop,
        _ => PollerAction::Keep,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_derive_primary() {
        assert_eq!(MonitoringState::derive(false, false, ChannelStatus::Connected).primary, None);
        assert_eq!(
            MonitoringState::derive(true, true, ChannelStatus::Errored).primary,
            Some(Channel::Poll)
        );
        assert_eq!(
            MonitoringState::derive(true, false, ChannelStatus::Connected).primary,
            Some(Channel::Push)
        );
    }

    #[test]
    fn test_state_serialization() {
        let state = MonitoringState::derive(true, true, ChannelStatus::Connecting);
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, r#"{"active":true,"primary":"poll","push_status":"connecting"}"#);
    }

    #[test]
    fn test_poller_action_table() {
        assert_eq!(poller_action(true, false, false), PollerAction::Start);
        assert_eq!(poller_action(true, true, true), PollerAction::Stop);
        assert_eq!(poller_action(false, false, true), PollerAction::Stop);
        assert_eq!(poller_action(true, false, true), PollerAction::Keep);
        assert_eq!(poller_action(false, true, false), PollerAction::Keep);
    }

    fn status_strategy() -> impl Strategy<Value = ChannelStatus> {
        prop_oneof![
            Just(ChannelStatus::Connecting),
            Just(ChannelStatus::Connected),
            Just(ChannelStatus::Disconnected),
            Just(ChannelStatus::Errored),
        ]
    }

    proptest! {
        #[test]
        fn prop_poller_runs_iff_active_and_not_connected(
            steps in proptest::collection::vec((any::<bool>(), status_strategy()), 1..64)
        ) {
            let mut running = false;
            let mut starts = 0usize;
            let mut stops = 0usize;
            for (active, status) in steps {
                match poller_action(active, status.is_connected(), running) {
                    PollerAction::Start => {
                        prop_assert!(!running);
                        running = true;
                        starts += 1;
                    }
                    PollerAction::Stop => {
                        prop_assert!(running);
                        running = false;
                        stops += 1;
                    }
                    PollerAction::Keep => {}
                }
                prop_assert_eq!(running, active && !status.is_connected());
            }
            // Never more than one active timer
            prop_assert!(starts - stops <= 1);
        }
    }
}
