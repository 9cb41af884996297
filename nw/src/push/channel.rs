//! PushChannel - one WebSocket connection with heartbeat and reconnect
//!
//! The channel owns a driver task that runs the connect → heartbeat →
//! disconnect/reconnect loop. The owner only calls `connect()` and
//! `disconnect()` and reads events from the channel it passed in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval, interval_at};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::backoff::{ReconnectPolicy, ReconnectState};
use super::messages::{PushEvent, PushMessage};
use super::{ChannelStatus, PushError};
use crate::config::PushConfig;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Connection settings for a push channel
#[derive(Debug, Clone)]
pub struct PushSettings {
    pub url: String,
    pub heartbeat: Duration,
    pub policy: ReconnectPolicy,
}

impl PushSettings {
    pub fn from_config(config: &PushConfig) -> Self {
        Self {
            url: config.url.clone(),
            heartbeat: config.heartbeat_interval(),
            policy: ReconnectPolicy::from_config(config),
        }
    }
}

/// Mutable channel state, guarded so that `disconnect()` and the driver never interleave
struct Inner {
    status: ChannelStatus,
    reconnect: ReconnectState,
    intentionally_closed: bool,
}

/// State shared between the channel handle and its driver task
struct Shared {
    inner: Mutex<Inner>,
    events: mpsc::UnboundedSender<PushEvent>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status_locked(&self, inner: &mut Inner, status: ChannelStatus) {
        if inner.status == status {
            return;
        }
        debug!(from = %inner.status, to = %status, "Shared::set_status: transition");
        inner.status = status;
        let _ = self.events.send(PushEvent::Status(status));
    }

    /// Report a status from the driver; ignored once intentionally closed
    fn report_status(&self, status: ChannelStatus) -> bool {
        let mut inner = self.lock();
        if inner.intentionally_closed {
            return false;
        }
        self.set_status_locked(&mut inner, status);
        true
    }

    fn report_connected(&self) -> bool {
        let mut inner = self.lock();
        if inner.intentionally_closed {
            return false;
        }
        inner.reconnect.reset();
        self.set_status_locked(&mut inner, ChannelStatus::Connected);
        true
    }

    fn report_message(&self, message: PushMessage) {
        let inner = self.lock();
        if inner.intentionally_closed {
            return;
        }
        let _ = self.events.send(PushEvent::Message(message));
    }

    /// Count a reconnect attempt; `None` when reconnecting is suppressed
    fn schedule_reconnect(&self, policy: &ReconnectPolicy) -> Option<(u32, Duration)> {
        let mut inner = self.lock();
        if inner.intentionally_closed {
            return None;
        }
        let delay = inner.reconnect.advance(policy);
        Some((inner.reconnect.attempts, delay))
    }

    fn is_closed(&self) -> bool {
        self.lock().intentionally_closed
    }
}

/// How a connected session ended
enum SessionEnd {
    Closed,
    Failed(PushError),
}

/// A push channel with automatic reconnect
///
/// Events (status changes and parsed messages) are sent on the channel given
/// to [`PushChannel::new`]. The channel never acknowledges notifications.
pub struct PushChannel {
    settings: PushSettings,
    shared: Arc<Shared>,
    driver: Option<JoinHandle<()>>,
}

impl PushChannel {
    pub fn new(settings: PushSettings, events: mpsc::UnboundedSender<PushEvent>) -> Self {
        debug!(url = %settings.url, "PushChannel::new: called");
        Self {
            settings,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    status: ChannelStatus::Disconnected,
                    reconnect: ReconnectState::default(),
                    intentionally_closed: false,
                }),
                events,
            }),
            driver: None,
        }
    }

    /// Open the connection, replacing any live one
    ///
    /// Must be called from within a tokio runtime.
    pub fn connect(&mut self) {
        debug!(url = %self.settings.url, "PushChannel::connect: called");
        if let Some(driver) = self.driver.take() {
            debug!("PushChannel::connect: closing previous connection");
            driver.abort();
        }

        {
            let mut inner = self.shared.lock();
            inner.intentionally_closed = false;
            self.shared.set_status_locked(&mut inner, ChannelStatus::Connecting);
        }

        info!(url = %self.settings.url, "Connecting push channel");
        let settings = self.settings.clone();
        let shared = Arc::clone(&self.shared);
        self.driver = Some(tokio::spawn(drive(settings, shared)));
    }

    /// Close the connection and suppress every pending or future reconnect
    pub fn disconnect(&mut self) {
        debug!("PushChannel::disconnect: called");
        let mut inner = self.shared.lock();
        inner.intentionally_closed = true;
        if let Some(driver) = self.driver.take() {
            // Aborting drops the socket without a close handshake and cancels
            // the heartbeat and any reconnect timer along with it.
            driver.abort();
            info!("Push channel disconnected");
        }
        self.shared.set_status_locked(&mut inner, ChannelStatus::Disconnected);
    }

    pub fn status(&self) -> ChannelStatus {
        self.shared.lock().status
    }

    pub fn is_connected(&self) -> bool {
        self.status().is_connected()
    }

    /// Snapshot of the reconnect bookkeeping
    pub fn reconnect_state(&self) -> ReconnectState {
        self.shared.lock().reconnect
    }

}

impl Drop for PushChannel {
    fn drop(&mut self) {
        if let Some(driver) = self.driver.take() {
            driver.abort();
        }
    }
}

/// Driver loop: connect, run the session, then wait out the backoff and retry
async fn drive(settings: PushSettings, shared: Arc<Shared>) {
    loop {
        let end = match connect_async(settings.url.as_str()).await {
            Ok((ws, _response)) => {
                if !shared.report_connected() {
                    return;
                }
                info!(url = %settings.url, "Push channel connected");
                run_session(ws, settings.heartbeat, &shared).await
            }
            Err(e) => SessionEnd::Failed(PushError::Connect(e)),
        };

        match end {
            SessionEnd::Closed => {
                shared.report_status(ChannelStatus::Disconnected);
                if !shared.is_closed() {
                    warn!("Push channel closed, preparing to reconnect");
                }
            }
            SessionEnd::Failed(e) => {
                warn!(error = %e, "Push channel error");
                shared.report_status(ChannelStatus::Errored);
            }
        }

        let Some((attempt, delay)) = shared.schedule_reconnect(&settings.policy) else {
            debug!("drive: intentionally closed, not reconnecting");
            return;
        };
        info!(attempt, delay_ms = delay.as_millis(), "Reconnecting push channel");
        tokio::time::sleep(delay).await;

        // The flag may have been set while the timer was pending
        if !shared.report_status(ChannelStatus::Connecting) {
            debug!("drive: reconnect suppressed after timer fired");
            return;
        }
    }
}

/// Pump one open connection until it closes or fails
async fn run_session(ws: WsStream, heartbeat: Duration, shared: &Shared) -> SessionEnd {
    let (mut write, mut read) = ws.split();
    // A zero period disables the heartbeat
    let mut ticker = (!heartbeat.is_zero()).then(|| interval_at(Instant::now() + heartbeat, heartbeat));

    loop {
        tokio::select! {
            frame = read.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_text(text.as_str(), shared),
                Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                    Ok(text) => handle_text(text, shared),
                    Err(e) => warn!(error = %e, "run_session: dropping non-UTF-8 binary frame"),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!(?frame, "run_session: close frame received");
                    return SessionEnd::Closed;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Failed(PushError::Transport(e)),
                None => return SessionEnd::Closed,
            },
            _ = next_heartbeat(&mut ticker) => {
                let ping = match PushMessage::Ping.to_json() {
                    Ok(ping) => ping,
                    Err(e) => {
                        warn!(error = %e, "run_session: failed to encode heartbeat");
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::text(ping)).await {
                    return SessionEnd::Failed(PushError::Transport(e));
                }
                debug!("run_session: sent heartbeat ping");
            }
        }
    }
}

async fn next_heartbeat(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => std::future::pending().await,
    }
}

fn handle_text(text: &str, shared: &Shared) {
    match PushMessage::parse(text) {
        Ok(PushMessage::Pong) => debug!("handle_text: pong received"),
        Ok(PushMessage::Unknown) => debug!(%text, "handle_text: ignoring unknown message type"),
        Ok(message) => shared.report_message(message),
        Err(e) => warn!(error = %e, "Failed to parse push message"),
    }
}
