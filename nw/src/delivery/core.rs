//! Main delivery coordinator task

use std::sync::Arc;

use eyre::eyre;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::config::DeliveryConfig;
use super::display::NotificationDisplay;
use super::handle::DeliveryHandle;
use super::ledger::{Admission, DeliveryLedger};
use super::messages::{DeliveryMetrics, DeliveryRequest};
use super::state::{Channel, MonitoringState, PollerAction, poller_action};
use crate::api::{ApiError, NotificationApi};
use crate::domain::Notification;
use crate::events::{EventBus, EventEmitter};
use crate::poller::TimedPoller;
use crate::push::{ChannelStatus, PushChannel, PushEvent, PushMessage};

/// The coordinator decides which channel is authoritative and owns all
/// delivery bookkeeping
///
/// It starts the poller whenever push is not connected, stops it when push
/// connects, and funnels notifications from both channels through one
/// deliver-then-acknowledge path guarded by a [`DeliveryLedger`].
pub struct DeliveryCoordinator {
    config: DeliveryConfig,
    api: Arc<dyn NotificationApi>,
    display: Arc<dyn NotificationDisplay>,
    emitter: EventEmitter,
    tx: mpsc::Sender<DeliveryRequest>,
    rx: mpsc::Receiver<DeliveryRequest>,
    state_tx: watch::Sender<MonitoringState>,

    active: bool,
    /// Incremented on every start; results tagged with an older run are dropped
    run_id: u64,
    /// Incremented whenever a push channel is opened or closed
    generation: u64,
    push: Option<PushChannel>,
    forwarder: Option<JoinHandle<()>>,
    push_status: ChannelStatus,
    poller: TimedPoller,
    fetch: Option<JoinHandle<()>>,
    ledger: DeliveryLedger,
    metrics: DeliveryMetrics,
}

impl DeliveryCoordinator {
    pub fn new(
        config: DeliveryConfig,
        api: Arc<dyn NotificationApi>,
        display: Arc<dyn NotificationDisplay>,
        events: &EventBus,
    ) -> Self {
        debug!(push_enabled = config.push_enabled, "DeliveryCoordinator::new: called");
        let (tx, rx) = mpsc::channel(config.channel_buffer);
        let (state_tx, _) = watch::channel(MonitoringState::default());
        Self {
            config,
            api,
            display,
            emitter: events.emitter(),
            tx,
            rx,
            state_tx,
            active: false,
            run_id: 0,
            generation: 0,
            push: None,
            forwarder: None,
            push_status: ChannelStatus::Disconnected,
            poller: TimedPoller::new(),
            fetch: None,
            ledger: DeliveryLedger::new(),
            metrics: DeliveryMetrics::default(),
        }
    }

    /// Raw request sender
    pub fn sender(&self) -> mpsc::Sender<DeliveryRequest> {
        self.tx.clone()
    }

    /// Create a handle for callers
    pub fn handle(&self) -> DeliveryHandle {
        DeliveryHandle::new(self.tx.clone(), self.state_tx.subscribe())
    }

    /// Run the coordinator task until shutdown is requested
    pub async fn run(mut self) {
        info!("Delivery coordinator started");

        while let Some(req) = self.rx.recv().await {
            match req {
                DeliveryRequest::Start { reply_tx } => {
                    self.start();
                    let _ = reply_tx.send(self.current_state());
                }

                DeliveryRequest::Stop { reply_tx } => {
                    self.stop();
                    let _ = reply_tx.send(self.current_state());
                }

                DeliveryRequest::GetState { reply_tx } => {
                    let _ = reply_tx.send(self.current_state());
                }

                DeliveryRequest::GetMetrics { reply_tx } => {
                    let _ = reply_tx.send(self.metrics.clone());
                }

                DeliveryRequest::Shutdown => {
                    info!("Delivery coordinator shutting down");
                    break;
                }

                DeliveryRequest::Push { generation, event } => {
                    self.handle_push(generation, event).await;
                }

                DeliveryRequest::PollTick { run_id } => {
                    if !self.active || run_id != self.run_id {
                        debug!(run_id, current = self.run_id, "Ignoring tick from a stopped run");
                    } else if !self.poller.is_running() {
                        // Queued before push connected and the poller was stopped
                        debug!(status = %self.push_status, "Ignoring tick while the poller is stopped");
                    } else {
                        self.begin_poll();
                    }
                }

                DeliveryRequest::PollCompleted { run_id, result } => {
                    self.handle_poll_completed(run_id, result).await;
                }

                DeliveryRequest::AckCompleted { id, result } => {
                    self.handle_ack(id, result);
                }
            }
        }

        self.stop();
        info!("Delivery coordinator stopped");
    }

    fn current_state(&self) -> MonitoringState {
        MonitoringState::derive(self.active, self.poller.is_running(), self.push_status)
    }

    fn publish_state(&self) {
        let state = self.current_state();
        let previous = self.state_tx.borrow().primary;
        if state.primary != previous
            && let Some(channel) = state.primary
        {
            info!(%channel, "Primary channel changed");
            self.emitter.primary_channel_changed(channel);
        }
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn start(&mut self) {
        debug!("DeliveryCoordinator::start: called");
        if self.active {
            debug!("DeliveryCoordinator::start: already active");
            return;
        }

        self.active = true;
        self.run_id += 1;
        info!(run_id = self.run_id, push_enabled = self.config.push_enabled, "Monitoring started");
        self.emitter.monitoring_started(self.config.push_enabled);

        if self.config.push_enabled {
            self.open_push();
        }

        // One immediate cycle regardless of push state
        self.begin_poll();

        if !self.push_status.is_connected() {
            self.start_poller();
        }
        self.publish_state();
    }

    fn stop(&mut self) {
        debug!("DeliveryCoordinator::stop: called");
        if !self.active {
            debug!("DeliveryCoordinator::stop: already inactive");
            return;
        }

        self.active = false;
        self.poller.stop();
        self.close_push();
        if let Some(fetch) = self.fetch.take() {
            fetch.abort();
        }

        info!(run_id = self.run_id, "Monitoring stopped");
        self.emitter.monitoring_stopped();
        self.publish_state();
    }

    fn open_push(&mut self) {
        debug!(url = %self.config.push.url, "DeliveryCoordinator::open_push: called");
        self.close_push();
        self.generation += 1;
        let generation = self.generation;

        let (events_tx, mut events_rx) = mpsc::unbounded_channel();
        let coord_tx = self.tx.clone();
        self.forwarder = Some(tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                if coord_tx.send(DeliveryRequest::Push { generation, event }).await.is_err() {
                    break;
                }
            }
        }));

        let mut channel = PushChannel::new(self.config.push.clone(), events_tx);
        channel.connect();
        self.push = Some(channel);
    }

    fn close_push(&mut self) {
        let Some(mut channel) = self.push.take() else {
            return;
        };
        debug!("DeliveryCoordinator::close_push: called");
        channel.disconnect();
        if let Some(forwarder) = self.forwarder.take() {
            forwarder.abort();
        }
        self.generation += 1;

        if self.push_status != ChannelStatus::Disconnected {
            self.push_status = ChannelStatus::Disconnected;
            self.emitter.channel_status(ChannelStatus::Disconnected);
        }
    }

    fn start_poller(&mut self) {
        let tx = self.tx.clone();
        let run_id = self.run_id;
        self.poller.start(self.config.poll_interval, move || {
            let tx = tx.clone();
            async move {
                tx.send(DeliveryRequest::PollTick { run_id })
                    .await
                    .map_err(|_| eyre!("Delivery coordinator channel closed"))
            }
        });
    }

    fn update_poller(&mut self) {
        match poller_action(self.active, self.push_status.is_connected(), self.poller.is_running()) {
            PollerAction::Start => {
                info!(status = %self.push_status, "Push unavailable, falling back to polling");
                self.start_poller();
            }
            PollerAction::Stop => {
                info!("Push connected, polling stopped");
                self.poller.stop();
            }
            PollerAction::Keep => {}
        }
    }

    async fn handle_push(&mut self, generation: u64, event: PushEvent) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "Ignoring event from a replaced push channel");
            return;
        }

        match event {
            PushEvent::Status(status) => {
                if status == self.push_status {
                    return;
                }
                debug!(from = %self.push_status, to = %status, "DeliveryCoordinator::handle_push: status");
                self.push_status = status;
                self.emitter.channel_status(status);
                self.update_poller();
                self.publish_state();
            }
            PushEvent::Message(PushMessage::NewNotification { data }) => {
                if !self.active {
                    return;
                }
                self.metrics.push_messages += 1;
                self.deliver(vec![data], Channel::Push).await;
            }
            PushEvent::Message(other) => {
                debug!(?other, "DeliveryCoordinator::handle_push: ignoring message");
            }
        }
    }

    /// Start one fetch unless one is still in flight
    fn begin_poll(&mut self) {
        if let Some(fetch) = &self.fetch {
            if !fetch.is_finished() {
                self.metrics.polls_skipped += 1;
                debug!("Skipping poll tick, previous fetch still in flight");
                return;
            }
            // Its result is still queued, or the task died without sending one
            debug!("DeliveryCoordinator::begin_poll: previous fetch task already finished");
        }

        self.metrics.polls += 1;
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        let run_id = self.run_id;
        self.fetch = Some(tokio::spawn(async move {
            let result = api.fetch_pending().await;
            let _ = tx.send(DeliveryRequest::PollCompleted { run_id, result }).await;
        }));
    }

    async fn handle_poll_completed(&mut self, run_id: u64, result: Result<Vec<Notification>, ApiError>) {
        if !self.active || run_id != self.run_id {
            debug!(run_id, current = self.run_id, "Discarding fetch result from a stopped run");
            return;
        }
        // A newer fetch may already be running if this one finished before its
        // result was handled
        if self.fetch.as_ref().is_some_and(JoinHandle::is_finished) {
            self.fetch = None;
        }

        match result {
            Ok(notifications) => {
                debug!(count = notifications.len(), "Fetched pending notifications");
                self.deliver(notifications, Channel::Poll).await;
            }
            Err(e) => {
                error!(
                    error = %e,
                    status = ?e.status(),
                    retryable = e.is_retryable(),
                    "Failed to fetch pending notifications"
                );
                self.metrics.fetch_failures += 1;
                self.emitter.fetch_failed(&e.to_string(), e.is_retryable());
            }
        }
    }

    /// Run each notification through the ledger, in order
    ///
    /// A poll batch is handled one item at a time: display, acknowledge, then
    /// report. Push deliveries are reported right after display and
    /// acknowledged in the background.
    async fn deliver(&mut self, notifications: Vec<Notification>, source: Channel) {
        for notification in notifications {
            match self.ledger.admit(&notification.id) {
                Admission::Display => {
                    if let Err(e) = self.display.show(&notification).await {
                        warn!(id = %notification.id, error = %e, "Failed to display notification");
                        self.metrics.display_failures += 1;
                        self.ledger.forget(&notification.id);
                        continue;
                    }
                    match source {
                        Channel::Poll => {
                            self.acknowledge(&notification.id).await;
                            self.report_delivered(&notification, source);
                        }
                        Channel::Push => {
                            self.report_delivered(&notification, source);
                            self.spawn_ack(notification.id);
                        }
                    }
                }
                Admission::RetryAck => {
                    debug!(id = %notification.id, "Retrying acknowledgment");
                    match source {
                        Channel::Poll => self.acknowledge(&notification.id).await,
                        Channel::Push => self.spawn_ack(notification.id),
                    }
                }
                Admission::Suppress(state) => {
                    debug!(id = %notification.id, ?state, %source, "Duplicate suppressed");
                    self.metrics.duplicates_suppressed += 1;
                    self.emitter.duplicate_suppressed(&notification.id, source);
                }
            }
        }
    }

    fn report_delivered(&mut self, notification: &Notification, source: Channel) {
        info!(id = %notification.id, %source, title = %notification.title, "Notification delivered");
        self.metrics.delivered += 1;
        self.emitter.delivered(notification, source);
    }

    async fn acknowledge(&mut self, id: &str) {
        let result = self.api.acknowledge(id).await;
        self.handle_ack(id.to_string(), result);
    }

    /// Acknowledge in the background; the result comes back as a request
    fn spawn_ack(&self, id: String) {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let result = api.acknowledge(&id).await;
            let _ = tx.send(DeliveryRequest::AckCompleted { id, result }).await;
        });
    }

    fn handle_ack(&mut self, id: String, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                debug!(%id, "Acknowledged");
                self.ledger.mark_acknowledged(&id);
                self.metrics.acks_ok += 1;
                self.emitter.acknowledged(&id);
            }
            Err(e) => {
                warn!(%id, error = %e, "Failed to acknowledge notification");
                self.ledger.mark_ack_failed(&id);
                self.metrics.acks_failed += 1;
                self.emitter.acknowledge_failed(&id, &e.to_string());
            }
        }
    }
}
