//! DeliveryHandle - client interface to the coordinator task

use eyre::{Result, eyre};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::debug;

use super::messages::{DeliveryMetrics, DeliveryRequest};
use super::state::MonitoringState;

/// Cloneable handle to a running [`super::DeliveryCoordinator`]
#[derive(Clone)]
pub struct DeliveryHandle {
    tx: mpsc::Sender<DeliveryRequest>,
    state_rx: watch::Receiver<MonitoringState>,
}

impl DeliveryHandle {
    pub(crate) fn new(tx: mpsc::Sender<DeliveryRequest>, state_rx: watch::Receiver<MonitoringState>) -> Self {
        debug!("DeliveryHandle::new: called");
        Self { tx, state_rx }
    }

    /// Begin monitoring; a no-op when already active
    pub async fn start(&self) -> Result<MonitoringState> {
        debug!("DeliveryHandle::start: called");
        self.request(|reply_tx| DeliveryRequest::Start { reply_tx }).await
    }

    /// End monitoring; idempotent
    ///
    /// When this returns, the poller, heartbeat and reconnect timers are gone.
    pub async fn stop(&self) -> Result<MonitoringState> {
        debug!("DeliveryHandle::stop: called");
        self.request(|reply_tx| DeliveryRequest::Stop { reply_tx }).await
    }

    pub async fn state(&self) -> Result<MonitoringState> {
        debug!("DeliveryHandle::state: called");
        self.request(|reply_tx| DeliveryRequest::GetState { reply_tx }).await
    }

    pub async fn metrics(&self) -> Result<DeliveryMetrics> {
        debug!("DeliveryHandle::metrics: called");
        self.request(|reply_tx| DeliveryRequest::GetMetrics { reply_tx }).await
    }

    /// Watch state changes
    pub fn subscribe_state(&self) -> watch::Receiver<MonitoringState> {
        self.state_rx.clone()
    }

    /// Stop monitoring and end the coordinator task
    pub async fn shutdown(&self) -> Result<()> {
        debug!("DeliveryHandle::shutdown: called");
        self.tx
            .send(DeliveryRequest::Shutdown)
            .await
            .map_err(|_| eyre!("Delivery coordinator channel closed"))
    }

    async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> DeliveryRequest) -> Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| eyre!("Delivery coordinator channel closed"))?;
        reply_rx
            .await
            .map_err(|_| eyre!("Delivery coordinator shut down before reply"))
    }
}
