//! PopupPresenter - the coordinator's display sink

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::host::WindowHost;
use super::queue::{NotificationWindowQueue, Slot};
use crate::config::PopupConfig;
use crate::delivery::NotificationDisplay;
use crate::domain::Notification;
use crate::events::{EventBus, EventEmitter};

/// Shows notifications in a [`NotificationWindowQueue`] and dismisses each
/// popup after a fixed duration
pub struct PopupPresenter<H: WindowHost + 'static> {
    queue: Arc<Mutex<NotificationWindowQueue<H>>>,
    duration: Duration,
    emitter: EventEmitter,
}

impl<H: WindowHost + 'static> PopupPresenter<H> {
    /// A zero `duration` keeps popups until dismissed or evicted
    pub fn new(queue: NotificationWindowQueue<H>, duration: Duration, events: &EventBus) -> Self {
        debug!(?duration, capacity = queue.capacity(), "PopupPresenter::new: called");
        Self {
            queue: Arc::new(Mutex::new(queue)),
            duration,
            emitter: events.emitter(),
        }
    }

    pub fn from_config(host: H, config: &PopupConfig, events: &EventBus) -> Self {
        Self::new(NotificationWindowQueue::from_config(host, config), config.duration(), events)
    }

    /// Close a popup before its timer fires
    pub async fn dismiss(&self, slot: u64) -> Option<Slot> {
        debug!(slot, "PopupPresenter::dismiss: called");
        dismiss_slot(&self.queue, &self.emitter, slot).await
    }

    /// Current slots, oldest first
    pub async fn slots(&self) -> Vec<Slot> {
        self.queue.lock().await.slots().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.queue.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.queue.lock().await.is_empty()
    }
}

async fn dismiss_slot<H: WindowHost>(
    queue: &Mutex<NotificationWindowQueue<H>>,
    emitter: &EventEmitter,
    slot: u64,
) -> Option<Slot> {
    let closed = queue.lock().await.dismiss(slot)?;
    emitter.popup_closed(closed.id, &closed.notification_id, false);
    Some(closed)
}

#[async_trait]
impl<H: WindowHost + 'static> NotificationDisplay for PopupPresenter<H> {
    async fn show(&self, notification: &Notification) -> Result<()> {
        debug!(id = %notification.id, "PopupPresenter::show: called");
        let shown = self.queue.lock().await.show(notification)?;

        if let Some(evicted) = &shown.evicted {
            info!(slot = evicted.id, id = %evicted.notification_id, "Popup evicted");
            self.emitter.popup_closed(evicted.id, &evicted.notification_id, true);
        }
        self.emitter.popup_shown(shown.slot, &notification.id);

        if !self.duration.is_zero() {
            let queue = Arc::clone(&self.queue);
            let emitter = self.emitter.clone();
            let duration = self.duration;
            let slot = shown.slot;
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                if dismiss_slot(&queue, &emitter, slot).await.is_some() {
                    debug!(slot, "Popup timed out");
                }
            });
        }
        Ok(())
    }
}
