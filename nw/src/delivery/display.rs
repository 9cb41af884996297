//! Display sink for delivered notifications

use async_trait::async_trait;
use eyre::Result;

use crate::domain::Notification;

/// Where the coordinator hands notifications to be shown
#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    /// Show one notification; an error means it was not shown
    async fn show(&self, notification: &Notification) -> Result<()>;
}
