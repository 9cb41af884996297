//! TimedPoller implementation

use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Runs a callback every `period` on its own task
///
/// The first tick fires one full period after `start`. A tick that fails is
/// logged and never cancels later ticks.
#[derive(Debug, Default)]
pub struct TimedPoller {
    task: Option<JoinHandle<()>>,
    period: Option<Duration>,
}

impl TimedPoller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking; a no-op when already running (the period is not reset)
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F, Fut>(&mut self, period: Duration, mut callback: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = eyre::Result<()>> + Send + 'static,
    {
        debug!(?period, "TimedPoller::start: called");
        if self.is_running() {
            debug!("TimedPoller::start: already running");
            return;
        }

        info!(period_secs = period.as_secs_f64(), "Poller started");
        self.period = Some(period);
        self.task = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = callback().await {
                    warn!(error = %e, "Poll tick failed");
                }
            }
        }));
    }

    /// Cancel the recurring timer; idempotent
    pub fn stop(&mut self) {
        debug!("TimedPoller::stop: called");
        if let Some(task) = self.task.take() {
            task.abort();
            info!("Poller stopped");
        }
        self.period = None;
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Period of the running poller
    pub fn period(&self) -> Option<Duration> {
        self.period.filter(|_| self.is_running())
    }
}

impl Drop for TimedPoller {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}
