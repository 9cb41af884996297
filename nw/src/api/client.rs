//! NotificationApi trait and its HTTP implementation

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use super::types::{ApiEnvelope, StatusUpdate};
use super::ApiError;
use crate::config::ApiConfig;
use crate::domain::Notification;

/// Transport seam for the notifications backend
///
/// Each call is a single logical request with a bounded timeout. Nothing is
/// retried here; retry policy belongs to the caller (the next poll cycle).
#[async_trait]
pub trait NotificationApi: Send + Sync {
    /// Fetch every notification still pending for the configured scope
    async fn fetch_pending(&self) -> Result<Vec<Notification>, ApiError>;

    /// Mark one notification as delivered
    async fn acknowledge(&self, id: &str) -> Result<(), ApiError>;

    /// Check the backend is reachable; returns the round-trip time
    async fn probe(&self) -> Result<Duration, ApiError>;
}

/// reqwest-backed client for the notifications API
pub struct HttpApiClient {
    endpoint: String,
    project: Option<String>,
    http: Client,
    timeout: Duration,
    probe_timeout: Duration,
}

impl HttpApiClient {
    /// Create a new client from configuration
    pub fn from_config(config: &ApiConfig) -> Result<Self, ApiError> {
        debug!(?config, "HttpApiClient::from_config: called");
        let timeout = config.timeout();

        let http = Client::builder().timeout(timeout).build().map_err(ApiError::Network)?;

        Ok(Self {
            endpoint: config.endpoint(),
            project: config.project_filter().map(str::to_string),
            http,
            timeout,
            probe_timeout: config.probe_timeout(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Query parameters for the pending-notifications fetch
    fn pending_query(&self) -> Vec<(&'static str, String)> {
        let mut query = vec![("status", "0".to_string())];
        if let Some(project) = &self.project {
            query.push(("project", project.clone()));
        }
        query
    }

    /// Check status, decode the envelope and reject `success=false`
    async fn read_envelope<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        started: Instant,
    ) -> Result<ApiEnvelope<T>, ApiError> {
        let status = response.status();
        let elapsed_ms = started.elapsed().as_millis();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), elapsed_ms, "read_envelope: HTTP error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))?;
        let envelope: ApiEnvelope<T> =
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        debug!(
            elapsed_ms,
            count = envelope.count,
            success = envelope.success,
            "read_envelope: decoded"
        );

        if !envelope.success {
            warn!(message = %envelope.message, "read_envelope: API reported failure");
            return Err(ApiError::Rejected(envelope.message));
        }

        Ok(envelope)
    }
}

#[async_trait]
impl NotificationApi for HttpApiClient {
    async fn fetch_pending(&self) -> Result<Vec<Notification>, ApiError> {
        debug!(endpoint = %self.endpoint, project = ?self.project, "fetch_pending: called");
        let started = Instant::now();

        let response = self
            .http
            .get(&self.endpoint)
            .header("content-type", "application/json")
            .query(&self.pending_query())
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))?;

        let envelope: ApiEnvelope<Vec<Notification>> = self.read_envelope(response, started).await?;
        Ok(envelope.data.unwrap_or_default())
    }

    async fn acknowledge(&self, id: &str) -> Result<(), ApiError> {
        debug!(%id, "acknowledge: called");
        let url = format!("{}/{}/status", self.endpoint, id);
        let started = Instant::now();

        let response = self
            .http
            .patch(&url)
            .json(&StatusUpdate::delivered())
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.timeout))?;

        let _: ApiEnvelope<serde_json::Value> = self.read_envelope(response, started).await?;
        debug!(%id, "acknowledge: success");
        Ok(())
    }

    async fn probe(&self) -> Result<Duration, ApiError> {
        debug!(endpoint = %self.endpoint, "probe: called");
        let started = Instant::now();

        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("status", "0"), ("limit", "1")])
            .timeout(self.probe_timeout)
            .send()
            .await
            .map_err(|e| ApiError::from_transport(e, self.probe_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        let elapsed = started.elapsed();
        info!(elapsed_ms = elapsed.as_millis(), "API probe succeeded");
        Ok(elapsed)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tracing::debug;

    /// Ordered record of calls shared between test doubles
    pub type CallLog = Arc<Mutex<Vec<String>>>;

    /// In-memory backend for unit tests
    ///
    /// Behaves like the real backend: acknowledged ids drop out of later
    /// fetches, ids listed in `failing_acks` keep failing.
    #[derive(Default)]
    pub struct MockApi {
        pending: Mutex<Vec<Notification>>,
        acked: Mutex<Vec<String>>,
        failing_acks: Mutex<HashSet<String>>,
        fetch_count: AtomicUsize,
        fail_fetch: AtomicBool,
        fetch_delay: Mutex<Option<Duration>>,
        panic_fetch: AtomicBool,
        log: Mutex<Option<CallLog>>,
    }

    impl MockApi {
        pub fn new(pending: Vec<Notification>) -> Self {
            debug!(pending = pending.len(), "MockApi::new: called");
            Self {
                pending: Mutex::new(pending),
                ..Default::default()
            }
        }

        pub fn push_pending(&self, n: Notification) {
            self.pending.lock().unwrap().push(n);
        }

        pub fn fetch_count(&self) -> usize {
            self.fetch_count.load(Ordering::SeqCst)
        }

        pub fn acked(&self) -> Vec<String> {
            self.acked.lock().unwrap().clone()
        }

        pub fn set_fail_fetch(&self, fail: bool) {
            self.fail_fetch.store(fail, Ordering::SeqCst);
        }

        pub fn set_fetch_delay(&self, delay: Option<Duration>) {
            *self.fetch_delay.lock().unwrap() = delay;
        }

        pub fn fail_ack_for(&self, id: &str) {
            self.failing_acks.lock().unwrap().insert(id.to_string());
        }

        pub fn heal_ack_for(&self, id: &str) {
            self.failing_acks.lock().unwrap().remove(id);
        }

        /// Make fetches panic instead of returning
        pub fn set_panic_fetch(&self, panic: bool) {
            self.panic_fetch.store(panic, Ordering::SeqCst);
        }

        /// Record successful acknowledgments as `ack {id}`
        pub fn set_log(&self, log: CallLog) {
            *self.log.lock().unwrap() = Some(log);
        }
    }

    #[async_trait]
    impl NotificationApi for MockApi {
        async fn fetch_pending(&self) -> Result<Vec<Notification>, ApiError> {
            debug!("MockApi::fetch_pending: called");
            self.fetch_count.fetch_add(1, Ordering::SeqCst);
            if self.panic_fetch.load(Ordering::SeqCst) {
                panic!("fetch exploded");
            }
            // The response reflects the backend at request time
            let snapshot = self.pending.lock().unwrap().clone();
            let delay = *self.fetch_delay.lock().unwrap();
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_fetch.load(Ordering::SeqCst) {
                return Err(ApiError::Status {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(snapshot)
        }

        async fn acknowledge(&self, id: &str) -> Result<(), ApiError> {
            debug!(%id, "MockApi::acknowledge: called");
            if self.failing_acks.lock().unwrap().contains(id) {
                return Err(ApiError::Rejected(format!("cannot update {id}")));
            }
            self.acked.lock().unwrap().push(id.to_string());
            self.pending.lock().unwrap().retain(|n| n.id != id);
            if let Some(log) = self.log.lock().unwrap().as_ref() {
                log.lock().unwrap().push(format!("ack {id}"));
            }
            Ok(())
        }

        async fn probe(&self) -> Result<Duration, ApiError> {
            Ok(Duration::from_millis(1))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_acknowledge_removes_from_pending() {
            let api = MockApi::new(vec![Notification::new("a", "t", "m"), Notification::new("b", "t", "m")]);

            api.acknowledge("a").await.unwrap();

            let pending = api.fetch_pending().await.unwrap();
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].id, "b");
            assert_eq!(api.acked(), vec!["a".to_string()]);
            assert_eq!(api.fetch_count(), 1);
        }

        #[tokio::test]
        async fn test_mock_failing_ack_keeps_pending() {
            let api = MockApi::new(vec![Notification::new("a", "t", "m")]);
            api.fail_ack_for("a");

            assert!(api.acknowledge("a").await.is_err());
            assert_eq!(api.fetch_pending().await.unwrap().len(), 1);
        }
    }
}
