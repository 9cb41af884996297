//! Transport client for the notifications API
//!
//! Fetches pending notifications, acknowledges delivered ones and probes
//! connectivity. Every call carries a fixed timeout and reports timeouts
//! separately from HTTP status failures.

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod types;

pub use client::{HttpApiClient, NotificationApi};
pub use error::ApiError;
pub use types::{ApiEnvelope, StatusUpdate};

use crate::config::ApiConfig;

/// Create the API client described by the configuration
pub fn create_client(config: &ApiConfig) -> Result<Arc<dyn NotificationApi>, ApiError> {
    debug!(domain = %config.domain, "create_client: called");
    Ok(Arc::new(HttpApiClient::from_config(config)?))
}
