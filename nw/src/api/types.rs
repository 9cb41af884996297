//! Wire types for the notifications API

use serde::{Deserialize, Serialize};

/// Response envelope shared by every notifications endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,

    pub data: Option<T>,

    #[serde(default)]
    pub count: usize,

    #[serde(default)]
    pub message: String,
}

/// Body of the acknowledge request
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusUpdate {
    pub status: u8,
}

impl StatusUpdate {
    pub fn delivered() -> Self {
        Self { status: 1 }
    }
}
