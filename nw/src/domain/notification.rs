//! Notification domain type
//!
//! A backend notification record. The backend is loose about scalar types
//! (ids may arrive as numbers, status as `0`, `"0"` or `"pending"`), so
//! decoding accepts each of those shapes.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Delivery status of a notification record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationStatus {
    /// Not yet shown to the user (wire value 0)
    #[default]
    Pending,
    /// Shown and acknowledged (wire value 1)
    Delivered,
}

impl NotificationStatus {
    /// Numeric wire code used by the notifications API
    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Delivered => 1,
        }
    }
}

impl std::fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Delivered => write!(f, "delivered"),
        }
    }
}

impl Serialize for NotificationStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawScalar {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for NotificationStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawScalar::deserialize(deserializer)?;
        match raw {
            RawScalar::Number(0) => Ok(Self::Pending),
            RawScalar::Number(1) => Ok(Self::Delivered),
            RawScalar::Number(n) => Err(serde::de::Error::custom(format!("unknown notification status {n}"))),
            RawScalar::Text(s) => match s.trim().to_lowercase().as_str() {
                "0" | "pending" => Ok(Self::Pending),
                "1" | "delivered" => Ok(Self::Delivered),
                other => Err(serde::de::Error::custom(format!("unknown notification status '{other}'"))),
            },
        }
    }
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match RawScalar::deserialize(deserializer)? {
        RawScalar::Number(n) => Ok(n.to_string()),
        RawScalar::Text(s) => Ok(s),
    }
}

/// A notification record as delivered by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Globally unique id of the backend record
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,

    /// Project scope the record belongs to (empty when unscoped)
    #[serde(default)]
    pub project: String,

    pub title: String,

    /// Display text
    pub message: String,

    #[serde(default)]
    pub status: NotificationStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<String>,
}

impl Notification {
    /// Create a pending notification with no timestamps
    pub fn new(id: impl Into<String>, title: impl Into<String>, message: impl Into<String>) -> Self {
        let id = id.into();
        debug!(%id, "Notification::new: called");
        Self {
            id,
            project: String::new(),
            title: title.into(),
            message: message.into(),
            status: NotificationStatus::Pending,
            created_at: None,
            notified_at: None,
        }
    }

    /// Build the sample notification shown by `nw test-notification`
    pub fn sample() -> Self {
        debug!("Notification::sample: called");
        Self::new(
            format!("test-{}", uuid::Uuid::now_v7()),
            "Test notification",
            "This is a test notification used to check that popups display correctly.",
        )
    }

    pub fn is_pending(&self) -> bool {
        self.status == NotificationStatus::Pending
    }
}
