//! Domain types for notifywatch
//!
//! Core domain types: Notification and its delivery status.
//! These mirror the backend record shape returned by the notifications API
//! and carried inside push payloads.

mod notification;

pub use notification::{Notification, NotificationStatus};
