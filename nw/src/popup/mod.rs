//! Popup windows
//!
//! - [`NotificationWindowQueue`]: bounded, position-ordered stack of popups
//! - [`WindowHost`]: opens, places and closes the actual windows
//! - [`PopupPresenter`]: the coordinator's display sink, with auto-dismissal

mod geometry;
mod host;
mod presenter;
mod queue;

pub use geometry::{Rect, StackLayout};
pub use host::{TerminalHost, WindowHost};
pub use presenter::PopupPresenter;
pub use queue::{NotificationWindowQueue, Shown, Slot};
