//! Timed Poller
//!
//! Runs an async callback on a fixed period until stopped. Used by the
//! delivery coordinator as the fallback channel while push is unavailable.

mod timed;

pub use timed::TimedPoller;
