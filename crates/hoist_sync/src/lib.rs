//! Deadline-bounded waits against a remote control plane.
//!
//! Two primitives cover the bootstrap wait: [`poll_until`] repeats a
//! reachability check on a fixed tick, and [`until`] consumes a resumable
//! event stream, reconnecting from the last seen [`EventCursor`] whenever the
//! stream drops. [`wait_for_bootstrap`] runs them back to back.

#![warn(missing_docs)]

pub mod bootstrap;
pub mod control_plane;
pub mod downsample;
pub mod error;
pub mod event;
pub mod poll;
pub mod watch;

pub use bootstrap::{wait_for_bootstrap, BootstrapWait};
pub use control_plane::{ControlPlane, ServerVersion};
pub use downsample::LogDownsampler;
pub use error::{BootstrapError, ConditionError, SyncError, TransportError, WaitStage};
pub use event::{ClusterEvent, EventCursor, EventStream, Versioned, WatchEvent, WatchStatus};
pub use poll::poll_until;
pub use watch::until;

use std::time::Duration;

/// Timing for one wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitSettings {
    /// Overall budget for the wait.
    pub timeout: Duration,
    /// Check tick for polling waits; retry delay after a failed stream open.
    pub interval: Duration,
    /// Repeats of an identical transport error between two log lines.
    pub log_downsample: u32,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30 * 60),
            interval: Duration::from_secs(2),
            log_downsample: 15,
        }
    }
}
