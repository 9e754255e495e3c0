//! Error types for synchronizer waits.

use std::fmt;
use std::time::Duration;

/// Error a wait condition may report to abort the wait.
pub type ConditionError = Box<dyn std::error::Error + Send + Sync>;

/// Transient failure talking to the control plane.
///
/// Transport errors are retried until the wait's deadline and only surface
/// as the `last_error` of a timeout.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established or was reset.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body or reason phrase.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),
}

/// Errors ending a synchronizer wait.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// The deadline passed before the remote end ever answered.
    #[error("timed out after {timeout:?} without reaching the server{}", last_error_suffix(.last_error))]
    Unreachable {
        /// The wait's overall budget.
        timeout: Duration,
        /// The most recent transport failure, if any was seen.
        last_error: Option<TransportError>,
    },

    /// The remote end answered but the condition never held before the deadline.
    #[error("timed out after {timeout:?} waiting for the condition")]
    Unsatisfied {
        /// The wait's overall budget.
        timeout: Duration,
    },

    /// The wait was cancelled from outside.
    #[error("wait cancelled")]
    Cancelled,

    /// The condition itself reported an error.
    #[error("condition failed: {0}")]
    Condition(ConditionError),
}

fn last_error_suffix(last_error: &Option<TransportError>) -> String {
    match last_error {
        Some(err) => format!(" (last error: {err})"),
        None => String::new(),
    }
}

impl SyncError {
    /// Returns `true` for either kind of deadline expiry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, SyncError::Unreachable { .. } | SyncError::Unsatisfied { .. })
    }
}

/// The stages of the bootstrap wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStage {
    /// Polling the API server's version endpoint.
    Api,
    /// Watching for the completion event.
    CompletionEvent,
}

impl fmt::Display for WaitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WaitStage::Api => write!(f, "the Kubernetes API"),
            WaitStage::CompletionEvent => write!(f, "the bootstrap completion event"),
        }
    }
}

/// A bootstrap wait failed in one of its stages.
#[derive(Debug, thiserror::Error)]
#[error("waiting for {stage}: {source}")]
pub struct BootstrapError {
    /// Which wait failed.
    pub stage: WaitStage,
    /// Why it failed.
    pub source: SyncError,
}
