//! Error hierarchy for configuration propagation
//!
//! Read-path failures (`NotFound`) are surfaced to callers. Refresh failures are
//! reported per key and never escape the bus handler.

use std::time::Duration;

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Key has neither a held value nor a configured default
    #[error("Key `{key}` is not configured")]
    NotFound { key: String },

    /// A single key could not be re-resolved from its source
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// Event bus publish/subscribe failures
    #[error(transparent)]
    Bus(#[from] BusError),

    /// Service configuration loading and validation failures
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Infrastructure-level failures (sockets, signals, tasks)
    #[error(transparent)]
    System(#[from] SystemError),
}

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Source did not answer within the per-attempt deadline
    #[error("Source resolution timed out after {0:?}")]
    Timeout(Duration),

    /// Source answered with a failure
    #[error("Source failure: {0}")]
    Source(String),
}

#[derive(Debug, thiserror::Error)]
pub enum BusError {
    #[error("No subscriber is registered on the bus")]
    NoSubscribers,
}

#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Failed to bind HTTP listener: {0}")]
    Bind(String),

    #[error("Failed to install signal handler: {0}")]
    Signal(#[from] std::io::Error),

    #[error("Failed to send shutdown signal: {0}")]
    SignalSendFailed(String),

    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),
}

impl Error {
    /// True when the failure is a missing key rather than an infrastructure problem.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
