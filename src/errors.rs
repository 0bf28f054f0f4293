//! Lease Election Error Hierarchy
//!
//! Store outcomes are split from process-level failures: `StoreError`
//! describes a single round trip against the lease backend and is consumed
//! by the election loop, while `Error` is what crosses the crate boundary.

use config::ConfigError;
use tokio::task::JoinError;

#[doc(hidden)]
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Missing or invalid setting. Fatal at startup, never retried.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Lease backend failure surfaced outside the election loop
    #[error(transparent)]
    Store(#[from] StoreError),

    /// OS-level failure, e.g. installing signal handlers
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Background task panicked or was aborted
    #[error("Background task failed: {0}")]
    TaskFailed(#[from] JoinError),

    /// Work unit reported a failure for one tick
    #[error("Work unit failed: {0}")]
    Work(String),

    /// Unrecoverable failures requiring process termination
    #[error("Fatal error: {0}")]
    Fatal(String),
}

/// Outcome of a single lease store round trip.
///
/// Only `Unavailable` is a failure in the operational sense. `Conflict` and
/// `NotFound` are expected answers that steer the election loop.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The expected version did not match, or the record already exists.
    /// Someone else won this round.
    #[error("lease version conflict")]
    Conflict,

    /// The lease record does not exist yet
    #[error("lease not found")]
    NotFound,

    /// Transient backend failure (network, API server, timeout)
    #[error("lease store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

impl Error {
    /// Shorthand used by every `validate()` in the config module
    pub(crate) fn invalid_config(msg: impl Into<String>) -> Self {
        Error::Config(ConfigError::Message(msg.into()))
    }
}
