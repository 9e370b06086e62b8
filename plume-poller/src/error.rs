//! Error types for the poller
//!
//! Only configuration problems are reported here. Failures of the check
//! function are recorded verbatim in [`crate::PollState::error`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias for poller construction
pub type Result<T> = std::result::Result<T, PollerError>;

/// Errors raised synchronously while configuring a poller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    /// No polling interval was supplied
    #[error("polling interval is required")]
    MissingInterval,

    /// Polling interval must be strictly positive
    #[error("polling interval must be greater than zero (got {0:?})")]
    InvalidInterval(Duration),

    /// An attempt ceiling of zero would never run a check
    #[error("max_attempts must be at least 1")]
    InvalidMaxAttempts,
}
