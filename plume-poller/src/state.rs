//! Observable poller state

use std::sync::Arc;

/// Snapshot of one poller instance
///
/// `error` is shared so snapshots stay cheap to clone without requiring the
/// check function's error type to be `Clone`.
#[derive(Debug)]
pub struct PollState<T, E> {
    /// Most recent successful result
    pub data: Option<T>,
    /// True while a run is active
    pub loading: bool,
    /// Error of the most recent attempt, if it failed
    pub error: Option<Arc<E>>,
    /// True when no further cycles will be scheduled
    pub stopped: bool,
    /// Check invocations made in the current run
    pub attempt_count: u32,
}

impl<T, E> PollState<T, E> {
    /// Whether the last attempt failed
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

impl<T, E> Default for PollState<T, E> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            stopped: true,
            attempt_count: 0,
        }
    }
}

impl<T: Clone, E> Clone for PollState<T, E> {
    fn clone(&self) -> Self {
        Self {
            data: self.data.clone(),
            loading: self.loading,
            error: self.error.clone(),
            stopped: self.stopped,
            attempt_count: self.attempt_count,
        }
    }
}
