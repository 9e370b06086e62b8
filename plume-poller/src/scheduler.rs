//! Timer scheduling
//!
//! The poller never touches a clock directly. It asks a [`Scheduler`] to run a
//! task once after a delay and keeps the returned [`TimerHandle`] so the timer
//! can be invalidated on every exit path.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::trace;

/// A unit of work handed to a scheduler
pub type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Schedule-once capability
///
/// Implementations must not poll `task` inline: the poller calls `schedule`
/// while holding its own lock.
pub trait Scheduler: Send + Sync + 'static {
    /// Runs `task` once `delay` has elapsed
    ///
    /// Cancelling or dropping the returned handle before the delay elapses
    /// prevents the task from starting. A task that has already started runs
    /// to completion.
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Exclusive handle to one pending timer
#[derive(Debug)]
pub struct TimerHandle {
    cancel: Option<oneshot::Sender<()>>,
}

impl TimerHandle {
    /// Creates a handle and the signal a scheduler waits on
    ///
    /// The receiver resolves when the handle is cancelled or dropped.
    pub fn channel() -> (Self, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        (Self { cancel: Some(tx) }, rx)
    }

    /// Invalidates the timer
    pub fn cancel(mut self) {
        if let Some(tx) = self.cancel.take() {
            // The timer may already have fired; nothing to do then.
            let _ = tx.send(());
        }
    }
}

/// Scheduler backed by the Tokio timer wheel
///
/// Must be used from within a Tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl TokioScheduler {
    /// Creates a new Tokio scheduler
    pub fn new() -> Self {
        Self
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let (handle, cancelled) = TimerHandle::channel();

        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => task.await,
                _ = cancelled => trace!("timer cancelled before firing"),
            }
        });

        handle
    }
}
