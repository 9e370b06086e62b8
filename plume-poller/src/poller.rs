//! Async poller
//!
//! Repeatedly invokes a check function until a stop condition holds, the
//! attempt ceiling is reached, or the check fails. Cycles are strictly
//! sequential: the timer for cycle n+1 is armed only after cycle n settles.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::PollerConfig;
use crate::error::{PollerError, Result};
use crate::scheduler::{Scheduler, Task, TimerHandle, TokioScheduler};
use crate::state::PollState;

type CheckFuture<T, E> = Pin<Box<dyn Future<Output = std::result::Result<T, E>> + Send>>;
type CheckFn<T, E> = Arc<dyn Fn() -> CheckFuture<T, E> + Send + Sync>;
type StopCondition<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;

/// Builder for [`AsyncPoller`]
pub struct PollerBuilder<T, E> {
    check: CheckFn<T, E>,
    interval: Option<Duration>,
    max_attempts: Option<u32>,
    stop_condition: Option<StopCondition<T>>,
    scheduler: Option<Arc<dyn Scheduler>>,
}

impl<T, E> PollerBuilder<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Sets the pause between a settled cycle and the next one
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }

    /// Stops the run after this many invocations
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Applies interval and attempt ceiling from an existing configuration
    pub fn config(mut self, config: PollerConfig) -> Self {
        self.interval = Some(config.interval);
        self.max_attempts = config.max_attempts;
        self
    }

    /// Stops the run once `predicate` holds for a successful result
    pub fn stop_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&T) -> bool + Send + Sync + 'static,
    {
        self.stop_condition = Some(Arc::new(predicate));
        self
    }

    /// Replaces the default [`TokioScheduler`]
    pub fn scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Validates the configuration and creates a stopped poller
    ///
    /// Nothing is scheduled until [`AsyncPoller::start`] is called.
    pub fn build(self) -> Result<AsyncPoller<T, E>> {
        let interval = self.interval.ok_or(PollerError::MissingInterval)?;
        let config = PollerConfig {
            interval,
            max_attempts: self.max_attempts,
        };
        config.validate()?;

        let (state_tx, _) = watch::channel(PollState::default());

        Ok(AsyncPoller {
            inner: Arc::new(Inner {
                config,
                check: self.check,
                stop_condition: self.stop_condition,
                scheduler: self
                    .scheduler
                    .unwrap_or_else(|| Arc::new(TokioScheduler::new())),
                control: Mutex::new(Control {
                    state: PollState::default(),
                    generation: 0,
                    timer: None,
                    in_flight: false,
                    disposed: false,
                }),
                state_tx,
            }),
        })
    }
}

/// Generic repeated-invocation engine
///
/// Owns at most one pending timer. Dropping the poller (or calling
/// [`AsyncPoller::close`]) cancels that timer; a check already in flight is
/// left to finish but its result is discarded.
pub struct AsyncPoller<T, E> {
    inner: Arc<Inner<T, E>>,
}

struct Inner<T, E> {
    config: PollerConfig,
    check: CheckFn<T, E>,
    stop_condition: Option<StopCondition<T>>,
    scheduler: Arc<dyn Scheduler>,
    control: Mutex<Control<T, E>>,
    state_tx: watch::Sender<PollState<T, E>>,
}

struct Control<T, E> {
    state: PollState<T, E>,
    /// Bumped by every `start()`; cycles from an older run are ignored
    generation: u64,
    timer: Option<TimerHandle>,
    in_flight: bool,
    disposed: bool,
}

impl<T, E> AsyncPoller<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Starts building a poller around `check`
    pub fn builder<F, Fut>(check: F) -> PollerBuilder<T, E>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = std::result::Result<T, E>> + Send + 'static,
    {
        PollerBuilder {
            check: Arc::new(move || Box::pin(check()) as CheckFuture<T, E>),
            interval: None,
            max_attempts: None,
            stop_condition: None,
            scheduler: None,
        }
    }

    /// The validated configuration
    pub fn config(&self) -> PollerConfig {
        self.inner.config
    }

    /// (Re)starts polling
    ///
    /// Resets the attempt counter and triggers the first cycle without delay.
    /// Any pending timer from a previous run is invalidated first. If a check
    /// is still in flight, the first cycle waits for it to settle so that
    /// invocations never overlap.
    pub fn start(&self) {
        let inner = &self.inner;
        let mut ctl = inner.lock();

        if let Some(timer) = ctl.timer.take() {
            timer.cancel();
        }

        ctl.generation = ctl.generation.wrapping_add(1);
        ctl.state.attempt_count = 0;
        ctl.state.stopped = false;
        ctl.state.loading = true;

        if ctl.in_flight {
            debug!("Check in flight, deferring first cycle until it settles");
        } else {
            inner.arm(&mut ctl, Duration::ZERO);
        }

        inner.publish(&ctl);

        info!(
            "Polling started (run {}, interval: {:?}, max attempts: {:?})",
            ctl.generation, inner.config.interval, inner.config.max_attempts
        );
    }

    /// Stops polling
    ///
    /// Cancels the pending timer only; a check already in flight may still
    /// record its result. Keeps `data` and `error`. Calling it again is a no-op.
    pub fn stop(&self) {
        let inner = &self.inner;
        let mut ctl = inner.lock();

        if ctl.state.stopped && ctl.timer.is_none() {
            return;
        }

        inner.halt(&mut ctl);
        inner.publish(&ctl);

        info!("Polling stopped after {} attempt(s)", ctl.state.attempt_count);
    }

    /// Current state snapshot
    pub fn state(&self) -> PollState<T, E> {
        self.inner.lock().state.clone()
    }

    /// Receiver notified on every state transition
    pub fn subscribe(&self) -> watch::Receiver<PollState<T, E>> {
        self.inner.state_tx.subscribe()
    }

    /// Waits until the current run has stopped
    pub async fn wait_until_stopped(&self) -> PollState<T, E> {
        let mut rx = self.subscribe();
        let stopped = rx.wait_for(|state| state.stopped).await.map(|state| state.clone());

        match stopped {
            Ok(state) => state,
            Err(_) => self.state(),
        }
    }

    /// Releases the poller, invalidating any pending timer
    pub fn close(self) {
        drop(self);
    }
}

impl<T, E> Drop for AsyncPoller<T, E> {
    fn drop(&mut self) {
        let mut ctl = self.inner.lock();
        ctl.disposed = true;
        self.inner.halt(&mut ctl);
        self.inner.state_tx.send_modify(|state| {
            state.loading = false;
            state.stopped = true;
        });
    }
}

impl<T, E> Inner<T, E> {
    fn lock(&self) -> MutexGuard<'_, Control<T, E>> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn halt(&self, ctl: &mut Control<T, E>) {
        if let Some(timer) = ctl.timer.take() {
            timer.cancel();
        }
        ctl.state.loading = false;
        ctl.state.stopped = true;
    }

    fn publish(&self, ctl: &Control<T, E>)
    where
        T: Clone,
    {
        self.state_tx.send_replace(ctl.state.clone());
    }
}

impl<T, E> Inner<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Arms the single timer of the current run
    fn arm(self: &Arc<Self>, ctl: &mut Control<T, E>, delay: Duration) {
        if let Some(timer) = ctl.timer.take() {
            timer.cancel();
        }

        let task = Arc::clone(self).cycle(ctl.generation);
        ctl.timer = Some(self.scheduler.schedule(delay, task));
    }

    fn cycle(self: Arc<Self>, generation: u64) -> Task {
        Box::pin(async move {
            let attempt = {
                let mut ctl = self.lock();

                if ctl.disposed || ctl.generation != generation || ctl.state.stopped {
                    return;
                }

                ctl.timer = None;
                ctl.in_flight = true;
                ctl.state.attempt_count += 1;
                self.publish(&ctl);
                ctl.state.attempt_count
            };

            debug!("Poll attempt {} (run {})", attempt, generation);

            let outcome = (self.check)().await;
            self.settle(generation, attempt, outcome);
        })
    }

    fn settle(self: &Arc<Self>, generation: u64, attempt: u32, outcome: std::result::Result<T, E>) {
        let mut ctl = self.lock();
        ctl.in_flight = false;

        if ctl.disposed {
            debug!("Poller closed while attempt {} was in flight", attempt);
            return;
        }

        if ctl.generation != generation {
            debug!("Discarding attempt {} from superseded run {}", attempt, generation);
            if !ctl.state.stopped {
                self.arm(&mut ctl, Duration::ZERO);
            }
            return;
        }

        match outcome {
            Ok(value) => {
                let satisfied = self
                    .stop_condition
                    .as_ref()
                    .is_some_and(|condition| condition(&value));

                ctl.state.data = Some(value);
                ctl.state.error = None;

                if ctl.state.stopped {
                    debug!("Attempt {} settled after stop, not rescheduling", attempt);
                } else if satisfied {
                    info!("Stop condition met after {} attempt(s)", attempt);
                    self.halt(&mut ctl);
                } else if self.config.attempts_exhausted(ctl.state.attempt_count) {
                    info!("Giving up after {} attempt(s)", attempt);
                    self.halt(&mut ctl);
                } else {
                    self.arm(&mut ctl, self.config.interval);
                }
            }
            Err(error) => {
                warn!("Poll attempt {} failed, halting run", attempt);
                ctl.state.error = Some(Arc::new(error));
                self.halt(&mut ctl);
            }
        }

        self.publish(&ctl);
    }
}
