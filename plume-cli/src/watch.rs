//! Run watcher
//!
//! Follows one analysis run until it settles. The watcher owns an
//! [`AsyncPoller`] whose check function looks the run up and whose stop
//! condition is a terminal run status. When a status check fails, the
//! watcher decides whether to restart the poller after a fixed pause.

use plume_client::{ClientError, RunSource};
use plume_core::domain::run::{RunInfo, RunStatus};
use plume_poller::{AsyncPoller, PollState, PollerConfig, PollerError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// State snapshot reported while watching
pub type RunPollState = PollState<RunInfo, ClientError>;

/// How a watch ended
#[derive(Debug)]
pub enum WatchOutcome {
    /// The run finished successfully
    Finished(RunInfo),
    /// The run reached `FAIL`
    Failed(RunInfo),
    /// The attempt ceiling was reached before the run settled
    GaveUp {
        attempts: u32,
        last: Option<RunInfo>,
    },
    /// A status check failed and was not (or no longer) retried
    Errored(Arc<ClientError>),
}

/// Watches a single run through a [`RunSource`]
pub struct RunWatcher<S> {
    source: Arc<S>,
    run_id: Uuid,
    config: PollerConfig,
    retries: u32,
    retry_pause: Duration,
}

impl<S: RunSource + 'static> RunWatcher<S> {
    /// Creates a watcher that does not retry failed status checks
    pub fn new(source: Arc<S>, run_id: Uuid, config: PollerConfig) -> Self {
        Self {
            source,
            run_id,
            config,
            retries: 0,
            retry_pause: Duration::from_secs(5),
        }
    }

    /// Restarts polling up to `retries` times after a transient failure
    pub fn with_retries(mut self, retries: u32, pause: Duration) -> Self {
        self.retries = retries;
        self.retry_pause = pause;
        self
    }

    fn poller(&self) -> Result<AsyncPoller<RunInfo, ClientError>, PollerError> {
        let source = Arc::clone(&self.source);
        let run_id = self.run_id;

        AsyncPoller::builder(move || {
            let source = Arc::clone(&source);
            async move { source.fetch_run(run_id).await }
        })
        .config(self.config)
        .stop_when(RunInfo::is_terminal)
        .build()
    }

    /// Polls until the run settles, reporting every snapshot to `on_update`
    ///
    /// Dropping the returned future releases the poller and its timer.
    pub async fn watch<F>(&self, mut on_update: F) -> Result<WatchOutcome, PollerError>
    where
        F: FnMut(&RunPollState),
    {
        let poller = self.poller()?;
        let mut rx = poller.subscribe();
        let mut restarts = 0;

        info!("Watching run {}", self.run_id);
        poller.start();

        loop {
            let state = loop {
                let state = rx.borrow_and_update().clone();
                on_update(&state);
                if state.stopped || rx.changed().await.is_err() {
                    break state;
                }
            };

            if let Some(error) = state.error {
                if restarts < self.retries && is_transient(&error) {
                    restarts += 1;
                    warn!(
                        "Status check for run {} failed ({}), retrying in {:?} ({}/{})",
                        self.run_id, error, self.retry_pause, restarts, self.retries
                    );
                    tokio::time::sleep(self.retry_pause).await;
                    poller.start();
                    continue;
                }
                return Ok(WatchOutcome::Errored(error));
            }

            return Ok(match state.data {
                Some(run) if run.status == RunStatus::Finished => WatchOutcome::Finished(run),
                Some(run) if run.status == RunStatus::Fail => WatchOutcome::Failed(run),
                last => WatchOutcome::GaveUp {
                    attempts: state.attempt_count,
                    last,
                },
            });
        }
    }
}

/// Failures worth another try: transport problems and 5xx answers
fn is_transient(error: &ClientError) -> bool {
    match error {
        ClientError::RequestFailed(_) => true,
        ClientError::ApiError { .. } => error.is_server_error(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plume_core::domain::run::ModelModule;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Status(RunStatus),
        ServerError,
        Missing,
    }

    /// Source that replays a script, repeating the last step forever
    struct ScriptedSource {
        steps: Vec<Step>,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(steps: Vec<Step>) -> Arc<Self> {
            Arc::new(Self {
                steps,
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RunSource for ScriptedSource {
        async fn fetch_run(&self, run_id: Uuid) -> plume_client::Result<RunInfo> {
            let index = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            let step = self.steps[index.min(self.steps.len() - 1)];

            match step {
                Step::Status(status) => Ok(RunInfo {
                    id: run_id,
                    module: ModelModule::Aermod,
                    status,
                    name: None,
                    submitted_at: chrono::Utc::now(),
                    started_at: None,
                    finished_at: None,
                    progress: None,
                    message: None,
                    outputs: Vec::new(),
                }),
                Step::ServerError => Err(ClientError::api_error(503, "busy")),
                Step::Missing => Err(ClientError::NotFound(format!("run {}", run_id))),
            }
        }
    }

    fn config(max_attempts: Option<u32>) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(100),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_until_finished() {
        let source = ScriptedSource::new(vec![
            Step::Status(RunStatus::Pending),
            Step::Status(RunStatus::Running),
            Step::Status(RunStatus::Finished),
        ]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(None));

        let seen = Mutex::new(Vec::new());
        let outcome = watcher
            .watch(|state| {
                if let Some(run) = &state.data {
                    seen.lock().unwrap().push(run.status);
                }
            })
            .await
            .unwrap();

        assert!(matches!(outcome, WatchOutcome::Finished(_)));
        assert_eq!(source.calls(), 3);
        let seen = seen.into_inner().unwrap();
        assert_eq!(seen.last(), Some(&RunStatus::Finished));
        assert!(seen.contains(&RunStatus::Running));
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_reports_failed_run() {
        let source = ScriptedSource::new(vec![
            Step::Status(RunStatus::Running),
            Step::Status(RunStatus::Fail),
        ]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(None));

        let outcome = watcher.watch(|_| {}).await.unwrap();

        assert!(matches!(outcome, WatchOutcome::Failed(run) if run.status == RunStatus::Fail));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_gives_up_at_ceiling() {
        let source = ScriptedSource::new(vec![Step::Status(RunStatus::Running)]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(Some(2)));

        let outcome = watcher.watch(|_| {}).await.unwrap();

        match outcome {
            WatchOutcome::GaveUp { attempts, last } => {
                assert_eq!(attempts, 2);
                assert_eq!(last.map(|run| run.status), Some(RunStatus::Running));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_run_is_not_retried() {
        let source = ScriptedSource::new(vec![Step::Missing]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(None))
            .with_retries(3, Duration::from_millis(10));

        let outcome = watcher.watch(|_| {}).await.unwrap();

        assert!(matches!(outcome, WatchOutcome::Errored(error) if error.is_not_found()));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_error_restarts_poller() {
        let source = ScriptedSource::new(vec![
            Step::ServerError,
            Step::Status(RunStatus::Running),
            Step::Status(RunStatus::Finished),
        ]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(None))
            .with_retries(1, Duration::from_millis(250));

        let outcome = watcher.watch(|_| {}).await.unwrap();

        assert!(matches!(outcome, WatchOutcome::Finished(_)));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted() {
        let source = ScriptedSource::new(vec![Step::ServerError]);
        let watcher = RunWatcher::new(Arc::clone(&source), Uuid::new_v4(), config(None))
            .with_retries(2, Duration::from_millis(10));

        let outcome = watcher.watch(|_| {}).await.unwrap();

        assert!(matches!(outcome, WatchOutcome::Errored(error) if error.is_server_error()));
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_invalid_config_is_reported() {
        let source = ScriptedSource::new(vec![Step::Status(RunStatus::Running)]);
        let watcher = RunWatcher::new(
            Arc::clone(&source),
            Uuid::new_v4(),
            PollerConfig::new(Duration::ZERO),
        );

        let result = watcher.watch(|_| {}).await;

        assert!(matches!(result, Err(PollerError::InvalidInterval(_))));
        assert_eq!(source.calls(), 0);
    }

    #[test]
    fn test_transient_classification() {
        assert!(is_transient(&ClientError::api_error(502, "bad gateway")));
        assert!(!is_transient(&ClientError::api_error(400, "bad input")));
        assert!(!is_transient(&ClientError::ParseError("eof".to_string())));
        assert!(!is_transient(&ClientError::NotFound("run".to_string())));
    }
}
