//! Run source abstraction
//!
//! Status watchers only need to look a run up by ID. Keeping that behind a
//! trait lets them be exercised without an HTTP server.

use async_trait::async_trait;
use plume_core::domain::run::RunInfo;
use uuid::Uuid;

use crate::AnalysisClient;
use crate::error::Result;

/// Anything that can report the current state of a run
#[async_trait]
pub trait RunSource: Send + Sync {
    /// Fetches the latest information for `run_id`
    async fn fetch_run(&self, run_id: Uuid) -> Result<RunInfo>;
}

#[async_trait]
impl RunSource for AnalysisClient {
    async fn fetch_run(&self, run_id: Uuid) -> Result<RunInfo> {
        self.get_run(run_id).await
    }
}
