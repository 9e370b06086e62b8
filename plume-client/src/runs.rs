//! Run-related API endpoints

use crate::AnalysisClient;
use crate::error::{ClientError, Result};
use plume_core::domain::run::RunInfo;
use plume_core::dto::run::{RunSummary, SubmitRun};
use tracing::debug;
use uuid::Uuid;

impl AnalysisClient {
    // =============================================================================
    // Run Lifecycle
    // =============================================================================

    /// Submit model inputs as a new run
    ///
    /// # Arguments
    /// * `req` - The module and its input parameters
    ///
    /// # Returns
    /// The accepted run, normally in `PENDING` status
    ///
    /// # Example
    /// ```no_run
    /// # use plume_client::AnalysisClient;
    /// # use plume_core::domain::run::ModelModule;
    /// # use plume_core::dto::run::SubmitRun;
    /// # async fn example() -> anyhow::Result<()> {
    /// let client = AnalysisClient::new("http://localhost:8080");
    /// let run = client.submit_run(SubmitRun {
    ///     module: ModelModule::Aerscreen,
    ///     name: Some("stack-a".to_string()),
    ///     parameters: Default::default(),
    /// }).await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn submit_run(&self, req: SubmitRun) -> Result<RunInfo> {
        if req.parameters.is_empty() {
            return Err(ClientError::InvalidRequest(
                "run parameters must not be empty".to_string(),
            ));
        }

        let url = format!("{}/api/{}/runs", self.base_url, req.module.api_segment());
        debug!("Submitting {} run to {}", req.module, url);
        let response = self.client.post(&url).json(&req).send().await?;

        self.handle_response(response).await
    }

    /// Get a run by ID
    ///
    /// # Arguments
    /// * `run_id` - The run UUID
    ///
    /// # Returns
    /// The run details, including status and outputs
    pub async fn get_run(&self, run_id: Uuid) -> Result<RunInfo> {
        let url = format!("{}/api/runs/{}", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await.map_err(|e| {
            if e.is_not_found() {
                ClientError::NotFound(format!("run {}", run_id))
            } else {
                e
            }
        })
    }

    /// List all runs
    ///
    /// # Returns
    /// A list of run summaries
    pub async fn list_runs(&self) -> Result<Vec<RunSummary>> {
        let url = format!("{}/api/runs", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    // =============================================================================
    // Run Outputs
    // =============================================================================

    /// Download a result artifact
    ///
    /// # Arguments
    /// * `url` - Output URL, absolute or relative to the API base URL
    ///
    /// # Returns
    /// The raw artifact bytes
    pub async fn download_output(&self, url: &str) -> Result<Vec<u8>> {
        let url = self.resolve(url);
        debug!("Downloading output from {}", url);
        let response = self.client.get(&url).send().await?;
        let response = self.check_status(response).await?;

        Ok(response.bytes().await?.to_vec())
    }
}
