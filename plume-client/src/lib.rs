//! Plume HTTP Client
//!
//! A simple, type-safe HTTP client for the analysis API that executes
//! AERSCREEN, AERSURFACE and AERMOD runs.
//!
//! # Example
//!
//! ```no_run
//! use plume_client::AnalysisClient;
//! use uuid::Uuid;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = AnalysisClient::new("http://localhost:8080");
//!
//!     let run = client.get_run(Uuid::new_v4()).await?;
//!     println!("Run {} is {}", run.id, run.status);
//!     Ok(())
//! }
//! ```

pub mod error;
mod runs;
mod source;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use source::RunSource;

use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the analysis API
///
/// Provides run submission, lookup and listing, plus result file downloads.
/// Request timeouts belong here; the poller driving status checks has none.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    /// Base URL of the API (e.g., "http://localhost:8080")
    base_url: String,
    /// HTTP client instance
    client: Client,
}

impl AnalysisClient {
    /// Create a new analysis client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the analysis API (e.g., "http://localhost:8080")
    ///
    /// # Example
    /// ```
    /// use plume_client::AnalysisClient;
    ///
    /// let client = AnalysisClient::new("http://localhost:8080");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new analysis client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the analysis API
    /// * `client` - A configured reqwest Client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a new analysis client whose requests give up after `timeout`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built (e.g. TLS backend
    /// initialisation failure).
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(base_url, client))
    }

    /// Get the base URL of the analysis API
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve an API-relative path (e.g. an output URL) against the base URL
    pub(crate) fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Handle an API response and deserialize JSON
    ///
    /// This method checks the status code and returns an appropriate error if
    /// the request failed, or deserializes the response body if successful.
    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T> {
        let response = self.check_status(response).await?;

        response
            .json()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }

    /// Turn a non-success status into a [`ClientError::ApiError`]
    async fn check_status(&self, response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(response)
    }
}
