//! Configuration module
//!
//! Handles CLI configuration: where the analysis API lives, how often run
//! status is polled and how long a single request may take.

use anyhow::{Context, Result};
use plume_client::AnalysisClient;
use plume_poller::PollerConfig;
use std::time::Duration;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the analysis API
    pub api_url: String,

    /// Pause between status checks while watching a run
    pub poll_interval: Duration,

    /// Give up watching after this many status checks
    pub max_attempts: Option<u32>,

    /// Maximum time a single HTTP request may take
    pub request_timeout: Duration,
}

impl Config {
    /// Creates a configuration with defaults
    pub fn new(api_url: String) -> Self {
        Self {
            api_url,
            poll_interval: Duration::from_millis(2000),
            max_attempts: None,
            request_timeout: Duration::from_secs(30),
        }
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_url.is_empty() {
            anyhow::bail!("api_url cannot be empty");
        }

        if !self.api_url.starts_with("http://") && !self.api_url.starts_with("https://") {
            anyhow::bail!("api_url must start with http:// or https://");
        }

        if self.request_timeout.is_zero() {
            anyhow::bail!("request_timeout must be greater than 0");
        }

        self.poller_config()
            .validate()
            .context("Invalid polling configuration")?;

        Ok(())
    }

    /// Polling settings for run watchers
    pub fn poller_config(&self) -> PollerConfig {
        PollerConfig {
            interval: self.poll_interval,
            max_attempts: self.max_attempts,
        }
    }

    /// Builds an API client honouring the request timeout
    pub fn client(&self) -> Result<AnalysisClient> {
        AnalysisClient::with_timeout(&self.api_url, self.request_timeout)
            .context("Failed to build HTTP client")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("http://localhost:8080".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(2000));
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.max_attempts.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.api_url = "localhost:8080".to_string();
        assert!(config.validate().is_err());

        config.api_url = "https://analysis.example.com".to_string();
        assert!(config.validate().is_ok());

        config.poll_interval = Duration::ZERO;
        assert!(config.validate().is_err());

        config.poll_interval = Duration::from_millis(500);
        config.max_attempts = Some(0);
        assert!(config.validate().is_err());

        config.max_attempts = Some(10);
        config.request_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_poller_config() {
        let mut config = Config::default();
        config.max_attempts = Some(12);

        let poller = config.poller_config();
        assert_eq!(poller.interval, Duration::from_millis(2000));
        assert_eq!(poller.max_attempts, Some(12));
    }
}
