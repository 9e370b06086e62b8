//! Poller configuration
//!
//! Timing and attempt limits for a single poller instance.

use std::time::Duration;

use crate::error::{PollerError, Result};

/// Poller configuration
///
/// The interval is measured from the completion of one cycle to the start of
/// the next, so cycles never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Pause between a settled cycle and the next invocation
    pub interval: Duration,

    /// Stop after this many invocations, whatever the results were
    pub max_attempts: Option<u32>,
}

impl PollerConfig {
    /// Creates a configuration with no attempt ceiling
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_attempts: None,
        }
    }

    /// Sets the attempt ceiling
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(PollerError::InvalidInterval(self.interval));
        }

        if self.max_attempts == Some(0) {
            return Err(PollerError::InvalidMaxAttempts);
        }

        Ok(())
    }

    /// Whether `attempts` has reached the ceiling
    pub(crate) fn attempts_exhausted(&self, attempts: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempts >= max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = PollerConfig::new(Duration::from_millis(100)).with_max_attempts(5);
        assert!(config.validate().is_ok());
        assert_eq!(config.max_attempts, Some(5));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = PollerConfig::new(Duration::ZERO);
        assert_eq!(
            config.validate(),
            Err(PollerError::InvalidInterval(Duration::ZERO))
        );
    }

    #[test]
    fn test_zero_max_attempts_rejected() {
        let config = PollerConfig::new(Duration::from_secs(1)).with_max_attempts(0);
        assert_eq!(config.validate(), Err(PollerError::InvalidMaxAttempts));
    }

    #[test]
    fn test_attempts_exhausted() {
        let unlimited = PollerConfig::new(Duration::from_secs(1));
        assert!(!unlimited.attempts_exhausted(u32::MAX));

        let limited = unlimited.with_max_attempts(3);
        assert!(!limited.attempts_exhausted(2));
        assert!(limited.attempts_exhausted(3));
        assert!(limited.attempts_exhausted(4));
    }
}
