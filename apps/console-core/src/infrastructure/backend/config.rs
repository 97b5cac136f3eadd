//! Backend adapter configuration.

use std::time::Duration;

/// Configuration for the HTTP backend adapter.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the execution backend, without a trailing slash.
    pub base_url: String,
    /// HTTP request timeout.
    pub timeout: Duration,
    /// Retry policy configuration.
    pub retry: RetryConfig,
}

impl BackendConfig {
    /// Create a new configuration with default timeout and retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
            retry: RetryConfig::default(),
        }
    }

    /// Set the HTTP timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, counting the first one.
    pub max_attempts: u32,
    /// Initial backoff duration.
    pub initial_backoff: Duration,
    /// Maximum backoff duration.
    pub max_backoff: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
}

impl RetryConfig {
    /// Policy that never retries, for tests and one-shot requests.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_millis(0),
            max_backoff: Duration::from_millis(0),
            multiplier: 1.0,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(10),
            multiplier: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn config_creation() {
        let config = BackendConfig::new("http://localhost:4000");
        assert_eq!(config.base_url, "http://localhost:4000");
        assert_eq!(config.timeout, Duration::from_secs(10));
    }

    #[test]
    fn config_with_timeout() {
        let config =
            BackendConfig::new("http://localhost:4000").with_timeout(Duration::from_secs(60));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn config_with_retry() {
        let retry = RetryConfig {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(30),
            multiplier: 3.0,
        };
        let config = BackendConfig::new("http://localhost:4000").with_retry(retry);
        assert_eq!(config.retry.max_attempts, 5);
    }

    #[test]
    fn retry_config_default() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.initial_backoff, Duration::from_millis(100));
        assert_eq!(retry.max_backoff, Duration::from_secs(10));
        assert_eq!(retry.multiplier, 2.0);
    }

    #[test]
    fn retry_config_none_never_retries() {
        let retry = RetryConfig::none();
        assert_eq!(retry.max_attempts, 1);
    }
}
