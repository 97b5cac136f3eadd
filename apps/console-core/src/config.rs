//! Runtime Configuration
//!
//! Environment-derived settings for the console binary. Every variable has
//! a default so the binary always starts; an unset backend URL selects the
//! in-process demo backend instead of failing.

use std::time::Duration;

use crate::application::services::TickerConfig;

/// Default per-request HTTP timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

/// Default order lifecycle tick interval in milliseconds.
const DEFAULT_ORDER_TICK_MS: u64 = 2_500;

/// Default metrics drift tick interval in milliseconds.
const DEFAULT_METRICS_TICK_MS: u64 = 2_000;

/// Default authoritative refresh interval in seconds.
const DEFAULT_REFRESH_SECS: u64 = 30;

/// Runtime configuration parsed from `PERISCOPE_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Backend base URL. `None` selects the in-process demo backend.
    pub backend_url: Option<String>,
    /// Per-request HTTP timeout in seconds.
    pub http_timeout_secs: u64,
    /// Order lifecycle tick interval in milliseconds.
    pub order_tick_ms: u64,
    /// Metrics drift tick interval in milliseconds.
    pub metrics_tick_ms: u64,
    /// Authoritative list/metrics refresh interval in seconds.
    pub refresh_secs: u64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            backend_url: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            order_tick_ms: DEFAULT_ORDER_TICK_MS,
            metrics_tick_ms: DEFAULT_METRICS_TICK_MS,
            refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl ConsoleConfig {
    /// Read configuration from the environment.
    ///
    /// Unset, unparseable, or zero values fall back to their defaults. A
    /// blank `PERISCOPE_BACKEND_URL` counts as unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            backend_url: read_backend_url(std::env::var("PERISCOPE_BACKEND_URL").ok()),
            http_timeout_secs: read_u64(
                std::env::var("PERISCOPE_HTTP_TIMEOUT_SECS").ok(),
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            order_tick_ms: read_u64(
                std::env::var("PERISCOPE_ORDER_TICK_MS").ok(),
                DEFAULT_ORDER_TICK_MS,
            ),
            metrics_tick_ms: read_u64(
                std::env::var("PERISCOPE_METRICS_TICK_MS").ok(),
                DEFAULT_METRICS_TICK_MS,
            ),
            refresh_secs: read_u64(
                std::env::var("PERISCOPE_REFRESH_SECS").ok(),
                DEFAULT_REFRESH_SECS,
            ),
        }
    }

    /// Whether the binary should run against the in-process demo backend.
    #[must_use]
    pub const fn is_demo(&self) -> bool {
        self.backend_url.is_none()
    }

    /// Per-request HTTP timeout as a [`Duration`].
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Authoritative refresh interval as a [`Duration`].
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_secs)
    }

    /// Tick intervals for the simulation driver.
    #[must_use]
    pub const fn ticker_config(&self) -> TickerConfig {
        TickerConfig {
            order_tick_ms: self.order_tick_ms,
            metrics_tick_ms: self.metrics_tick_ms,
        }
    }
}

/// Treat an unset or blank URL as demo mode.
fn read_backend_url(raw: Option<String>) -> Option<String> {
    raw.map(|url| url.trim().to_string())
        .filter(|url| !url.is_empty())
}

/// Parse an integer setting, falling back when unset or invalid. Every
/// numeric setting here is a period or timeout, so zero counts as invalid:
/// a zero-length tick interval would panic the interval timer it feeds.
fn read_u64(raw: Option<String>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConsoleConfig::default();

        assert_eq!(config.backend_url, None);
        assert_eq!(config.http_timeout_secs, 10);
        assert_eq!(config.order_tick_ms, 2_500);
        assert_eq!(config.metrics_tick_ms, 2_000);
        assert_eq!(config.refresh_secs, 30);
    }

    #[test]
    fn test_default_is_demo_mode() {
        assert!(ConsoleConfig::default().is_demo());
    }

    #[test]
    fn test_backend_url_selects_live_mode() {
        let config = ConsoleConfig {
            backend_url: Some("http://localhost:8080".to_string()),
            ..ConsoleConfig::default()
        };

        assert!(!config.is_demo());
    }

    #[test]
    fn test_read_backend_url_blank_counts_as_unset() {
        assert_eq!(read_backend_url(None), None);
        assert_eq!(read_backend_url(Some(String::new())), None);
        assert_eq!(read_backend_url(Some("   ".to_string())), None);
    }

    #[test]
    fn test_read_backend_url_trims_whitespace() {
        let url = read_backend_url(Some("  http://localhost:8080  ".to_string()));

        assert_eq!(url, Some("http://localhost:8080".to_string()));
    }

    #[test]
    fn test_read_u64_parses_value() {
        assert_eq!(read_u64(Some("1500".to_string()), 2_500), 1_500);
        assert_eq!(read_u64(Some(" 42 ".to_string()), 2_500), 42);
    }

    #[test]
    fn test_read_u64_falls_back_when_unset() {
        assert_eq!(read_u64(None, 2_500), 2_500);
    }

    #[test]
    fn test_read_u64_falls_back_on_garbage() {
        assert_eq!(read_u64(Some("fast".to_string()), 2_500), 2_500);
        assert_eq!(read_u64(Some("-10".to_string()), 2_500), 2_500);
        assert_eq!(read_u64(Some(String::new()), 2_500), 2_500);
    }

    #[test]
    fn test_read_u64_rejects_zero_period() {
        // Zero would panic the interval timers downstream.
        assert_eq!(read_u64(Some("0".to_string()), 2_500), 2_500);
        assert_eq!(read_u64(Some(" 0 ".to_string()), 30), 30);
    }

    #[test]
    fn test_durations_derive_from_seconds() {
        let config = ConsoleConfig::default();

        assert_eq!(config.http_timeout(), Duration::from_secs(10));
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
    }

    #[test]
    fn test_ticker_config_carries_tick_intervals() {
        let config = ConsoleConfig {
            order_tick_ms: 100,
            metrics_tick_ms: 200,
            ..ConsoleConfig::default()
        };
        let ticker = config.ticker_config();

        assert_eq!(ticker.order_tick_ms, 100);
        assert_eq!(ticker.metrics_tick_ms, 200);
    }
}
