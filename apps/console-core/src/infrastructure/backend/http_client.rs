//! HTTP client wrapper with retry logic.
//!
//! Retry policy lives here and only here: the gateway above never retries.
//! Replaying `POST /api/orders` is safe because the `Idempotency-Key`
//! header repeats on every attempt of the same submission.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use super::config::{BackendConfig, RetryConfig};
use super::error::BackendApiError;

/// Header carrying the submission's idempotency key.
pub const IDEMPOTENCY_KEY_HEADER: &str = "Idempotency-Key";

/// HTTP client for the execution backend with retry logic.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    retry_config: RetryConfig,
}

impl HttpClient {
    /// Create a new HTTP client from config.
    ///
    /// # Errors
    ///
    /// Returns [`BackendApiError::Http`] when the underlying client cannot
    /// be constructed.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendApiError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_config: config.retry.clone(),
        })
    }

    /// Make a GET request, returning the raw success body.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendApiError`] when every attempt fails.
    pub async fn get(&self, path: &str) -> Result<String, BackendApiError> {
        self.request(Method::GET, path, None, None).await
    }

    /// Make a POST request, returning the raw success body.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendApiError`] when every attempt fails.
    pub async fn post(
        &self,
        path: &str,
        body: Option<&Value>,
        idempotency_key: Option<&str>,
    ) -> Result<String, BackendApiError> {
        self.request(Method::POST, path, body, idempotency_key).await
    }

    /// Internal request implementation with retry logic.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        idempotency_key: Option<&str>,
    ) -> Result<String, BackendApiError> {
        let url = format!("{}{path}", self.base_url);
        let mut backoff = ExponentialBackoff::new(&self.retry_config);

        loop {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(b) = body {
                request = request.json(b);
            }
            if let Some(key) = idempotency_key {
                request = request.header(IDEMPOTENCY_KEY_HEADER, key);
            }

            let response = match request.send().await {
                Ok(resp) => resp,
                Err(e) => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            error = %e,
                            delay_ms = delay.as_millis(),
                            attempt = backoff.attempt,
                            "Network error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(BackendApiError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                        last_status: None,
                    });
                }
            };

            let status = response.status();

            if status.is_success() {
                return response
                    .text()
                    .await
                    .map_err(|e| BackendApiError::Network(e.to_string()));
            }

            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            let error_body = response.text().await.unwrap_or_default();
            let message = extract_error_message(status, &error_body);

            match categorize_status(status) {
                ErrorCategory::RateLimited => {
                    // Retry-After stretches the wait but never bypasses
                    // attempt accounting; every 429 consumes an attempt.
                    let Some(computed) = backoff.next_backoff() else {
                        return Err(BackendApiError::MaxRetriesExceeded {
                            attempts: backoff.attempt,
                            last_status: Some(status.as_u16()),
                        });
                    };
                    let delay = retry_after
                        .map(Duration::from_secs)
                        .map_or(computed, |requested| requested.max(computed));
                    tracing::warn!(
                        delay_ms = delay.as_millis(),
                        attempt = backoff.attempt,
                        "Rate limited, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                ErrorCategory::Retryable => {
                    if let Some(delay) = backoff.next_backoff() {
                        tracing::warn!(
                            status = status.as_u16(),
                            message = %message,
                            delay_ms = delay.as_millis(),
                            "Retryable error, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    return Err(BackendApiError::MaxRetriesExceeded {
                        attempts: backoff.attempt,
                        last_status: Some(status.as_u16()),
                    });
                }
                ErrorCategory::NonRetryable => {
                    return Err(BackendApiError::Status {
                        status: status.as_u16(),
                        message,
                    });
                }
            }
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend is loose here too: error bodies arrive as `{"message": ...}`,
/// `{"error": ...}`, plain text, or nothing.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                body.to_string()
            }
        })
}

/// Error category for determining retry behavior.
enum ErrorCategory {
    RateLimited,
    Retryable,
    NonRetryable,
}

/// Categorize HTTP status code for retry handling.
const fn categorize_status(status: StatusCode) -> ErrorCategory {
    match status.as_u16() {
        429 => ErrorCategory::RateLimited,
        408 | 500 | 502 | 503 | 504 => ErrorCategory::Retryable,
        _ => ErrorCategory::NonRetryable,
    }
}

/// Exponential backoff calculator.
struct ExponentialBackoff {
    attempt: u32,
    max_attempts: u32,
    current_backoff: Duration,
    max_backoff: Duration,
    multiplier: f64,
}

impl ExponentialBackoff {
    const fn new(config: &RetryConfig) -> Self {
        Self {
            attempt: 0,
            max_attempts: config.max_attempts,
            current_backoff: config.initial_backoff,
            max_backoff: config.max_backoff,
            multiplier: config.multiplier,
        }
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        self.attempt += 1;
        if self.attempt >= self.max_attempts {
            return None;
        }

        let backoff = self.current_backoff;
        self.current_backoff = Duration::from_secs_f64(
            (self.current_backoff.as_secs_f64() * self.multiplier)
                .min(self.max_backoff.as_secs_f64()),
        );

        Some(backoff)
    }
}
