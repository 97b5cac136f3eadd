//! HTTP backend adapter implementing `BackendPort`.

use async_trait::async_trait;
use serde_json::Value;

use crate::application::ports::{BackendError, BackendPort, MetricsPayload};

use super::config::BackendConfig;
use super::error::BackendApiError;
use super::http_client::HttpClient;

const ORDERS_PATH: &str = "/api/orders";
const METRICS_PATH: &str = "/api/metrics";
const RESET_PATH: &str = "/api/reset";

/// HTTP adapter for a real execution backend.
///
/// Implements `BackendPort` over the retrying [`HttpClient`]. The adapter
/// does no envelope unwrapping; payloads go to the normalizer as they
/// arrived.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: HttpClient,
}

impl HttpBackend {
    /// Create a new HTTP backend adapter.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let client = HttpClient::new(config)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl BackendPort for HttpBackend {
    async fn submit_order(
        &self,
        body: &Value,
        idempotency_key: &str,
    ) -> Result<Value, BackendError> {
        let text = self
            .client
            .post(ORDERS_PATH, Some(body), Some(idempotency_key))
            .await?;
        Ok(parse_json(&text)?)
    }

    async fn fetch_orders(&self) -> Result<Value, BackendError> {
        let text = self.client.get(ORDERS_PATH).await?;
        Ok(parse_json(&text)?)
    }

    async fn fetch_metrics(&self) -> Result<MetricsPayload, BackendError> {
        let text = self.client.get(METRICS_PATH).await?;
        // A non-JSON body with a success status is still a valid metrics
        // reply; hand it through opaque.
        match serde_json::from_str::<Value>(&text) {
            Ok(value) => Ok(MetricsPayload::Json(value)),
            Err(_) => Ok(MetricsPayload::Text(text)),
        }
    }

    async fn reset_backend(&self) -> Result<Value, BackendError> {
        let text = self.client.post(RESET_PATH, None, None).await?;
        Ok(parse_json(&text)?)
    }
}

/// Parse a success body as JSON; an empty body reads as `null`.
fn parse_json(text: &str) -> Result<Value, BackendApiError> {
    if text.is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(text).map_err(|e| BackendApiError::JsonParse(e.to_string()))
}
