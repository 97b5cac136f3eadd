//! Backend Port (Driven Port)
//!
//! Interface for talking to the remote order-execution backend.
//!
//! The port speaks raw `serde_json::Value` on purpose: the backend wraps
//! replies in several envelope shapes, and unwrapping them is the
//! normalizer's job, not the transport's. Adapters only move bytes and
//! classify transport failures.

use async_trait::async_trait;
use serde_json::Value;

/// Body of a metrics reply, either parsed JSON or opaque text.
///
/// A 200 with a non-JSON body is a valid metrics response (some backends
/// serve a text exposition format on the same path), so the transport hands
/// the body through undecoded instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricsPayload {
    /// Body parsed as JSON.
    Json(Value),
    /// Body kept as opaque text.
    Text(String),
}

/// Backend transport error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BackendError {
    /// The backend answered with a non-success status.
    #[error("Backend returned HTTP {status}: {message}")]
    Http {
        /// Status code of the final attempt.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// The request never produced an HTTP response.
    #[error("Backend unreachable: {message}")]
    Network {
        /// Transport error details.
        message: String,
    },

    /// The response body could not be decoded.
    #[error("Backend reply could not be decoded: {message}")]
    Decode {
        /// Decode error details.
        message: String,
    },
}

/// Port for backend interactions.
#[async_trait]
pub trait BackendPort: Send + Sync {
    /// Submit an order draft.
    ///
    /// The idempotency key travels as the `Idempotency-Key` header and must
    /// repeat on every transport retry of the same submission; that is what
    /// makes retrying the POST safe.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request fails at transport level
    /// or the reply body is not JSON.
    async fn submit_order(
        &self,
        body: &Value,
        idempotency_key: &str,
    ) -> Result<Value, BackendError>;

    /// Fetch the authoritative order collection.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request fails at transport level
    /// or the reply body is not JSON.
    async fn fetch_orders(&self) -> Result<Value, BackendError>;

    /// Fetch the backend metrics body.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] only for transport failures; any body that
    /// arrives with a success status is a valid [`MetricsPayload`].
    async fn fetch_metrics(&self) -> Result<MetricsPayload, BackendError>;

    /// Ask the backend to drop its state.
    ///
    /// # Errors
    ///
    /// Returns a [`BackendError`] when the request fails at transport level
    /// or the reply body is not JSON.
    async fn reset_backend(&self) -> Result<Value, BackendError>;
}
