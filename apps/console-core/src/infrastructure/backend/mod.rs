//! Execution Backend Adapters
//!
//! Implementations of `BackendPort`:
//! - `HttpBackend`: the real thing, over HTTP with bounded retry
//! - `MockBackend`: in-process double for demo mode and tests

mod adapter;
mod config;
mod error;
mod http_client;
mod mock;

pub use adapter::HttpBackend;
pub use config::{BackendConfig, RetryConfig};
pub use error::BackendApiError;
pub use http_client::IDEMPOTENCY_KEY_HEADER;
pub use mock::MockBackend;
