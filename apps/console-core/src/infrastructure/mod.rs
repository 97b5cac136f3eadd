//! Infrastructure Layer
//!
//! Adapters for the ports defined in the application layer. The console has
//! one driven adapter family: the execution backend transport under
//! `backend/`.

pub mod backend;

pub use backend::{BackendConfig, HttpBackend, MockBackend, RetryConfig};
