//! Application Ports (Driven)
//!
//! Ports define interfaces for interacting with external systems. The
//! console has a single driven port: the order-execution backend.

mod backend;

pub use backend::{BackendError, BackendPort, MetricsPayload};
