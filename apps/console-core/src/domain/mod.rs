//! Domain layer - the strict internal model the console mirrors.

/// Strongly-typed identifiers and idempotency token generation.
pub mod identifiers;

/// Backend health and capacity snapshot.
pub mod metrics;

/// Order entity and status lifecycle.
pub mod order;

pub use identifiers::{IdempotencyKey, OrderId};
pub use metrics::{HealthStatus, MetricsSnapshot};
pub use order::{Order, OrderDraft, OrderStatus};
