//! Backend health and capacity snapshot.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Reported backend health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Backend answering normally.
    Healthy,
    /// Backend impaired, or the last metrics read failed at transport level.
    Degraded,
    /// Backend reported itself down.
    Down,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Down => write!(f, "down"),
        }
    }
}

/// Point-in-time snapshot of backend worker and queue gauges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Workers currently executing orders.
    pub workers_active: u32,
    /// Worker pool capacity, stable for a session.
    pub max_workers: u32,
    /// Orders waiting for a worker.
    pub queue_depth: u32,
    /// Recent execution throughput, orders per second.
    pub throughput: f64,
    /// Reported backend health.
    pub health_status: HealthStatus,
}

impl MetricsSnapshot {
    /// Worker pool capacity assumed when the backend has not told us one.
    pub const DEFAULT_MAX_WORKERS: u32 = 32;

    /// Conservative default: all gauges zero, health assumed good.
    ///
    /// Used when the backend answered but the payload had no usable shape;
    /// an odd reply is not an outage.
    #[must_use]
    pub const fn default_healthy() -> Self {
        Self {
            workers_active: 0,
            max_workers: Self::DEFAULT_MAX_WORKERS,
            queue_depth: 0,
            throughput: 0.0,
            health_status: HealthStatus::Healthy,
        }
    }

    /// Default reported when the metrics read itself failed.
    #[must_use]
    pub const fn default_degraded() -> Self {
        Self {
            workers_active: 0,
            max_workers: Self::DEFAULT_MAX_WORKERS,
            queue_depth: 0,
            throughput: 0.0,
            health_status: HealthStatus::Degraded,
        }
    }

    /// Returns true if the gauges respect their documented bounds.
    #[must_use]
    pub fn is_within_bounds(&self) -> bool {
        self.workers_active <= self.max_workers
            && self.throughput.is_finite()
            && self.throughput >= 0.0
    }
}

impl Default for MetricsSnapshot {
    fn default() -> Self {
        Self::default_healthy()
    }
}
