//! Order entity and status lifecycle.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{IdempotencyKey, OrderId};

/// Order status in the backend lifecycle.
///
/// Transitions are forward-only: `Queued → Executing → Success | Failed`.
/// Terminal states are never revisited, neither by authoritative reads nor
/// by the synthetic ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Accepted by the backend, waiting for a worker.
    Queued,
    /// Picked up by a worker, execution in progress.
    Executing,
    /// Execution completed successfully.
    Success,
    /// Execution failed.
    Failed,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }

    /// Returns true if the order is still moving through the lifecycle.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Queued | Self::Executing)
    }

    /// Returns true if `next` is a legal forward move from this state.
    ///
    /// A queued order may settle directly when an intermediate state was
    /// never observed; terminal states accept nothing.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (*self, next),
            (Self::Queued, Self::Executing | Self::Success | Self::Failed)
                | (Self::Executing, Self::Success | Self::Failed)
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => write!(f, "QUEUED"),
            Self::Executing => write!(f, "EXECUTING"),
            Self::Success => write!(f, "SUCCESS"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

/// A mirrored order as the console knows it.
///
/// This is client-side state reconstructed from backend replies; the backend
/// owns the truth and every field here is last-known, not authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Backend-assigned identifier.
    pub id: OrderId,
    /// Asset being bought.
    pub base_token: String,
    /// Asset being paid with.
    pub quote_token: String,
    /// Order size, in units of the base token.
    pub amount: f64,
    /// Last known lifecycle state.
    pub status: OrderStatus,
    /// Time of the last known transition.
    pub timestamp: DateTime<Utc>,
    /// Deduplication token, present when the backend echoes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<IdempotencyKey>,
}

impl Order {
    /// Returns true if the order can no longer change state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Copy of this order moved to `status` at time `at`.
    #[must_use]
    pub fn with_status(&self, status: OrderStatus, at: DateTime<Utc>) -> Self {
        Self {
            status,
            timestamp: at,
            ..self.clone()
        }
    }
}

/// Client-side payload for a new order submission.
///
/// The backend assigns the id and the initial status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    /// Asset being bought.
    pub base_token: String,
    /// Asset being paid with.
    pub quote_token: String,
    /// Order size, in units of the base token.
    pub amount: f64,
}

impl OrderDraft {
    /// Create a draft buying `amount` of `base` priced in `quote`.
    #[must_use]
    pub fn new(base: impl Into<String>, quote: impl Into<String>, amount: f64) -> Self {
        Self {
            base_token: base.into(),
            quote_token: quote.into(),
            amount,
        }
    }
}
