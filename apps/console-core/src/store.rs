//! Client-side mirror of backend order and metrics state.
//!
//! [`ConsoleStore`] is the single mutation funnel: the gateway commits
//! normalized replies here, the tick driver commits synthetic drift here,
//! and every commit swaps whole snapshots under one write acquisition.
//! Readers get cloned snapshots and can never observe a half-applied
//! update.
//!
//! The store holds no timers and performs no I/O of its own; it goes inert
//! the moment its drivers stop.

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::domain::{MetricsSnapshot, Order, OrderId, OrderStatus};
use crate::simulation;

/// Mirrored state, guarded as one unit so cross-field commits stay atomic.
#[derive(Debug, Default)]
struct MirrorState {
    /// Newest first.
    orders: Vec<Order>,
    metrics: MetricsSnapshot,
}

/// Reconciliation store for mirrored orders and metrics.
#[derive(Debug, Default)]
pub struct ConsoleStore {
    state: RwLock<MirrorState>,
}

impl ConsoleStore {
    /// Create an empty store with the conservative healthy metrics default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Optimistically admit a freshly created order at the head of the
    /// collection. An order with the same id is replaced in place instead
    /// of duplicated.
    pub fn insert_order(&self, order: Order) {
        if let Ok(mut state) = self.state.write() {
            if let Some(existing) = state.orders.iter_mut().find(|o| o.id == order.id) {
                *existing = order;
            } else {
                state.orders.insert(0, order);
            }
        }
    }

    /// Authoritative wholesale replacement from a list read. Wins over any
    /// synthetic drift accumulated since the previous read.
    pub fn replace_orders(&self, orders: Vec<Order>) {
        if let Ok(mut state) = self.state.write() {
            state.orders = orders;
        }
    }

    /// Snapshot of the mirrored collection, newest first.
    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        self.state
            .read()
            .map(|s| s.orders.clone())
            .unwrap_or_default()
    }

    /// Look up a single mirrored order by id.
    #[must_use]
    pub fn order(&self, id: &OrderId) -> Option<Order> {
        self.state
            .read()
            .ok()
            .and_then(|s| s.orders.iter().find(|o| o.id == *id).cloned())
    }

    /// Number of mirrored orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.orders.len()).unwrap_or(0)
    }

    /// Whether the mirror holds no orders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the metrics snapshot from an authoritative read.
    pub fn set_metrics(&self, snapshot: MetricsSnapshot) {
        if let Ok(mut state) = self.state.write() {
            state.metrics = snapshot;
        }
    }

    /// Current metrics snapshot.
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.state
            .read()
            .map(|s| s.metrics.clone())
            .unwrap_or_default()
    }

    /// Merge one authoritative status event, forward-only.
    ///
    /// The transition applies only when the mirrored order permits it:
    /// terminal orders are never rewritten and backward moves are dropped.
    /// Unknown ids are ignored. Returns whether a change was committed.
    pub fn apply_transition(&self, id: &OrderId, next: OrderStatus, at: DateTime<Utc>) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        let Some(order) = state.orders.iter_mut().find(|o| o.id == *id) else {
            tracing::debug!(order_id = %id, "Transition for unknown order ignored");
            return false;
        };
        if !order.status.can_transition_to(next) {
            tracing::debug!(
                order_id = %id,
                current = %order.status,
                requested = %next,
                "Non-forward transition ignored"
            );
            return false;
        }
        order.status = next;
        order.timestamp = at;
        true
    }

    /// Run one synthetic lifecycle tick over the whole collection and
    /// commit the result as a single snapshot. Returns how many orders
    /// transitioned.
    pub fn advance_lifecycle<R: Rng>(&self, rng: &mut R, now: DateTime<Utc>) -> usize {
        if let Ok(mut state) = self.state.write() {
            let (next, changed) = simulation::advance_lifecycle(&state.orders, rng, now);
            state.orders = next;
            changed
        } else {
            0
        }
    }

    /// Run one synthetic metrics tick and commit the result. Returns the
    /// committed snapshot.
    pub fn advance_metrics<R: Rng>(&self, rng: &mut R) -> MetricsSnapshot {
        if let Ok(mut state) = self.state.write() {
            state.metrics = simulation::step_metrics(&state.metrics, rng);
            state.metrics.clone()
        } else {
            MetricsSnapshot::default_healthy()
        }
    }

    /// Drop every mirrored order and restore the healthy metrics default.
    /// One atomic commit, used after a confirmed backend reset.
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.write() {
            state.orders.clear();
            state.metrics = MetricsSnapshot::default_healthy();
        }
    }
}
