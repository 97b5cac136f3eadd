//! Synthetic drift rules for the mirrored state.
//!
//! Pure functions of previous state and an injected RNG; no I/O, no clock
//! reads, no globals. The store commits whatever these return, so seeded
//! generators make every branch reproducible under test.
//!
//! Between authoritative reads the console animates its mirror with these
//! rules; a real list or metrics reply always wins over anything produced
//! here.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::domain::{MetricsSnapshot, Order, OrderStatus};

/// Chance per tick that a queued order starts executing.
pub const P_QUEUED_TO_EXECUTING: f64 = 0.30;
/// Chance per tick that an executing order settles.
pub const P_EXECUTING_SETTLES: f64 = 0.25;
/// Chance that a settling order lands on success rather than failure.
pub const P_SETTLE_SUCCESS: f64 = 0.90;

/// Lower bound the worker gauge walks toward when capacity allows.
const WORKER_FLOOR: u32 = 4;
/// Largest single-step queue depth change.
const QUEUE_STEP: i64 = 2;
/// Largest single-step throughput change, in ops per interval.
const THROUGHPUT_JITTER: f64 = 1.5;

/// Advance every non-terminal order one synthetic tick.
///
/// Returns the new collection plus how many orders transitioned. Terminal
/// orders pass through untouched; transitioned orders are stamped with
/// `now`.
pub fn advance_lifecycle<R: Rng>(
    orders: &[Order],
    rng: &mut R,
    now: DateTime<Utc>,
) -> (Vec<Order>, usize) {
    let mut changed = 0;
    let next = orders
        .iter()
        .map(|order| match step_order(order, rng) {
            Some(status) => {
                changed += 1;
                order.with_status(status, now)
            }
            None => order.clone(),
        })
        .collect();
    (next, changed)
}

/// Roll one order forward, or `None` when it stays put this tick.
fn step_order<R: Rng>(order: &Order, rng: &mut R) -> Option<OrderStatus> {
    match order.status {
        OrderStatus::Queued if rng.random_bool(P_QUEUED_TO_EXECUTING) => {
            Some(OrderStatus::Executing)
        }
        OrderStatus::Executing if rng.random_bool(P_EXECUTING_SETTLES) => {
            if rng.random_bool(P_SETTLE_SUCCESS) {
                Some(OrderStatus::Success)
            } else {
                Some(OrderStatus::Failed)
            }
        }
        // terminal states and unlucky rolls
        _ => None,
    }
}

/// Walk the metrics gauges one synthetic tick.
///
/// Clamps first, randomizes second: out-of-range input is repaired before
/// the walk, so the output is in bounds even when the previous snapshot was
/// not. `health_status` passes through unchanged; only authoritative reads
/// move it.
pub fn step_metrics<R: Rng>(prev: &MetricsSnapshot, rng: &mut R) -> MetricsSnapshot {
    let max_workers = prev.max_workers;
    let floor = WORKER_FLOOR.min(max_workers);

    let workers_active = walk_gauge(prev.workers_active.min(max_workers), 1, rng)
        .clamp(floor, max_workers);
    let queue_depth = walk_gauge(prev.queue_depth, QUEUE_STEP, rng);

    let base = if prev.throughput.is_finite() {
        prev.throughput.max(0.0)
    } else {
        0.0
    };
    let throughput = (base + rng.random_range(-THROUGHPUT_JITTER..=THROUGHPUT_JITTER)).max(0.0);

    MetricsSnapshot {
        workers_active,
        max_workers,
        queue_depth,
        throughput,
        health_status: prev.health_status,
    }
}

/// Uniform step in `-step..=step`, floored at zero.
fn walk_gauge<R: Rng>(value: u32, step: i64, rng: &mut R) -> u32 {
    let next = (i64::from(value) + rng.random_range(-step..=step)).max(0);
    u32::try_from(next).unwrap_or(u32::MAX)
}
