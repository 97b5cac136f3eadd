//! Wire payload normalization.
//!
//! The execution backend wraps replies in several envelope shapes depending
//! on which code path answered: a bare entity, `{"order": ...}`,
//! `{"data": ...}`, a bare list, `{"orders": [...]}`. Every payload funnels
//! through this module; nothing downstream of it ever touches raw JSON.
//!
//! Unwrap precedence is fixed (direct entity, then the named wrapper, then
//! `data`) so a payload matching several shapes resolves deterministically.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::application::ports::MetricsPayload;
use crate::domain::{HealthStatus, IdempotencyKey, MetricsSnapshot, Order, OrderId, OrderStatus};

/// Validation failure while normalizing a backend payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// A required field is absent (or null).
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the absent field.
        field: &'static str,
    },

    /// A field is present with the wrong type or an invalid value.
    #[error("invalid field {field}: expected {expected}")]
    InvalidField {
        /// Name of the offending field.
        field: &'static str,
        /// What a valid value looks like.
        expected: &'static str,
    },
}

impl NormalizeError {
    /// Name of the field that failed validation.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } | Self::InvalidField { field, .. } => field,
        }
    }
}

/// Normalize a single-order reply into the strict model.
///
/// # Errors
///
/// Returns a [`NormalizeError`] naming the offending field when the payload
/// has no recognizable order shape or a required field fails validation.
pub fn normalize_order(value: &Value) -> Result<Order, NormalizeError> {
    order_from_object(unwrap_order_entity(value)?)
}

/// Normalize a list reply into strict orders.
///
/// Degrades instead of erroring: a payload with no recognizable list shape
/// yields an empty collection, and malformed elements are dropped rather
/// than poisoning the batch.
#[must_use]
pub fn normalize_orders(value: &Value) -> Vec<Order> {
    let Some(list) = unwrap_order_list(value) else {
        tracing::warn!("Order list payload had no recognizable list shape");
        return Vec::new();
    };

    let mut orders = Vec::with_capacity(list.len());
    for (index, item) in list.iter().enumerate() {
        match normalize_order(item) {
            Ok(order) => orders.push(order),
            Err(e) => {
                tracing::warn!(index, error = %e, "Dropping malformed order from list reply");
            }
        }
    }
    orders
}

/// Normalize a metrics reply. Never errors.
///
/// Opaque text bodies (an exposition format the console does not parse) and
/// JSON without an object shape both map to the conservative healthy
/// default. Within an object, each field is read independently so a single
/// wrong-typed value cannot poison the snapshot.
#[must_use]
pub fn normalize_metrics(payload: &MetricsPayload) -> MetricsSnapshot {
    match payload {
        MetricsPayload::Text(_) => MetricsSnapshot::default_healthy(),
        MetricsPayload::Json(value) => metrics_from_value(value),
    }
}

// ============================================================================
// Envelope unwrapping
// ============================================================================

/// Locate the order entity inside a single-order reply.
///
/// Precedence: the value itself (an object carrying `id`), then the
/// `order` wrapper, then the `data` wrapper.
fn unwrap_order_entity(value: &Value) -> Result<&Value, NormalizeError> {
    if value.get("id").is_some() {
        return Ok(value);
    }
    if let Some(inner) = value.get("order") {
        return Ok(inner);
    }
    if let Some(inner) = value.get("data") {
        return Ok(inner);
    }
    Err(NormalizeError::MissingField { field: "id" })
}

/// Locate the order list inside a list reply.
///
/// Precedence: the value itself, then a list under `orders`, then a list
/// under `data`. A wrapper key holding a non-list does not match and falls
/// through to the next rule.
fn unwrap_order_list(value: &Value) -> Option<&Vec<Value>> {
    if let Some(list) = value.as_array() {
        return Some(list);
    }
    if let Some(list) = value.get("orders").and_then(Value::as_array) {
        return Some(list);
    }
    value.get("data").and_then(Value::as_array)
}

// ============================================================================
// Field validation
// ============================================================================

fn order_from_object(value: &Value) -> Result<Order, NormalizeError> {
    Ok(Order {
        id: OrderId::new(require_symbol(value, "id")?),
        base_token: require_symbol(value, "baseToken")?.to_string(),
        quote_token: require_symbol(value, "quoteToken")?.to_string(),
        amount: require_amount(value)?,
        status: require_status(value)?,
        timestamp: read_timestamp(value),
        idempotency_key: value
            .get("idempotencyKey")
            .and_then(Value::as_str)
            .map(IdempotencyKey::new),
    })
}

fn require_string<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, NormalizeError> {
    match value.get(field) {
        None | Some(Value::Null) => Err(NormalizeError::MissingField { field }),
        Some(raw) => raw.as_str().ok_or(NormalizeError::InvalidField {
            field,
            expected: "string",
        }),
    }
}

/// Require a string field that also carries content. Ids and token symbols
/// are never legitimately blank on the wire.
fn require_symbol<'a>(value: &'a Value, field: &'static str) -> Result<&'a str, NormalizeError> {
    let raw = require_string(value, field)?;
    if raw.is_empty() {
        return Err(NormalizeError::InvalidField {
            field,
            expected: "non-empty string",
        });
    }
    Ok(raw)
}

fn require_amount(value: &Value) -> Result<f64, NormalizeError> {
    let raw = match value.get("amount") {
        None | Some(Value::Null) => return Err(NormalizeError::MissingField { field: "amount" }),
        Some(raw) => raw,
    };
    let amount = raw.as_f64().ok_or(NormalizeError::InvalidField {
        field: "amount",
        expected: "number",
    })?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(NormalizeError::InvalidField {
            field: "amount",
            expected: "positive finite number",
        });
    }
    Ok(amount)
}

fn require_status(value: &Value) -> Result<OrderStatus, NormalizeError> {
    match value.get("status") {
        None | Some(Value::Null) => Err(NormalizeError::MissingField { field: "status" }),
        Some(raw) => raw
            .as_str()
            .map(parse_status)
            .ok_or(NormalizeError::InvalidField {
                field: "status",
                expected: "string",
            }),
    }
}

/// Map a wire status string onto the lifecycle enum.
fn parse_status(raw: &str) -> OrderStatus {
    match raw.to_lowercase().as_str() {
        "executing" => OrderStatus::Executing,
        "success" => OrderStatus::Success,
        "failed" => OrderStatus::Failed,
        // queued and unrecognized values -> initial state
        _ => OrderStatus::Queued,
    }
}

/// Read the transition timestamp, tolerating RFC 3339 strings and epoch
/// milliseconds. Anything else means the transition time is unknown and the
/// mirror stamps the order as seen now.
fn read_timestamp(value: &Value) -> DateTime<Utc> {
    match value.get("timestamp") {
        Some(Value::String(raw)) => DateTime::parse_from_rfc3339(raw)
            .map_or_else(|_| Utc::now(), |dt| dt.with_timezone(&Utc)),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::from_timestamp_millis)
            .unwrap_or_else(Utc::now),
        _ => Utc::now(),
    }
}

// ============================================================================
// Metrics
// ============================================================================

fn metrics_from_value(value: &Value) -> MetricsSnapshot {
    let Some(object) = value.as_object() else {
        return MetricsSnapshot::default_healthy();
    };

    MetricsSnapshot {
        workers_active: read_gauge(object.get("workersActive"), 0),
        max_workers: read_gauge(
            object.get("maxWorkers"),
            MetricsSnapshot::DEFAULT_MAX_WORKERS,
        ),
        queue_depth: read_gauge(object.get("queueDepth"), 0),
        throughput: object
            .get("throughput")
            .and_then(Value::as_f64)
            .filter(|t| t.is_finite() && *t >= 0.0)
            .unwrap_or(0.0),
        health_status: read_health(object.get("healthStatus")),
    }
}

fn read_gauge(value: Option<&Value>, default: u32) -> u32 {
    value
        .and_then(Value::as_u64)
        .map_or(default, |v| u32::try_from(v).unwrap_or(u32::MAX))
}

fn read_health(value: Option<&Value>) -> HealthStatus {
    match value.and_then(Value::as_str).map(str::to_lowercase).as_deref() {
        Some("degraded") => HealthStatus::Degraded,
        Some("down") => HealthStatus::Down,
        // healthy and unrecognized values
        _ => HealthStatus::Healthy,
    }
}
