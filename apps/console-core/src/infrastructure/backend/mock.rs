//! In-process demo backend.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use crate::application::ports::{BackendError, BackendPort, MetricsPayload};

/// In-process `BackendPort` double for demo mode and tests.
///
/// Keeps its own order book, assigns sequential `ord-<n>` ids, replays
/// previously created orders on a repeated idempotency key, and answers
/// with the same envelope variety a real backend exhibits: `{"order": ...}`
/// on create, `{"orders": [...]}` on list, a flat object on metrics. Armed
/// failures let tests exercise the degradation paths without a socket.
#[derive(Debug, Default)]
pub struct MockBackend {
    state: RwLock<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    /// Wire entities, newest first.
    orders: Vec<Value>,
    /// Idempotency key to order id, for replay detection.
    seen_keys: HashMap<String, String>,
    next_id: u64,
    fail_next: u32,
}

impl MockBackend {
    /// Create an empty demo backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the next `n` calls (any operation) to fail with HTTP 503.
    pub fn fail_next(&self, n: u32) {
        if let Ok(mut state) = self.state.write() {
            state.fail_next = n;
        }
    }

    fn unavailable() -> BackendError {
        BackendError::Network {
            message: "mock state unavailable".to_string(),
        }
    }
}

/// Consume one armed failure, if any.
fn take_failure(state: &mut MockState) -> Option<BackendError> {
    if state.fail_next == 0 {
        return None;
    }
    state.fail_next -= 1;
    Some(BackendError::Http {
        status: 503,
        message: "injected failure".to_string(),
    })
}

#[async_trait]
impl BackendPort for MockBackend {
    async fn submit_order(
        &self,
        body: &Value,
        idempotency_key: &str,
    ) -> Result<Value, BackendError> {
        let Ok(mut state) = self.state.write() else {
            return Err(Self::unavailable());
        };
        if let Some(err) = take_failure(&mut state) {
            return Err(err);
        }

        // Replayed key answers with the original order, nothing new created.
        if let Some(id) = state.seen_keys.get(idempotency_key).cloned() {
            let existing = state
                .orders
                .iter()
                .find(|o| o.get("id").and_then(Value::as_str) == Some(id.as_str()))
                .cloned();
            if let Some(entity) = existing {
                return Ok(json!({ "order": entity }));
            }
        }

        let amount = body.get("amount").and_then(Value::as_f64).unwrap_or(0.0);
        if !amount.is_finite() || amount <= 0.0 {
            return Err(BackendError::Http {
                status: 422,
                message: "amount must be a positive number".to_string(),
            });
        }

        state.next_id += 1;
        let id = format!("ord-{}", state.next_id);
        let entity = json!({
            "id": id,
            "baseToken": body.get("baseToken").cloned().unwrap_or(Value::Null),
            "quoteToken": body.get("quoteToken").cloned().unwrap_or(Value::Null),
            "amount": amount,
            "status": "QUEUED",
            "timestamp": Utc::now().to_rfc3339(),
            "idempotencyKey": idempotency_key,
        });

        state.seen_keys.insert(idempotency_key.to_string(), id);
        state.orders.insert(0, entity.clone());

        Ok(json!({ "order": entity }))
    }

    async fn fetch_orders(&self) -> Result<Value, BackendError> {
        let Ok(mut state) = self.state.write() else {
            return Err(Self::unavailable());
        };
        if let Some(err) = take_failure(&mut state) {
            return Err(err);
        }

        Ok(json!({ "orders": state.orders.clone() }))
    }

    async fn fetch_metrics(&self) -> Result<MetricsPayload, BackendError> {
        let Ok(mut state) = self.state.write() else {
            return Err(Self::unavailable());
        };
        if let Some(err) = take_failure(&mut state) {
            return Err(err);
        }

        let queue_depth = state.orders.len() as u64 + 2;
        Ok(MetricsPayload::Json(json!({
            "workersActive": 8,
            "maxWorkers": 32,
            "queueDepth": queue_depth,
            "throughput": 12.5,
            "healthStatus": "healthy",
        })))
    }

    async fn reset_backend(&self) -> Result<Value, BackendError> {
        let Ok(mut state) = self.state.write() else {
            return Err(Self::unavailable());
        };
        if let Some(err) = take_failure(&mut state) {
            return Err(err);
        }

        state.orders.clear();
        state.seen_keys.clear();

        Ok(json!({
            "success": true,
            "message": "Backend state reset",
        }))
    }
}
