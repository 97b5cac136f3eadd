//! Command gateway.
//!
//! Central entry point for operator commands, generic over the backend
//! port. Every operation pairs one transport call with normalization and a
//! store commit, and the error policy is asymmetric on purpose: writes are
//! strict because the operator must know a submission failed, reads degrade
//! because a flaky poll must never blank the console.

use std::sync::Arc;

use serde_json::{Value, json};

use crate::application::ports::{BackendError, BackendPort};
use crate::domain::{IdempotencyKey, MetricsSnapshot, Order, OrderDraft};
use crate::normalize::{self, NormalizeError};
use crate::store::ConsoleStore;

// ============================================
// Errors and outcomes
// ============================================

/// Errors from order creation, the one strict operation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CreateOrderError {
    /// The backend reply failed strict validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] NormalizeError),

    /// The submission failed at transport level.
    #[error("Backend request failed: {0}")]
    Backend(#[from] BackendError),
}

/// Outcome of a state reset request. Never an error; an unconfirmed reset
/// reports `success: false` with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetOutcome {
    /// Whether the backend confirmed the reset.
    pub success: bool,
    /// Human-readable outcome description.
    pub message: String,
}

// ============================================
// CommandGateway
// ============================================

/// Central gateway for operator commands.
///
/// Generic over the backend port so the HTTP adapter and the in-process
/// demo backend drive identical reconciliation logic. The gateway owns a
/// handle to the store it commits into; the embedding shell reads state
/// back through the same store.
#[derive(Clone)]
pub struct CommandGateway<B: BackendPort> {
    /// Backend transport.
    backend: Arc<B>,
    /// Commits from all four operations land here.
    store: Arc<ConsoleStore>,
}

impl<B: BackendPort> CommandGateway<B> {
    /// Create a gateway over a backend and a fresh store.
    #[must_use]
    pub fn new(backend: B, store: ConsoleStore) -> Self {
        Self {
            backend: Arc::new(backend),
            store: Arc::new(store),
        }
    }

    /// Create a gateway from pre-wrapped handles.
    ///
    /// Useful when the binary retains the store for the tick driver.
    #[must_use]
    pub const fn with_arcs(backend: Arc<B>, store: Arc<ConsoleStore>) -> Self {
        Self { backend, store }
    }

    /// Handle to the reconciliation store.
    #[must_use]
    pub fn store(&self) -> Arc<ConsoleStore> {
        Arc::clone(&self.store)
    }

    /// Submit a new order. Strict: any failure surfaces to the caller and
    /// the store is left untouched.
    ///
    /// Generates one fresh idempotency key per invocation and sends it both
    /// as the `Idempotency-Key` header and inside the body. The normalized
    /// reply is committed as an optimistic prepend; if the backend did not
    /// echo the key, it is stamped onto the order so the caller can always
    /// correlate.
    ///
    /// # Errors
    ///
    /// [`CreateOrderError::Backend`] when the submission fails at transport
    /// level; [`CreateOrderError::Validation`] when the reply fails strict
    /// normalization.
    pub async fn create_order(&self, draft: &OrderDraft) -> Result<Order, CreateOrderError> {
        let key = IdempotencyKey::generate();
        let body = json!({
            "baseToken": draft.base_token,
            "quoteToken": draft.quote_token,
            "amount": draft.amount,
            "idempotencyKey": key.as_str(),
        });

        tracing::info!(
            base_token = %draft.base_token,
            quote_token = %draft.quote_token,
            amount = draft.amount,
            idempotency_key = %key,
            "Submitting order"
        );

        let reply = match self.backend.submit_order(&body, key.as_str()).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(idempotency_key = %key, error = %e, "Order submission failed");
                return Err(CreateOrderError::Backend(e));
            }
        };

        let mut order = match normalize::normalize_order(&reply) {
            Ok(order) => order,
            Err(e) => {
                tracing::error!(
                    idempotency_key = %key,
                    error = %e,
                    "Order reply failed validation, nothing committed"
                );
                return Err(CreateOrderError::Validation(e));
            }
        };

        if order.idempotency_key.is_none() {
            order.idempotency_key = Some(key);
        }

        self.store.insert_order(order.clone());
        tracing::info!(order_id = %order.id, status = %order.status, "Order admitted to mirror");
        Ok(order)
    }

    /// Fetch the authoritative order collection. Best-effort: a failed read
    /// logs, returns empty, and leaves the mirror on its last good state.
    ///
    /// A non-empty result replaces the mirrored collection wholesale,
    /// overriding any synthetic drift accumulated since the previous read.
    /// An empty result is returned but never committed: a 200 whose body
    /// degraded to nothing is indistinguishable from a genuinely empty
    /// book, and the only operation allowed to blank the mirror is a
    /// confirmed reset.
    pub async fn list_orders(&self) -> Vec<Order> {
        match self.backend.fetch_orders().await {
            Ok(reply) => {
                let orders = normalize::normalize_orders(&reply);
                if orders.is_empty() {
                    tracing::debug!("Order list reply had no entries, keeping last known mirror");
                } else {
                    tracing::info!(count = orders.len(), "Order list synchronized");
                    self.store.replace_orders(orders.clone());
                }
                orders
            }
            Err(e) => {
                tracing::warn!(error = %e, "Order list fetch failed, keeping last known mirror");
                Vec::new()
            }
        }
    }

    /// Fetch backend metrics. Best-effort: a transport failure degrades to
    /// the degraded-health snapshot, which is also committed so the mirror
    /// reflects the outage. A reply that arrives but has a strange shape is
    /// not an outage; the normalizer maps it to the healthy default.
    pub async fn read_metrics(&self) -> MetricsSnapshot {
        let snapshot = match self.backend.fetch_metrics().await {
            Ok(payload) => normalize::normalize_metrics(&payload),
            Err(e) => {
                tracing::warn!(error = %e, "Metrics fetch failed, marking health degraded");
                MetricsSnapshot::default_degraded()
            }
        };
        self.store.set_metrics(snapshot.clone());
        snapshot
    }

    /// Ask the backend to drop its state. Best-effort: never errors. The
    /// mirror is cleared only on a confirmed success so an unacknowledged
    /// reset cannot silently blank the console.
    pub async fn reset_state(&self) -> ResetOutcome {
        match self.backend.reset_backend().await {
            Ok(reply) => {
                let outcome = read_reset_reply(&reply);
                if outcome.success {
                    self.store.clear();
                    tracing::info!(message = %outcome.message, "Backend reset confirmed, mirror cleared");
                } else {
                    tracing::warn!(message = %outcome.message, "Backend reset not confirmed");
                }
                outcome
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend reset failed");
                ResetOutcome {
                    success: false,
                    message: e.to_string(),
                }
            }
        }
    }
}

/// Loose read of a reset reply: `success: true` or a `status` of
/// `"ok"`/`"success"` (case-insensitive) counts as confirmation; anything
/// else does not.
fn read_reset_reply(reply: &Value) -> ResetOutcome {
    let confirmed = reply
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false)
        || reply
            .get("status")
            .and_then(Value::as_str)
            .is_some_and(|s| s.eq_ignore_ascii_case("ok") || s.eq_ignore_ascii_case("success"));

    let message = reply.get("message").and_then(Value::as_str).map_or_else(
        || {
            if confirmed {
                "Backend state reset".to_string()
            } else {
                "Reset not confirmed by backend".to_string()
            }
        },
        ToString::to_string,
    );

    ResetOutcome {
        success: confirmed,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MetricsPayload;
    use crate::domain::{HealthStatus, OrderId, OrderStatus};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::sync::Mutex;

    /// Stub backend returning canned replies; `None` means the call fails
    /// at transport level.
    #[derive(Default)]
    struct StubBackend {
        submit_reply: Option<Value>,
        orders_reply: Option<Value>,
        metrics_reply: Option<MetricsPayload>,
        reset_reply: Option<Value>,
        seen_keys: Mutex<Vec<String>>,
    }

    fn refused() -> BackendError {
        BackendError::Network {
            message: "connection refused".to_string(),
        }
    }

    #[async_trait]
    impl BackendPort for StubBackend {
        async fn submit_order(
            &self,
            _body: &Value,
            idempotency_key: &str,
        ) -> Result<Value, BackendError> {
            if let Ok(mut keys) = self.seen_keys.lock() {
                keys.push(idempotency_key.to_string());
            }
            self.submit_reply.clone().ok_or_else(refused)
        }

        async fn fetch_orders(&self) -> Result<Value, BackendError> {
            self.orders_reply.clone().ok_or_else(refused)
        }

        async fn fetch_metrics(&self) -> Result<MetricsPayload, BackendError> {
            self.metrics_reply.clone().ok_or_else(refused)
        }

        async fn reset_backend(&self) -> Result<Value, BackendError> {
            self.reset_reply.clone().ok_or_else(refused)
        }
    }

    fn order_body(id: &str) -> Value {
        json!({
            "id": id,
            "baseToken": "ETH",
            "quoteToken": "USDC",
            "amount": 1.5,
            "status": "QUEUED",
            "timestamp": "2026-03-01T12:00:00Z"
        })
    }

    fn draft() -> OrderDraft {
        OrderDraft::new("ETH", "USDC", 1.5)
    }

    fn make_gateway(stub: StubBackend) -> CommandGateway<StubBackend> {
        CommandGateway::new(stub, ConsoleStore::new())
    }

    // ------------------------------------------------------------------
    // create_order
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn create_unwraps_order_envelope_and_prepends() {
        let gateway = make_gateway(StubBackend {
            submit_reply: Some(json!({"order": order_body("ord-1")})),
            ..StubBackend::default()
        });

        let order = match gateway.create_order(&draft()).await {
            Ok(o) => o,
            Err(e) => panic!("create_order should succeed: {e}"),
        };
        assert_eq!(order.id.as_str(), "ord-1");
        assert_eq!(order.status, OrderStatus::Queued);

        let store = gateway.store();
        assert_eq!(store.len(), 1);
        assert_eq!(store.orders()[0].id.as_str(), "ord-1");
    }

    #[tokio::test]
    async fn create_stamps_key_when_backend_omits_it() {
        let gateway = make_gateway(StubBackend {
            submit_reply: Some(order_body("ord-1")),
            ..StubBackend::default()
        });

        let order = gateway.create_order(&draft()).await.unwrap();
        assert!(order.idempotency_key.is_some());
    }

    #[tokio::test]
    async fn create_keeps_echoed_key_verbatim() {
        let mut body = order_body("ord-1");
        body["idempotencyKey"] = json!("echoed-key");
        let gateway = make_gateway(StubBackend {
            submit_reply: Some(body),
            ..StubBackend::default()
        });

        let order = gateway.create_order(&draft()).await.unwrap();
        assert_eq!(order.idempotency_key.unwrap().as_str(), "echoed-key");
    }

    #[tokio::test]
    async fn create_uses_a_fresh_key_per_invocation() {
        let gateway = make_gateway(StubBackend {
            submit_reply: Some(order_body("ord-1")),
            ..StubBackend::default()
        });

        gateway.create_order(&draft()).await.unwrap();
        gateway.create_order(&draft()).await.unwrap();

        let keys = gateway.backend.seen_keys.lock().unwrap().clone();
        assert_eq!(keys.len(), 2);
        assert_ne!(keys[0], keys[1]);
    }

    #[tokio::test]
    async fn create_validation_failure_names_field_and_commits_nothing() {
        let mut body = order_body("ord-1");
        body.as_object_mut().unwrap().remove("status");
        let gateway = make_gateway(StubBackend {
            submit_reply: Some(body),
            ..StubBackend::default()
        });

        let Err(e) = gateway.create_order(&draft()).await else {
            panic!("reply without status must fail validation");
        };
        let CreateOrderError::Validation(inner) = e else {
            panic!("expected validation error, got: {e}");
        };
        assert_eq!(inner.field(), "status");
        assert!(gateway.store().is_empty());
    }

    #[tokio::test]
    async fn create_transport_failure_is_strict() {
        let gateway = make_gateway(StubBackend::default());

        let Err(e) = gateway.create_order(&draft()).await else {
            panic!("transport failure must surface");
        };
        assert!(matches!(e, CreateOrderError::Backend(_)));
        assert!(gateway.store().is_empty());
    }

    // ------------------------------------------------------------------
    // list_orders
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn list_unwraps_data_envelope_and_replaces_store() {
        let gateway = make_gateway(StubBackend {
            orders_reply: Some(json!({"data": [order_body("ord-2"), order_body("ord-1")]})),
            ..StubBackend::default()
        });
        gateway.store().insert_order(Order {
            id: OrderId::new("stale"),
            base_token: "BTC".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Queued,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        let orders = gateway.list_orders().await;
        assert_eq!(orders.len(), 2);

        let store = gateway.store();
        assert_eq!(store.len(), 2);
        assert!(store.order(&OrderId::new("stale")).is_none());
    }

    #[tokio::test]
    async fn list_failure_returns_empty_and_keeps_mirror() {
        let gateway = make_gateway(StubBackend::default());
        gateway.store().insert_order(Order {
            id: OrderId::new("ord-1"),
            base_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Executing,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        let orders = gateway.list_orders().await;
        assert!(orders.is_empty());
        assert_eq!(gateway.store().len(), 1);
    }

    #[tokio::test]
    async fn list_non_list_payload_degrades_to_empty_and_keeps_mirror() {
        let gateway = make_gateway(StubBackend {
            orders_reply: Some(json!({"count": 0})),
            ..StubBackend::default()
        });
        gateway.store().insert_order(Order {
            id: OrderId::new("ord-1"),
            base_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Executing,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        // A 200 whose body has no recognizable list must not blank the
        // last good mirror.
        assert!(gateway.list_orders().await.is_empty());
        assert_eq!(gateway.store().len(), 1);
    }

    #[tokio::test]
    async fn list_empty_reply_keeps_mirror() {
        let gateway = make_gateway(StubBackend {
            orders_reply: Some(json!({"orders": []})),
            ..StubBackend::default()
        });
        gateway.store().insert_order(Order {
            id: OrderId::new("ord-1"),
            base_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Queued,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        assert!(gateway.list_orders().await.is_empty());
        assert_eq!(gateway.store().len(), 1);
    }

    // ------------------------------------------------------------------
    // read_metrics
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn metrics_array_reply_defaults_healthy() {
        let gateway = make_gateway(StubBackend {
            metrics_reply: Some(MetricsPayload::Json(json!([1, 2, 3]))),
            ..StubBackend::default()
        });

        let snapshot = gateway.read_metrics().await;
        assert_eq!(snapshot, MetricsSnapshot::default_healthy());
        assert_eq!(gateway.store().metrics(), snapshot);
    }

    #[tokio::test]
    async fn metrics_transport_failure_degrades_and_commits() {
        let gateway = make_gateway(StubBackend::default());

        let snapshot = gateway.read_metrics().await;
        assert_eq!(snapshot.health_status, HealthStatus::Degraded);
        assert_eq!(
            gateway.store().metrics().health_status,
            HealthStatus::Degraded
        );
    }

    #[tokio::test]
    async fn metrics_object_reply_is_committed() {
        let gateway = make_gateway(StubBackend {
            metrics_reply: Some(MetricsPayload::Json(json!({
                "workersActive": 8,
                "maxWorkers": 32,
                "queueDepth": 42,
                "throughput": 11.0,
                "healthStatus": "healthy"
            }))),
            ..StubBackend::default()
        });

        let snapshot = gateway.read_metrics().await;
        assert_eq!(snapshot.workers_active, 8);
        assert_eq!(gateway.store().metrics().queue_depth, 42);
    }

    // ------------------------------------------------------------------
    // reset_state
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn reset_confirmed_clears_mirror() {
        let gateway = make_gateway(StubBackend {
            reset_reply: Some(json!({"success": true, "message": "wiped"})),
            ..StubBackend::default()
        });
        gateway.store().insert_order(Order {
            id: OrderId::new("ord-1"),
            base_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Queued,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        let outcome = gateway.reset_state().await;
        assert!(outcome.success);
        assert_eq!(outcome.message, "wiped");
        assert!(gateway.store().is_empty());
    }

    #[tokio::test]
    async fn reset_accepts_status_ok_confirmation() {
        let gateway = make_gateway(StubBackend {
            reset_reply: Some(json!({"status": "OK"})),
            ..StubBackend::default()
        });

        assert!(gateway.reset_state().await.success);
    }

    #[tokio::test]
    async fn reset_unconfirmed_keeps_mirror() {
        let gateway = make_gateway(StubBackend {
            reset_reply: Some(json!({"success": false, "message": "busy"})),
            ..StubBackend::default()
        });
        gateway.store().insert_order(Order {
            id: OrderId::new("ord-1"),
            base_token: "ETH".to_string(),
            quote_token: "USDC".to_string(),
            amount: 1.0,
            status: OrderStatus::Queued,
            timestamp: Utc::now(),
            idempotency_key: None,
        });

        let outcome = gateway.reset_state().await;
        assert!(!outcome.success);
        assert_eq!(outcome.message, "busy");
        assert_eq!(gateway.store().len(), 1);
    }

    #[tokio::test]
    async fn reset_transport_failure_reports_not_confirmed() {
        let gateway = make_gateway(StubBackend::default());

        let outcome = gateway.reset_state().await;
        assert!(!outcome.success);
        assert!(outcome.message.contains("unreachable"));
    }

    #[tokio::test]
    async fn reset_weird_shape_is_not_confirmation() {
        let gateway = make_gateway(StubBackend {
            reset_reply: Some(json!({"acknowledged": "maybe"})),
            ..StubBackend::default()
        });

        let outcome = gateway.reset_state().await;
        assert!(!outcome.success);
        assert!(!outcome.message.is_empty());
    }
}
