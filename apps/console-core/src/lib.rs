// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Console Core - Rust Core Library
//!
//! Client-side reconciliation core for the Periscope operator console.
//!
//! The console never owns order truth. The execution backend does. This crate
//! submits commands to the backend, normalizes its loosely-shaped JSON
//! replies into a strict internal model, and keeps a client-side mirror of
//! order and metrics state that synthetic ticks animate between
//! authoritative reads.
//!
//! # Architecture (Clean Architecture + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core model with no transport dependencies
//!   - `identifiers`: `OrderId`, `IdempotencyKey` and token generation
//!   - `order`: Order entity, status lifecycle, forward-only transitions
//!   - `metrics`: Backend health/capacity snapshot with bound invariants
//!
//! - **Application**: Orchestration over ports
//!   - `ports`: `BackendPort` interface for the execution backend
//!   - `services`: `CommandGateway` (strict writes, degrading reads) and
//!     `TickerService` (cancellable simulation tick loops)
//!
//! - **Infrastructure**: Adapters (implementations)
//!   - `backend`: HTTP adapter with bounded retry, plus an in-process
//!     demo backend
//!
//! Cross-cutting engine modules sit beside the layers: `normalize` (the
//! single wire→model chokepoint), `simulation` (pure tick rules), and
//! `store` (atomic snapshot state).

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core model with no transport dependencies.
pub mod domain;

/// Application layer - Gateway, tick driver, and port definitions.
pub mod application;

/// Infrastructure layer - Backend adapters.
pub mod infrastructure;

// =============================================================================
// Engine modules
// =============================================================================

/// Runtime configuration from environment variables.
pub mod config;

/// Wire payload normalization into the strict model.
pub mod normalize;

/// Pure synthetic tick rules for order lifecycle and metrics drift.
pub mod simulation;

/// Atomic snapshot store mirroring backend state.
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::identifiers::{IdempotencyKey, OrderId};
pub use domain::metrics::{HealthStatus, MetricsSnapshot};
pub use domain::order::{Order, OrderDraft, OrderStatus};

// Application re-exports
pub use application::ports::{BackendError, BackendPort, MetricsPayload};
pub use application::services::{
    CommandGateway, CreateOrderError, ResetOutcome, TickerConfig, TickerHandle, TickerService,
};

// Infrastructure re-exports
pub use infrastructure::backend::{BackendConfig, HttpBackend, MockBackend, RetryConfig};

// Engine re-exports
pub use config::ConsoleConfig;
pub use normalize::{NormalizeError, normalize_metrics, normalize_order, normalize_orders};
pub use store::ConsoleStore;
