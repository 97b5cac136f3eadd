//! Console Core Binary
//!
//! Runs the Periscope reconciliation core headless: syncs the client-side
//! mirror from the execution backend, starts the synthetic tick driver, and
//! re-runs the authoritative reads on an interval until shutdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin console-core
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `PERISCOPE_BACKEND_URL`: Backend base URL (unset: in-process demo backend)
//! - `PERISCOPE_HTTP_TIMEOUT_SECS`: Per-request timeout (default: 10)
//! - `PERISCOPE_ORDER_TICK_MS`: Lifecycle tick interval (default: 2500)
//! - `PERISCOPE_METRICS_TICK_MS`: Metrics tick interval (default: 2000)
//! - `PERISCOPE_REFRESH_SECS`: Authoritative refresh interval (default: 30)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;
use std::time::Duration;

use console_core::application::ports::BackendPort;
use console_core::application::services::{CommandGateway, TickerService};
use console_core::config::ConsoleConfig;
use console_core::domain::order::OrderDraft;
use console_core::infrastructure::backend::{BackendConfig, HttpBackend, MockBackend};
use console_core::store::ConsoleStore;
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Orders seeded in demo mode so the lifecycle tick has work to animate.
const DEMO_SEED_ORDERS: [(&str, &str, f64); 2] = [("ETH", "USDC", 1.5), ("BTC", "USDT", 0.25)];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting Periscope console core");

    let config = ConsoleConfig::from_env();
    log_config(&config);

    if let Some(url) = config.backend_url.clone() {
        let backend = create_http_backend(&config, &url)?;
        run(backend, &config).await
    } else {
        tracing::info!("No backend URL configured, running against the in-process demo backend");
        run(MockBackend::new(), &config).await
    }
}

/// Initialize the tracing subscriber with environment filter.
///
/// Uses a static directive string that is a compile-time constant guaranteed
/// to parse.
#[allow(clippy::expect_used)]
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(
                "console_core=info"
                    .parse()
                    .expect("static directive 'console_core=info' is valid"),
            ),
        )
        .init();
}

/// Log the parsed configuration.
fn log_config(config: &ConsoleConfig) {
    tracing::info!(
        mode = if config.is_demo() { "demo" } else { "live" },
        backend_url = config.backend_url.as_deref().unwrap_or("-"),
        http_timeout_secs = config.http_timeout_secs,
        order_tick_ms = config.order_tick_ms,
        metrics_tick_ms = config.metrics_tick_ms,
        refresh_secs = config.refresh_secs,
        "Configuration loaded"
    );
}

/// Create the HTTP backend adapter for a configured base URL.
fn create_http_backend(config: &ConsoleConfig, url: &str) -> anyhow::Result<HttpBackend> {
    let backend_config = BackendConfig::new(url).with_timeout(config.http_timeout());
    let backend = HttpBackend::new(&backend_config)?;

    tracing::info!(base_url = url, "HTTP backend adapter initialized");

    Ok(backend)
}

/// Wire the store, gateway, and tick driver, then run until shutdown.
async fn run<B: BackendPort>(backend: B, config: &ConsoleConfig) -> anyhow::Result<()> {
    let store = Arc::new(ConsoleStore::new());
    let gateway = CommandGateway::with_arcs(Arc::new(backend), Arc::clone(&store));

    if config.is_demo() {
        seed_demo_orders(&gateway).await;
    }

    sync_from_backend(&gateway).await;

    let shutdown = CancellationToken::new();
    let ticker = TickerService::with_config(config.ticker_config(), store, shutdown.clone());
    let handle = ticker.start();

    tracing::info!("Console core ready");

    refresh_until_shutdown(&gateway, config.refresh_interval()).await;

    handle.shutdown().await;
    tracing::info!("Console core stopped");

    Ok(())
}

/// Seed a couple of orders through the gateway in demo mode.
async fn seed_demo_orders<B: BackendPort>(gateway: &CommandGateway<B>) {
    for (base, quote, amount) in DEMO_SEED_ORDERS {
        let draft = OrderDraft::new(base, quote, amount);
        match gateway.create_order(&draft).await {
            Ok(order) => {
                tracing::info!(order_id = %order.id, base, "Demo order seeded");
            }
            Err(e) => {
                tracing::warn!(error = %e, base, "Demo order seeding failed");
            }
        }
    }
}

/// Re-run the authoritative reads and log a one-line state summary.
async fn sync_from_backend<B: BackendPort>(gateway: &CommandGateway<B>) {
    let fetched = gateway.list_orders().await;
    let metrics = gateway.read_metrics().await;
    let store = gateway.store();

    tracing::info!(
        orders = store.len(),
        fetched = fetched.len(),
        health = %metrics.health_status,
        workers_active = metrics.workers_active,
        queue_depth = metrics.queue_depth,
        throughput = metrics.throughput,
        "Mirror synced"
    );
}

/// Refresh the mirror on an interval until a shutdown signal arrives.
async fn refresh_until_shutdown<B: BackendPort>(gateway: &CommandGateway<B>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The immediate first tick duplicates the startup sync; swallow it.
    interval.tick().await;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                sync_from_backend(gateway).await;
            }
            () = &mut shutdown => {
                break;
            }
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
///
/// # Panics
///
/// Panics if signal handlers cannot be installed, since the process could
/// not respond to termination signals without them.
#[allow(clippy::expect_used)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }
}
