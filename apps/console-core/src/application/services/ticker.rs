//! Synthetic tick driver.
//!
//! Spawns the two interval tasks that animate the mirror between
//! authoritative reads: one walking order lifecycles, one walking the
//! metrics gauges. Both loops select on a shared `CancellationToken`, so
//! teardown disarms the timers before anything else happens; once
//! [`TickerHandle::shutdown`] returns, no further tick can commit.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::store::ConsoleStore;

/// Configuration for the tick driver.
#[derive(Debug, Clone, Copy)]
pub struct TickerConfig {
    /// Lifecycle tick interval (milliseconds).
    pub order_tick_ms: u64,
    /// Metrics tick interval (milliseconds).
    pub metrics_tick_ms: u64,
}

impl Default for TickerConfig {
    fn default() -> Self {
        Self {
            order_tick_ms: 2_500,
            metrics_tick_ms: 2_000,
        }
    }
}

/// Handle over the running tick tasks.
///
/// Dropping the handle without calling [`shutdown`](Self::shutdown) leaves
/// the tasks running until the runtime itself stops; orderly teardown goes
/// through `shutdown`.
pub struct TickerHandle {
    shutdown: CancellationToken,
    lifecycle: JoinHandle<()>,
    metrics: JoinHandle<()>,
}

impl TickerHandle {
    /// Disarm both tickers and wait for their loops to exit.
    ///
    /// A loop that died before cancellation (a panic in the task) is
    /// reported here rather than silently swallowed.
    pub async fn shutdown(self) {
        self.shutdown.cancel();
        if let Err(e) = self.lifecycle.await {
            tracing::error!(error = %e, "Lifecycle ticker task failed");
        }
        if let Err(e) = self.metrics.await {
            tracing::error!(error = %e, "Metrics ticker task failed");
        }
        tracing::info!("Tick driver stopped");
    }
}

/// Spawns and owns the synthetic tick tasks.
pub struct TickerService {
    config: TickerConfig,
    store: Arc<ConsoleStore>,
    shutdown: CancellationToken,
}

impl TickerService {
    /// Create a tick driver with default intervals.
    #[must_use]
    pub fn new(store: Arc<ConsoleStore>, shutdown: CancellationToken) -> Self {
        Self {
            config: TickerConfig::default(),
            store,
            shutdown,
        }
    }

    /// Create a tick driver with explicit intervals.
    #[must_use]
    pub const fn with_config(
        config: TickerConfig,
        store: Arc<ConsoleStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            shutdown,
        }
    }

    /// Start both tick tasks and return the handle that stops them.
    #[must_use]
    pub fn start(self) -> TickerHandle {
        tracing::info!(
            order_tick_ms = self.config.order_tick_ms,
            metrics_tick_ms = self.config.metrics_tick_ms,
            "Starting tick driver"
        );

        let lifecycle = spawn_lifecycle_loop(
            Arc::clone(&self.store),
            Duration::from_millis(self.config.order_tick_ms),
            self.shutdown.clone(),
        );
        let metrics = spawn_metrics_loop(
            Arc::clone(&self.store),
            Duration::from_millis(self.config.metrics_tick_ms),
            self.shutdown.clone(),
        );

        TickerHandle {
            shutdown: self.shutdown,
            lifecycle,
            metrics,
        }
    }
}

fn spawn_lifecycle_loop(
    store: Arc<ConsoleStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = task_rng();
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let changed = store.advance_lifecycle(&mut rng, Utc::now());
                    if changed > 0 {
                        tracing::debug!(changed, "Synthetic lifecycle tick");
                    }
                }
                () = shutdown.cancelled() => {
                    tracing::debug!("Lifecycle ticker shutting down");
                    break;
                }
            }
        }
    })
}

fn spawn_metrics_loop(
    store: Arc<ConsoleStore>,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = task_rng();
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let snapshot = store.advance_metrics(&mut rng);
                    tracing::trace!(
                        workers_active = snapshot.workers_active,
                        queue_depth = snapshot.queue_depth,
                        "Synthetic metrics tick"
                    );
                }
                () = shutdown.cancelled() => {
                    tracing::debug!("Metrics ticker shutting down");
                    break;
                }
            }
        }
    })
}

/// Per-task generator, seeded from the OS with a clock fallback.
fn task_rng() -> SmallRng {
    SmallRng::try_from_os_rng().unwrap_or_else(|_| {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map_or(0, |d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX));
        SmallRng::seed_from_u64(nanos)
    })
}
