//! Background purge scheduler
//!
//! A single dedicated task wakes on a fixed interval and removes expired
//! entries from the store. A cycle that is still running when the next one
//! is due causes the new cycle to be skipped, never queued; a missed cycle
//! is simply caught by the next tick. Store failures are logged and
//! retried on the next tick rather than crashing the process.

use crate::metrics::EngineMetrics;
use crate::provider::LogStore;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Scheduler events for monitoring
#[derive(Debug, Clone)]
pub enum PurgeEvent {
    /// Scheduler started
    Started,
    /// Scheduler stopped
    Stopped,
    /// Cycle removed expired entries
    CycleCompleted {
        cycle_id: String,
        deleted: usize,
    },
    /// Cycle failed against the store
    CycleFailed {
        cycle_id: String,
        error: String,
    },
    /// Cycle exceeded its execution budget
    CycleTimedOut {
        cycle_id: String,
    },
    /// Cycle skipped because a previous one is still running
    CycleSkipped,
}

/// Result of a single purge cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Expired entries were removed
    Completed { deleted: usize },
    /// The store reported an error; retried on the next tick
    Failed { error: String },
    /// The cycle exceeded its execution budget and yielded
    TimedOut,
    /// A previous cycle was still running
    Skipped,
}

/// Configuration for the purge scheduler
#[derive(Debug, Clone)]
pub struct PurgeConfig {
    /// Time between cycles (daily matches the coarsest retention granularity)
    pub interval: Duration,
    /// Execution budget for a single cycle
    pub cycle_budget: Duration,
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(24 * 60 * 60),
            cycle_budget: Duration::from_secs(5 * 60),
        }
    }
}

/// Periodic purge of expired entries
#[derive(Clone)]
pub struct PurgeScheduler {
    store: Arc<dyn LogStore>,
    config: PurgeConfig,
    metrics: Option<Arc<EngineMetrics>>,
    event_tx: broadcast::Sender<PurgeEvent>,
    running: Arc<RwLock<bool>>,
    /// Non-reentrant cycle guard: overlap skips, never queues
    cycle_guard: Arc<Mutex<()>>,
}

impl PurgeScheduler {
    /// Create a scheduler over a store
    pub fn new(store: Arc<dyn LogStore>, config: PurgeConfig) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            store,
            config,
            metrics: None,
            event_tx,
            running: Arc::new(RwLock::new(false)),
            cycle_guard: Arc::new(Mutex::new(())),
        }
    }

    /// Record cycle outcomes into engine metrics
    pub fn with_metrics(mut self, metrics: Arc<EngineMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Subscribe to scheduler events
    pub fn subscribe(&self) -> broadcast::Receiver<PurgeEvent> {
        self.event_tx.subscribe()
    }

    /// Start the background task
    ///
    /// Idempotent — a second call while running is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            return;
        }
        *running = true;
        drop(running);

        let _ = self.event_tx.send(PurgeEvent::Started);
        tracing::info!(
            interval_secs = self.config.interval.as_secs(),
            "Purge scheduler started"
        );

        let scheduler = self.clone();
        tokio::spawn(async move {
            let mut ticker = interval(scheduler.config.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                if !*scheduler.running.read().await {
                    break;
                }

                scheduler.run_now().await;
            }

            let _ = scheduler.event_tx.send(PurgeEvent::Stopped);
            tracing::info!("Purge scheduler stopped");
        });
    }

    /// Stop the scheduler
    ///
    /// The background task exits at its next tick.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run a single purge cycle immediately
    ///
    /// Skipped (not queued) when another cycle is in flight.
    pub async fn run_now(&self) -> CycleOutcome {
        let _guard = match self.cycle_guard.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                tracing::warn!("Purge cycle skipped: previous cycle still running");
                let _ = self.event_tx.send(PurgeEvent::CycleSkipped);
                return CycleOutcome::Skipped;
            }
        };

        let cycle_id = uuid::Uuid::new_v4().to_string();
        let as_of = Utc::now();

        match tokio::time::timeout(self.config.cycle_budget, self.store.delete_expired(as_of))
            .await
        {
            Ok(Ok(deleted)) => {
                tracing::info!(cycle = %cycle_id, deleted, "Purge cycle completed");
                if let Some(metrics) = &self.metrics {
                    metrics.record_purge_cycle(deleted);
                }
                let _ = self.event_tx.send(PurgeEvent::CycleCompleted {
                    cycle_id,
                    deleted,
                });
                CycleOutcome::Completed { deleted }
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    cycle = %cycle_id,
                    error = %e,
                    "Purge cycle failed, retrying on next tick"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_purge_failure();
                }
                let error = e.to_string();
                let _ = self.event_tx.send(PurgeEvent::CycleFailed {
                    cycle_id,
                    error: error.clone(),
                });
                CycleOutcome::Failed { error }
            }
            Err(_) => {
                tracing::warn!(
                    cycle = %cycle_id,
                    budget_secs = self.config.cycle_budget.as_secs(),
                    "Purge cycle exceeded its budget, yielding until next tick"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_purge_failure();
                }
                let _ = self.event_tx.send(PurgeEvent::CycleTimedOut { cycle_id });
                CycleOutcome::TimedOut
            }
        }
    }
}
