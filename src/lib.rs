//! # ops-audit
//!
//! Operational log admission, retention, and audit governance for
//! multi-tenant back-office services.
//!
//! ## Overview
//!
//! `ops-audit` decides, for every emitted operational event, whether it is
//! worth persisting given the deployment environment and the event's
//! semantic category, how long it must be retained once persisted, and
//! whether a measured duration makes it a performance anomaly that must be
//! escalated regardless of its nominal severity. A background purge task
//! reclaims expired entries safely alongside live writes.
//!
//! ## Quick Start
//!
//! ```rust
//! use ops_audit::{AuditEngine, CandidateEvent, Category, Environment, QueryFilter, Severity};
//! use ops_audit::provider::memory::MemoryStore;
//!
//! # async fn example() -> ops_audit::Result<()> {
//! let engine = AuditEngine::new(MemoryStore::default());
//!
//! // Application modules submit fire-and-forget
//! engine.submit(CandidateEvent::new(
//!     Severity::Warning,
//!     Category::Security,
//!     Environment::Production,
//!     "Repeated login failures for tenant acme",
//! ));
//!
//! // Dashboards page through retained entries, newest first
//! let mut cursor = engine.query(QueryFilter::all().level_min(Severity::Warning));
//! let page = cursor.next_page().await?;
//! println!("{} entries", page.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Storage backends
//!
//! - **memory** — In-memory store for testing and single-process use
//! - **file** — JSON snapshot persistence for modest volumes
//!
//! Database-backed stores plug into the same `LogStore` seam.
//!
//! ## Architecture
//!
//! - **`should_admit`** — pure admission rules (environment, level, category)
//! - **`classify`** — latency-based severity escalation
//! - **`RetentionPolicy` / `PerformanceThresholds`** — policy tables as
//!   validated, atomically swappable data
//! - **`LogStore` trait** — append/query/purge abstraction over backends
//! - **`AuditEngine`** — the pipeline, query cursors, and policy accessors
//! - **`PurgeScheduler`** — periodic background reclamation of expired entries

pub mod admission;
pub mod classifier;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod policy;
pub mod provider;
pub mod purge;
pub mod types;

// Re-export core types
pub use admission::should_admit;
pub use classifier::classify;
pub use engine::{AuditEngine, QueryCursor};
pub use error::{AuditError, Result};
pub use metrics::{EngineMetrics, MetricsSnapshot};
pub use policy::{PerformanceThresholds, PolicyHandle, RetentionPolicy};
pub use provider::{LogStore, StoreInfo};
pub use purge::{CycleOutcome, PurgeConfig, PurgeEvent, PurgeScheduler};
pub use types::{
    CandidateEvent, Category, EntryCounts, Environment, LogEntry, NewLogEntry, OperationClass,
    QueryFilter, Severity,
};

// Re-export storage backends for convenience
pub use provider::file::FileStore;
pub use provider::memory::{MemoryConfig, MemoryStore};
