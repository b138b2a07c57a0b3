//! Log store trait — the core abstraction for persistence backends
//!
//! All storage backends (in-memory, file-backed, database, etc.) implement
//! `LogStore` to provide a uniform API for append, query, and expiry
//! purging. The `AuditEngine` uses a store to perform all persistence.

use crate::error::Result;
use crate::types::{LogEntry, NewLogEntry, QueryFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub mod file;
pub mod memory;

/// Core trait for persistence backends
///
/// The store exclusively owns entries for their entire lifetime: it
/// assigns ids and timestamps at append, serves immutable snapshots to
/// queries, and is the only component that deletes.
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persist a governed entry, assigning the next monotonic id and the
    /// current timestamp, and deriving `expires_at` from the entry's
    /// pre-resolved retention window
    ///
    /// Atomic: on error nothing is written.
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry>;

    /// Fetch entries matching `filter`, newest first
    ///
    /// `before_id` restricts results to ids strictly below it (keyset
    /// pagination); `None` starts from the newest entry. Holds only a
    /// short-lived read lock — writers are never blocked for unbounded
    /// time.
    async fn query(
        &self,
        filter: &QueryFilter,
        before_id: Option<u64>,
        limit: usize,
    ) -> Result<Vec<LogEntry>>;

    /// Remove every entry with `expires_at <= as_of`, returning the count
    ///
    /// Idempotent: a second call with the same `as_of` deletes nothing.
    async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<usize>;

    /// Number of entries currently stored
    async fn count(&self) -> Result<usize>;

    /// Store status information
    async fn info(&self) -> Result<StoreInfo>;

    /// Backend name (e.g., "memory", "file")
    fn name(&self) -> &str;
}

/// Store status information
#[derive(Debug, Clone)]
pub struct StoreInfo {
    /// Backend name
    pub store: String,
    /// Entries currently stored
    pub entries: usize,
    /// Total entries ever appended (including purged/evicted)
    pub total_appended: u64,
}
