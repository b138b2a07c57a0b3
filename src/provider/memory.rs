//! In-memory log store
//!
//! Keeps entries in an id-ordered map plus an expiry-ordered index so purge
//! cycles range-scan instead of walking the whole table. Suited to tests
//! and single-process deployments; larger installations plug a
//! database-backed `LogStore` into the same seam.

use crate::error::Result;
use crate::provider::{LogStore, StoreInfo};
use crate::types::{LogEntry, NewLogEntry, QueryFilter};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// Configuration for the in-memory store
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Maximum entries held before the oldest are evicted
    pub max_entries: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: 100_000,
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    /// Entries ordered by id (ascending id == ascending timestamp)
    entries: BTreeMap<u64, LogEntry>,
    /// Expiry index: (expires_at, id) → presence
    by_expiry: BTreeSet<(DateTime<Utc>, u64)>,
    next_id: u64,
    total_appended: u64,
}

/// In-memory `LogStore` implementation
#[derive(Debug, Default)]
pub struct MemoryStore {
    config: MemoryConfig,
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a store with the given configuration
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(Inner::default()),
        }
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn append(&self, entry: NewLogEntry) -> Result<LogEntry> {
        let mut inner = self.inner.write().await;

        inner.next_id += 1;
        let id = inner.next_id;
        let timestamp = Utc::now();
        let expires_at = timestamp + Duration::days(i64::from(entry.retention_days));

        let entry = LogEntry {
            id,
            timestamp,
            level: entry.level,
            category: entry.category,
            operation_class: entry.operation_class,
            duration_ms: entry.duration_ms,
            message: entry.message,
            metadata: entry.metadata,
            environment: entry.environment,
            expires_at,
        };

        inner.by_expiry.insert((expires_at, id));
        inner.entries.insert(id, entry.clone());
        inner.total_appended += 1;

        while inner.entries.len() > self.config.max_entries {
            if let Some((evicted_id, evicted)) = inner.entries.pop_first() {
                inner.by_expiry.remove(&(evicted.expires_at, evicted_id));
                tracing::warn!(id = evicted_id, "Evicted oldest entry at capacity");
            }
        }

        Ok(entry)
    }

    async fn query(
        &self,
        filter: &QueryFilter,
        before_id: Option<u64>,
        limit: usize,
    ) -> Result<Vec<LogEntry>> {
        let inner = self.inner.read().await;

        let upper = before_id.unwrap_or(u64::MAX);
        let results = inner
            .entries
            .range(..upper)
            .rev()
            .filter(|(_, entry)| filter.matches(entry))
            .take(limit)
            .map(|(_, entry)| entry.clone())
            .collect();

        Ok(results)
    }

    async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<usize> {
        let mut inner = self.inner.write().await;

        let expired: Vec<(DateTime<Utc>, u64)> = inner
            .by_expiry
            .range(..=(as_of, u64::MAX))
            .copied()
            .collect();

        for (expires_at, id) in &expired {
            inner.entries.remove(id);
            inner.by_expiry.remove(&(*expires_at, *id));
        }

        if !expired.is_empty() {
            tracing::debug!(deleted = expired.len(), "Removed expired entries");
        }
        Ok(expired.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.entries.len())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let inner = self.inner.read().await;
        Ok(StoreInfo {
            store: "memory".to_string(),
            entries: inner.entries.len(),
            total_appended: inner.total_appended,
        })
    }

    fn name(&self) -> &str {
        "memory"
    }
}
