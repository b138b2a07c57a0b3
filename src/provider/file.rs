//! File-backed log store
//!
//! Write-through JSON snapshot persistence over the same in-memory indexes
//! as the memory store. Atomic writes via temp file + rename to prevent
//! corruption. Suited to modest volumes where entries must survive process
//! restarts without a database.

use crate::error::{AuditError, Result};
use crate::provider::{LogStore, StoreInfo};
use crate::types::{LogEntry, NewLogEntry, QueryFilter};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Inner {
    entries: BTreeMap<u64, LogEntry>,
    by_expiry: BTreeSet<(DateTime<Utc>, u64)>,
    next_id: u64,
    total_appended: u64,
}

/// On-disk snapshot shape
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileSnapshot {
    next_id: u64,
    total_appended: u64,
    entries: Vec<LogEntry>,
}

/// File-backed `LogStore` implementation
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    inner: RwLock<Inner>,
}

impl FileStore {
    /// Open a store at the given path, loading any existing snapshot
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut inner = Inner::default();

        if path.exists() {
            let json = std::fs::read_to_string(&path).map_err(|e| {
                AuditError::Config(format!(
                    "Failed to read log store file {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let snapshot: FileSnapshot = serde_json::from_str(&json).map_err(|e| {
                AuditError::Config(format!(
                    "Failed to parse log store file {}: {}",
                    path.display(),
                    e
                ))
            })?;

            inner.next_id = snapshot.next_id;
            inner.total_appended = snapshot.total_appended;
            for entry in snapshot.entries {
                inner.by_expiry.insert((entry.expires_at, entry.id));
                inner.entries.insert(entry.id, entry);
            }
            tracing::debug!(
                path = %path.display(),
                entries = inner.entries.len(),
                "Log store loaded"
            );
        }

        Ok(Self {
            path,
            inner: RwLock::new(inner),
        })
    }

    /// Get the snapshot file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist the current state atomically (temp file + rename)
    fn save(&self, inner: &Inner) -> Result<()> {
        let snapshot = FileSnapshot {
            next_id: inner.next_id,
            total_appended: inner.total_appended,
            entries: inner.entries.values().cloned().collect(),
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp_path = self.path.with_extension("tmp");

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AuditError::StoreUnavailable(format!(
                    "Failed to create log store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        std::fs::write(&tmp_path, json).map_err(|e| {
            AuditError::StoreUnavailable(format!(
                "Failed to write log store file {}: {}",
                tmp_path.display(),
                e
            ))
        })?;

        std::fs::rename(&tmp_path, &self.path).map_err(|e| {
            AuditError::StoreUnavailable(format!(
                "Failed to rename log store file {} → {}: {}",
                tmp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::debug!(path = %self.path.display(), "Log store saved");
        Ok(())
    }
}

#[async_trait]
impl LogStore for FileStore {
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

        if let Err(e) = self.save(&inner) {
            // Roll back so the entry is not partially written
            inner.entries.remove(&id);
            inner.by_expiry.remove(&(expires_at, id));
            inner.next_id -= 1;
            inner.total_appended -= 1;
            return Err(e);
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

        let expired_keys: Vec<(DateTime<Utc>, u64)> = inner
            .by_expiry
            .range(..=(as_of, u64::MAX))
            .copied()
            .collect();

        if expired_keys.is_empty() {
            return Ok(0);
        }

        let mut removed = Vec::with_capacity(expired_keys.len());
        for (expires_at, id) in &expired_keys {
            if let Some(entry) = inner.entries.remove(id) {
                removed.push(entry);
            }
            inner.by_expiry.remove(&(*expires_at, *id));
        }

        if let Err(e) = self.save(&inner) {
            // Roll back the batch; the next cycle retries
            for entry in removed {
                inner.by_expiry.insert((entry.expires_at, entry.id));
                inner.entries.insert(entry.id, entry);
            }
            return Err(e);
        }

        tracing::debug!(deleted = expired_keys.len(), "Removed expired entries");
        Ok(expired_keys.len())
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.inner.read().await.entries.len())
    }

    async fn info(&self) -> Result<StoreInfo> {
        let inner = self.inner.read().await;
        Ok(StoreInfo {
            store: "file".to_string(),
            entries: inner.entries.len(),
            total_appended: inner.total_appended,
        })
    }

    fn name(&self) -> &str {
        "file"
    }
}
