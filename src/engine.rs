//! Governance engine built on pluggable log stores
//!
//! `AuditEngine` runs the full pipeline for each candidate event —
//! performance classification, admission, retention resolution, append —
//! and exposes the query and policy surfaces consumed by dashboards and
//! operational tooling.

use crate::admission::should_admit;
use crate::classifier::classify;
use crate::error::Result;
use crate::metrics::EngineMetrics;
use crate::policy::{PerformanceThresholds, PolicyHandle, RetentionPolicy};
use crate::provider::{LogStore, StoreInfo};
use crate::purge::{PurgeConfig, PurgeScheduler};
use crate::types::{CandidateEvent, EntryCounts, LogEntry, NewLogEntry, QueryFilter};
use chrono::{DateTime, Utc};
use futures::Stream;
use std::collections::VecDeque;
use std::sync::Arc;

const DEFAULT_PAGE_SIZE: usize = 100;

/// Operational log governance engine
///
/// Cheap to clone; all clones share the same store, policy tables, and
/// metrics. Thread-safe without external locking.
#[derive(Clone)]
pub struct AuditEngine {
    store: Arc<dyn LogStore>,
    policy: PolicyHandle,
    metrics: Arc<EngineMetrics>,
}

impl AuditEngine {
    /// Create an engine over a store with the canonical policy tables
    pub fn new(store: impl LogStore + 'static) -> Self {
        Self {
            store: Arc::new(store),
            policy: PolicyHandle::default(),
            metrics: Arc::new(EngineMetrics::default()),
        }
    }

    /// Create an engine with custom, validated policy tables
    pub fn with_policies(
        store: impl LogStore + 'static,
        retention: RetentionPolicy,
        thresholds: PerformanceThresholds,
    ) -> Result<Self> {
        Ok(Self {
            store: Arc::new(store),
            policy: PolicyHandle::new(retention, thresholds)?,
            metrics: Arc::new(EngineMetrics::default()),
        })
    }

    /// Get the store backend name
    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Run the governance pipeline for one candidate event
    ///
    /// Returns `Ok(None)` when the event was dropped by admission, or the
    /// persisted entry when it was admitted. The retention window is
    /// resolved before anything touches the store, so an unknown
    /// environment fails without a partial write.
    pub async fn process(&self, candidate: CandidateEvent) -> Result<Option<LogEntry>> {
        self.metrics.record_submitted();

        let thresholds = self.policy.thresholds().await;
        let level = classify(
            &thresholds,
            candidate.operation_class,
            candidate.duration_ms,
            candidate.level,
        );
        if level > candidate.level {
            self.metrics.record_escalated();
        }

        if !should_admit(candidate.environment, level, candidate.category) {
            self.metrics.record_dropped();
            tracing::debug!(
                level = %level,
                category = %candidate.category,
                environment = %candidate.environment,
                "Candidate dropped by admission"
            );
            return Ok(None);
        }

        let retention = self.policy.retention().await;
        let retention_days = match retention.retention_days(candidate.environment, level) {
            Ok(days) => days,
            Err(e) => {
                self.metrics.record_append_error();
                return Err(e);
            }
        };

        let entry = NewLogEntry {
            level,
            category: candidate.category,
            environment: candidate.environment,
            message: candidate.message,
            operation_class: candidate.operation_class,
            duration_ms: candidate.duration_ms,
            metadata: candidate.metadata,
            retention_days,
        };

        match self.store.append(entry).await {
            Ok(entry) => {
                self.metrics.record_admitted();
                Ok(Some(entry))
            }
            Err(e) => {
                self.metrics.record_append_error();
                Err(e)
            }
        }
    }

    /// Submit a candidate event, fire-and-forget
    ///
    /// The caller never learns the admit/drop decision; pipeline failures
    /// are logged as degraded-service signals for operators only.
    pub fn submit(&self, candidate: CandidateEvent) {
        let engine = self.clone();
        tokio::spawn(async move {
            if let Err(e) = engine.process(candidate).await {
                tracing::warn!(error = %e, "Failed to record submitted event");
            }
        });
    }

    /// Build a restartable cursor over entries matching `filter`
    pub fn query(&self, filter: QueryFilter) -> QueryCursor {
        QueryCursor::new(self.store.clone(), filter, DEFAULT_PAGE_SIZE)
    }

    /// Fetch the most recent entries, newest first
    pub async fn recent(&self, limit: usize) -> Result<Vec<LogEntry>> {
        self.store.query(&QueryFilter::all(), None, limit).await
    }

    /// Get entry counts by level and category over the newest `limit` entries
    pub async fn counts(&self, limit: usize) -> Result<EntryCounts> {
        let entries = self.store.query(&QueryFilter::all(), None, limit).await?;
        let mut counts = EntryCounts::default();

        for entry in &entries {
            *counts
                .levels
                .entry(entry.level.as_str().to_string())
                .or_insert(0) += 1;
            *counts
                .categories
                .entry(entry.category.as_str().to_string())
                .or_insert(0) += 1;
            counts.total += 1;
        }

        Ok(counts)
    }

    /// Current retention policy snapshot
    pub async fn retention_policy(&self) -> Arc<RetentionPolicy> {
        self.policy.retention().await
    }

    /// Current performance threshold snapshot
    pub async fn performance_thresholds(&self) -> Arc<PerformanceThresholds> {
        self.policy.thresholds().await
    }

    /// Validate and activate a new retention table
    ///
    /// On validation failure the previous table stays in effect.
    pub async fn replace_retention_policy(&self, table: RetentionPolicy) -> Result<()> {
        self.policy.replace_retention(table).await
    }

    /// Validate and activate a new threshold table
    pub async fn replace_performance_thresholds(
        &self,
        table: PerformanceThresholds,
    ) -> Result<()> {
        self.policy.replace_thresholds(table).await
    }

    /// Remove every entry expired as of the given instant
    pub async fn delete_expired(&self, as_of: DateTime<Utc>) -> Result<usize> {
        self.store.delete_expired(as_of).await
    }

    /// Build a purge scheduler wired to this engine's store and metrics
    pub fn purge_scheduler(&self, config: PurgeConfig) -> PurgeScheduler {
        PurgeScheduler::new(self.store.clone(), config).with_metrics(self.metrics.clone())
    }

    /// Engine metrics
    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    /// Store status information
    pub async fn info(&self) -> Result<StoreInfo> {
        self.store.info().await
    }
}

/// Restartable, lazily-paged view over stored entries, newest first
///
/// Pages are fetched with keyset pagination (entries strictly older than
/// the last one seen), so a cursor never re-serves an entry and holds no
/// lock between pages.
pub struct QueryCursor {
    store: Arc<dyn LogStore>,
    filter: QueryFilter,
    page_size: usize,
    before_id: Option<u64>,
    exhausted: bool,
}

impl QueryCursor {
    fn new(store: Arc<dyn LogStore>, filter: QueryFilter, page_size: usize) -> Self {
        Self {
            store,
            filter,
            page_size,
            before_id: None,
            exhausted: false,
        }
    }

    /// Override the page size (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetch the next page; empty once the cursor is exhausted
    pub async fn next_page(&mut self) -> Result<Vec<LogEntry>> {
        if self.exhausted {
            return Ok(Vec::new());
        }

        let page = self
            .store
            .query(&self.filter, self.before_id, self.page_size)
            .await?;

        if page.len() < self.page_size {
            self.exhausted = true;
        }
        if let Some(last) = page.last() {
            self.before_id = Some(last.id);
        }

        Ok(page)
    }

    /// Restart the cursor from the newest entry
    pub fn rewind(&mut self) {
        self.before_id = None;
        self.exhausted = false;
    }

    /// Adapt the cursor into an entry stream
    pub fn into_stream(self) -> impl Stream<Item = Result<LogEntry>> {
        futures::stream::unfold(
            (self, VecDeque::new()),
            |(mut cursor, mut buffered)| async move {
                if buffered.is_empty() {
                    if cursor.exhausted {
                        return None;
                    }
                    match cursor.next_page().await {
                        Ok(page) if page.is_empty() => return None,
                        Ok(page) => buffered.extend(page),
                        Err(e) => return Some((Err(e), (cursor, buffered))),
                    }
                }
                buffered
                    .pop_front()
                    .map(|entry| (Ok(entry), (cursor, buffered)))
            },
        )
    }
}
