//! Core taxonomy and entry types for the governance engine
//!
//! Persisted types use camelCase JSON serialization for wire compatibility.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Severity level of an operational event
///
/// Ordered: `Debug < Info < Warning < Error < Critical`. The ordering is
/// load-bearing — admission compares levels against the `Warning` cutoff
/// and retention windows must be non-decreasing along it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Developer diagnostics
    Debug,
    /// Routine operational events
    Info,
    /// Degraded but handled conditions
    Warning,
    /// Failed operations
    Error,
    /// Events requiring immediate attention
    Critical,
}

impl Severity {
    /// All levels in ascending order
    pub const ALL: [Severity; 5] = [
        Severity::Debug,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
        Severity::Critical,
    ];

    /// Stable lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "debug",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Semantic category of an operational event
///
/// Unordered tags; extending the vocabulary is an additive variant change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// End-user initiated actions (high volume, low audit weight)
    UserAction,
    /// Actions taken by the system itself
    SystemAction,
    /// Security-relevant events (logins, permission changes, ...)
    Security,
    /// Business-critical operations (cash movements, settlements, ...)
    CriticalOperation,
    /// Latency/throughput measurements
    Performance,
}

impl Category {
    /// Whether this category bypasses the production noise-reduction rule
    ///
    /// Audit/compliance events must never be silently dropped, irrespective
    /// of their severity level.
    pub fn is_always_admitted(&self) -> bool {
        matches!(
            self,
            Category::Security | Category::SystemAction | Category::CriticalOperation
        )
    }

    /// Stable snake_case name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::UserAction => "user_action",
            Category::SystemAction => "system_action",
            Category::Security => "security",
            Category::CriticalOperation => "critical_operation",
            Category::Performance => "performance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Deployment environment an event was emitted from
///
/// Each environment needs its own retention policy row. `Staging` ships
/// without a canonical row — deployments using it must supply one, and the
/// retention lookup fails explicitly until they do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Stable lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse bucket used to pick a latency threshold
///
/// Distinct from severity — an operation class says what kind of work was
/// measured, not how bad the outcome was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationClass {
    /// Database round-trips
    Database,
    /// Outbound API calls
    Api,
    /// General business operations
    Operation,
}

impl OperationClass {
    /// Stable lowercase name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationClass::Database => "database",
            OperationClass::Api => "api",
            OperationClass::Operation => "operation",
        }
    }
}

impl fmt::Display for OperationClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A caller-constructed event, not yet admitted or persisted
///
/// Built by application modules and handed to the engine via `submit`.
/// The engine may raise `level` (performance classification) before the
/// admission decision; the candidate itself is never stored as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateEvent {
    /// Nominal severity assigned by the caller
    pub level: Severity,

    /// Semantic category
    pub category: Category,

    /// Environment the event was emitted from
    pub environment: Environment,

    /// Human-readable message
    pub message: String,

    /// Operation class for latency classification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_class: Option<OperationClass>,

    /// Measured duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Optional key-value metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl CandidateEvent {
    /// Create a new candidate event
    pub fn new(
        level: Severity,
        category: Category,
        environment: Environment,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            category,
            environment,
            message: message.into(),
            operation_class: None,
            duration_ms: None,
            metadata: HashMap::new(),
        }
    }

    /// Attach a measured duration for performance classification
    pub fn with_duration(mut self, class: OperationClass, duration_ms: u64) -> Self {
        self.operation_class = Some(class);
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Add a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A governed entry ready for persistence, minus the store-assigned fields
///
/// Produced by the engine after classification, admission, and retention
/// resolution. The store assigns `id` and `timestamp` under its write lock
/// and derives `expires_at` from `retention_days`.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub level: Severity,
    pub category: Category,
    pub environment: Environment,
    pub message: String,
    pub operation_class: Option<OperationClass>,
    pub duration_ms: Option<u64>,
    pub metadata: HashMap<String, String>,

    /// Pre-resolved retention window in days (always >= 1)
    pub retention_days: u32,
}

/// A persisted operational log entry
///
/// Owned exclusively by the store for its entire lifetime — created at
/// append, immutable afterwards, removed only by expiry purging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Store-assigned monotonically increasing id
    pub id: u64,

    /// Append time, assigned together with `id`
    pub timestamp: DateTime<Utc>,

    /// Effective severity (after any performance escalation)
    pub level: Severity,

    /// Semantic category
    pub category: Category,

    /// Operation class, when the event carried a measured duration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_class: Option<OperationClass>,

    /// Measured duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,

    /// Human-readable message
    pub message: String,

    /// Optional key-value metadata
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,

    /// Environment the event was emitted from
    pub environment: Environment,

    /// Instant the entry becomes eligible for purging
    pub expires_at: DateTime<Utc>,
}

/// Filter for querying persisted entries
///
/// An unset field matches everything. Time bounds are inclusive and apply
/// to the entry timestamp.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    /// Minimum severity (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_min: Option<Severity>,

    /// Exact category match
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,

    /// Earliest timestamp (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since: Option<DateTime<Utc>>,

    /// Latest timestamp (inclusive)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl QueryFilter {
    /// Match all entries
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to entries at or above a severity level
    pub fn level_min(mut self, level: Severity) -> Self {
        self.level_min = Some(level);
        self
    }

    /// Restrict to a single category
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restrict to entries at or after the given instant
    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Restrict to entries at or before the given instant
    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    /// Check whether an entry matches this filter
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(min) = self.level_min {
            if entry.level < min {
                return false;
            }
        }
        if let Some(category) = self.category {
            if entry.category != category {
                return false;
            }
        }
        if let Some(since) = self.since {
            if entry.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if entry.timestamp > until {
                return false;
            }
        }
        true
    }
}

/// Entry counts grouped by level and category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryCounts {
    /// Counts per severity level (keyed by the lowercase level name)
    pub levels: HashMap<String, u64>,

    /// Counts per category (keyed by the snake_case category name)
    pub categories: HashMap<String, u64>,

    /// Total entry count
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_entry(level: Severity, category: Category) -> LogEntry {
        let now = Utc::now();
        LogEntry {
            id: 1,
            timestamp: now,
            level,
            category,
            operation_class: None,
            duration_ms: None,
            message: "sample".to_string(),
            metadata: HashMap::new(),
            environment: Environment::Production,
            expires_at: now + Duration::days(7),
        }
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
        assert_eq!(Severity::ALL.len(), 5);

        let mut sorted = Severity::ALL;
        sorted.sort();
        assert_eq!(sorted, Severity::ALL);
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Warning).unwrap();
        assert_eq!(json, "\"warning\"");

        let parsed: Severity = serde_json::from_str("\"critical\"").unwrap();
        assert_eq!(parsed, Severity::Critical);
        assert_eq!(Severity::Critical.as_str(), "critical");
    }

    #[test]
    fn test_category_always_admitted() {
        assert!(Category::Security.is_always_admitted());
        assert!(Category::SystemAction.is_always_admitted());
        assert!(Category::CriticalOperation.is_always_admitted());
        assert!(!Category::UserAction.is_always_admitted());
        assert!(!Category::Performance.is_always_admitted());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&Category::CriticalOperation).unwrap();
        assert_eq!(json, "\"critical_operation\"");

        let parsed: Category = serde_json::from_str("\"user_action\"").unwrap();
        assert_eq!(parsed, Category::UserAction);
    }

    #[test]
    fn test_environment_serialization() {
        for environment in [
            Environment::Development,
            Environment::Staging,
            Environment::Production,
        ] {
            let json = serde_json::to_string(&environment).unwrap();
            let parsed: Environment = serde_json::from_str(&json).unwrap();
            assert_eq!(parsed, environment);
            assert_eq!(json, format!("\"{}\"", environment.as_str()));
        }
    }

    #[test]
    fn test_candidate_event_builder() {
        let candidate = CandidateEvent::new(
            Severity::Info,
            Category::UserAction,
            Environment::Production,
            "Fetched product list",
        )
        .with_duration(OperationClass::Api, 1200)
        .with_metadata("tenant", "acme")
        .with_metadata("endpoint", "/products");

        assert_eq!(candidate.level, Severity::Info);
        assert_eq!(candidate.operation_class, Some(OperationClass::Api));
        assert_eq!(candidate.duration_ms, Some(1200));
        assert_eq!(candidate.metadata.len(), 2);
        assert_eq!(candidate.metadata["tenant"], "acme");
    }

    #[test]
    fn test_candidate_event_serialization_skips_empty_fields() {
        let candidate = CandidateEvent::new(
            Severity::Info,
            Category::UserAction,
            Environment::Development,
            "No extras",
        );

        let json = serde_json::to_string(&candidate).unwrap();
        assert!(!json.contains("operationClass"));
        assert!(!json.contains("durationMs"));
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_log_entry_serialization_roundtrip() {
        let mut entry = sample_entry(Severity::Warning, Category::Security);
        entry.operation_class = Some(OperationClass::Database);
        entry.duration_ms = Some(140);
        entry
            .metadata
            .insert("tenant".to_string(), "acme".to_string());

        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"operationClass\":\"database\""));
        assert!(json.contains("\"expiresAt\""));
        assert!(json.contains("\"level\":\"warning\""));

        let parsed: LogEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_query_filter_level_min() {
        let filter = QueryFilter::all().level_min(Severity::Warning);

        assert!(!filter.matches(&sample_entry(Severity::Info, Category::UserAction)));
        assert!(filter.matches(&sample_entry(Severity::Warning, Category::UserAction)));
        assert!(filter.matches(&sample_entry(Severity::Critical, Category::UserAction)));
    }

    #[test]
    fn test_query_filter_category() {
        let filter = QueryFilter::all().category(Category::Security);

        assert!(filter.matches(&sample_entry(Severity::Info, Category::Security)));
        assert!(!filter.matches(&sample_entry(Severity::Info, Category::UserAction)));
    }

    #[test]
    fn test_query_filter_time_range() {
        let entry = sample_entry(Severity::Info, Category::UserAction);

        let filter = QueryFilter::all().since(entry.timestamp - Duration::minutes(1));
        assert!(filter.matches(&entry));

        let filter = QueryFilter::all().since(entry.timestamp + Duration::minutes(1));
        assert!(!filter.matches(&entry));

        let filter = QueryFilter::all().until(entry.timestamp + Duration::minutes(1));
        assert!(filter.matches(&entry));

        let filter = QueryFilter::all().until(entry.timestamp - Duration::minutes(1));
        assert!(!filter.matches(&entry));
    }

    #[test]
    fn test_query_filter_combined() {
        let filter = QueryFilter::all()
            .level_min(Severity::Warning)
            .category(Category::Security);

        assert!(filter.matches(&sample_entry(Severity::Error, Category::Security)));
        assert!(!filter.matches(&sample_entry(Severity::Info, Category::Security)));
        assert!(!filter.matches(&sample_entry(Severity::Error, Category::UserAction)));
    }

    #[test]
    fn test_entry_counts_default() {
        let counts = EntryCounts::default();
        assert_eq!(counts.total, 0);
        assert!(counts.levels.is_empty());
        assert!(counts.categories.is_empty());
    }
}
