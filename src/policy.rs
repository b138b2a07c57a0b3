//! Governance policy tables
//!
//! Retention windows and performance thresholds are plain data — mapping
//! structures loaded once at startup and replaced only as validated units.
//! New environments or operation classes are additive data changes, not
//! code changes.
//!
//! Concurrent readers take an `Arc` snapshot; replacement swaps the whole
//! table behind a lock so a reader never observes a partially-updated one.

use crate::error::{AuditError, Result};
use crate::types::{Environment, OperationClass, Severity};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-environment, per-level retention windows in days
///
/// Invariant: every environment row covers every severity level with a
/// positive window, and windows never decrease as severity increases — a
/// lower-severity entry must not outlive a higher-severity one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetentionPolicy {
    rows: HashMap<Environment, HashMap<Severity, u32>>,
}

impl RetentionPolicy {
    /// Build a validated policy from raw rows
    pub fn new(rows: HashMap<Environment, HashMap<Severity, u32>>) -> Result<Self> {
        let policy = Self { rows };
        policy.validate()?;
        Ok(policy)
    }

    /// Load and validate a policy from a JSON file
    ///
    /// Expected shape: `{"production": {"info": 7, "warning": 30, ...}, ...}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!(
                "Failed to read retention policy file {}: {}",
                path.display(),
                e
            ))
        })?;
        let policy: RetentionPolicy = serde_json::from_str(&json).map_err(|e| {
            AuditError::Config(format!(
                "Failed to parse retention policy file {}: {}",
                path.display(),
                e
            ))
        })?;
        policy.validate()?;
        Ok(policy)
    }

    /// Check the table invariants without activating it
    pub fn validate(&self) -> Result<()> {
        if self.rows.is_empty() {
            return Err(AuditError::InvalidPolicy(
                "retention policy table is empty".to_string(),
            ));
        }

        for (environment, row) in &self.rows {
            let mut previous: Option<(Severity, u32)> = None;
            for level in Severity::ALL {
                let days = row.get(&level).copied().ok_or_else(|| {
                    AuditError::InvalidPolicy(format!(
                        "missing retention row for level '{}' in environment '{}'",
                        level, environment
                    ))
                })?;
                if days == 0 {
                    return Err(AuditError::InvalidPolicy(format!(
                        "retention for {}/{} must be positive",
                        environment, level
                    )));
                }
                if let Some((prev_level, prev_days)) = previous {
                    if days < prev_days {
                        return Err(AuditError::InvalidPolicy(format!(
                            "retention must not decrease with severity: {}/{} ({}) < {} ({})",
                            environment, level, days, prev_level, prev_days
                        )));
                    }
                }
                previous = Some((level, days));
            }
        }
        Ok(())
    }

    /// Look up the retention window for an environment and level
    ///
    /// Fails explicitly when the environment has no policy row — an unknown
    /// environment is a configuration error, not zero retention.
    pub fn retention_days(&self, environment: Environment, level: Severity) -> Result<u32> {
        let row = self
            .rows
            .get(&environment)
            .ok_or_else(|| AuditError::UnknownEnvironment {
                environment: environment.to_string(),
            })?;
        row.get(&level)
            .copied()
            .ok_or_else(|| AuditError::InvalidPolicy(format!(
                "missing retention row for level '{}' in environment '{}'",
                level, environment
            )))
    }

    /// Environments covered by this table
    pub fn environments(&self) -> impl Iterator<Item = Environment> + '_ {
        self.rows.keys().copied()
    }
}

impl Default for RetentionPolicy {
    /// Canonical windows: production 7/7/30/90/180 days and development
    /// 3/3/7/30/90 days for debug/info/warning/error/critical
    fn default() -> Self {
        let mut rows = HashMap::new();
        rows.insert(
            Environment::Production,
            HashMap::from([
                (Severity::Debug, 7),
                (Severity::Info, 7),
                (Severity::Warning, 30),
                (Severity::Error, 90),
                (Severity::Critical, 180),
            ]),
        );
        rows.insert(
            Environment::Development,
            HashMap::from([
                (Severity::Debug, 3),
                (Severity::Info, 3),
                (Severity::Warning, 7),
                (Severity::Error, 30),
                (Severity::Critical, 90),
            ]),
        );
        Self { rows }
    }
}

/// Per-operation-class latency ceilings in milliseconds
///
/// Invariant: all thresholds are positive. A class missing from the table
/// is a classification no-op, not an error (fail-open by contract).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformanceThresholds {
    max_ms: HashMap<OperationClass, u64>,
}

impl PerformanceThresholds {
    /// Build a validated threshold table
    pub fn new(max_ms: HashMap<OperationClass, u64>) -> Result<Self> {
        let thresholds = Self { max_ms };
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Load and validate a threshold table from a JSON file
    ///
    /// Expected shape: `{"database": 100, "api": 1000, "operation": 500}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            AuditError::Config(format!(
                "Failed to read threshold file {}: {}",
                path.display(),
                e
            ))
        })?;
        let thresholds: PerformanceThresholds = serde_json::from_str(&json).map_err(|e| {
            AuditError::Config(format!(
                "Failed to parse threshold file {}: {}",
                path.display(),
                e
            ))
        })?;
        thresholds.validate()?;
        Ok(thresholds)
    }

    /// Check the table invariants without activating it
    pub fn validate(&self) -> Result<()> {
        if self.max_ms.is_empty() {
            return Err(AuditError::InvalidPolicy(
                "performance threshold table is empty".to_string(),
            ));
        }
        for (class, max_ms) in &self.max_ms {
            if *max_ms == 0 {
                return Err(AuditError::InvalidPolicy(format!(
                    "threshold for '{}' must be positive",
                    class
                )));
            }
        }
        Ok(())
    }

    /// Latency ceiling for an operation class, if one is configured
    pub fn max_acceptable_ms(&self, class: OperationClass) -> Option<u64> {
        self.max_ms.get(&class).copied()
    }
}

impl Default for PerformanceThresholds {
    /// Canonical ceilings: database 100ms, api 1000ms, operation 500ms
    fn default() -> Self {
        Self {
            max_ms: HashMap::from([
                (OperationClass::Database, 100),
                (OperationClass::Api, 1000),
                (OperationClass::Operation, 500),
            ]),
        }
    }
}

/// Shared handle to the active policy tables
///
/// Read extremely often, written rarely. Readers clone an `Arc` snapshot;
/// `replace_*` validates the incoming table first and leaves the previous
/// snapshot in effect when validation fails.
#[derive(Debug, Clone)]
pub struct PolicyHandle {
    retention: Arc<RwLock<Arc<RetentionPolicy>>>,
    thresholds: Arc<RwLock<Arc<PerformanceThresholds>>>,
}

impl PolicyHandle {
    /// Create a handle over validated tables
    pub fn new(retention: RetentionPolicy, thresholds: PerformanceThresholds) -> Result<Self> {
        retention.validate()?;
        thresholds.validate()?;
        Ok(Self {
            retention: Arc::new(RwLock::new(Arc::new(retention))),
            thresholds: Arc::new(RwLock::new(Arc::new(thresholds))),
        })
    }

    /// Current retention table snapshot
    pub async fn retention(&self) -> Arc<RetentionPolicy> {
        self.retention.read().await.clone()
    }

    /// Current threshold table snapshot
    pub async fn thresholds(&self) -> Arc<PerformanceThresholds> {
        self.thresholds.read().await.clone()
    }

    /// Validate and atomically activate a new retention table
    pub async fn replace_retention(&self, table: RetentionPolicy) -> Result<()> {
        if let Err(e) = table.validate() {
            tracing::warn!(error = %e, "Rejected retention policy replacement");
            return Err(e);
        }
        let mut guard = self.retention.write().await;
        *guard = Arc::new(table);
        tracing::info!("Retention policy table replaced");
        Ok(())
    }

    /// Validate and atomically activate a new threshold table
    pub async fn replace_thresholds(&self, table: PerformanceThresholds) -> Result<()> {
        if let Err(e) = table.validate() {
            tracing::warn!(error = %e, "Rejected performance threshold replacement");
            return Err(e);
        }
        let mut guard = self.thresholds.write().await;
        *guard = Arc::new(table);
        tracing::info!("Performance threshold table replaced");
        Ok(())
    }
}

impl Default for PolicyHandle {
    fn default() -> Self {
        Self {
            retention: Arc::new(RwLock::new(Arc::new(RetentionPolicy::default()))),
            thresholds: Arc::new(RwLock::new(Arc::new(PerformanceThresholds::default()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_retention_values() {
        let policy = RetentionPolicy::default();

        let cases = [
            (Environment::Production, Severity::Info, 7),
            (Environment::Production, Severity::Warning, 30),
            (Environment::Production, Severity::Error, 90),
            (Environment::Production, Severity::Critical, 180),
            (Environment::Development, Severity::Info, 3),
            (Environment::Development, Severity::Warning, 7),
            (Environment::Development, Severity::Error, 30),
            (Environment::Development, Severity::Critical, 90),
        ];
        for (environment, level, days) in cases {
            assert_eq!(
                policy.retention_days(environment, level).unwrap(),
                days,
                "{}/{}",
                environment,
                level
            );
        }
    }

    #[test]
    fn test_retention_monotonic_for_all_environments() {
        let policy = RetentionPolicy::default();

        for environment in [Environment::Production, Environment::Development] {
            let mut previous = 0;
            for level in Severity::ALL {
                let days = policy.retention_days(environment, level).unwrap();
                assert!(days >= previous, "{}/{}", environment, level);
                previous = days;
            }
        }
    }

    #[test]
    fn test_unknown_environment_fails_explicit() {
        let policy = RetentionPolicy::default();

        let result = policy.retention_days(Environment::Staging, Severity::Info);
        assert!(matches!(
            result,
            Err(AuditError::UnknownEnvironment { .. })
        ));
    }

    #[test]
    fn test_staging_row_is_additive() {
        let mut rows = HashMap::new();
        for environment in RetentionPolicy::default().environments() {
            // rebuild canonical rows
            let mut row = HashMap::new();
            for level in Severity::ALL {
                row.insert(
                    level,
                    RetentionPolicy::default()
                        .retention_days(environment, level)
                        .unwrap(),
                );
            }
            rows.insert(environment, row);
        }
        rows.insert(
            Environment::Staging,
            HashMap::from([
                (Severity::Debug, 5),
                (Severity::Info, 5),
                (Severity::Warning, 14),
                (Severity::Error, 45),
                (Severity::Critical, 120),
            ]),
        );

        let policy = RetentionPolicy::new(rows).unwrap();
        assert_eq!(
            policy
                .retention_days(Environment::Staging, Severity::Warning)
                .unwrap(),
            14
        );
    }

    #[test]
    fn test_validation_rejects_empty_table() {
        let result = RetentionPolicy::new(HashMap::new());
        assert!(matches!(result, Err(AuditError::InvalidPolicy(_))));
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let rows = HashMap::from([(
            Environment::Production,
            HashMap::from([
                (Severity::Debug, 0),
                (Severity::Info, 7),
                (Severity::Warning, 30),
                (Severity::Error, 90),
                (Severity::Critical, 180),
            ]),
        )]);
        assert!(matches!(
            RetentionPolicy::new(rows),
            Err(AuditError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn test_validation_rejects_decreasing_window() {
        let rows = HashMap::from([(
            Environment::Production,
            HashMap::from([
                (Severity::Debug, 7),
                (Severity::Info, 7),
                (Severity::Warning, 30),
                (Severity::Error, 20),
                (Severity::Critical, 180),
            ]),
        )]);
        let result = RetentionPolicy::new(rows);
        match result {
            Err(AuditError::InvalidPolicy(msg)) => assert!(msg.contains("must not decrease")),
            other => panic!("Expected InvalidPolicy, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_rejects_incomplete_row() {
        let rows = HashMap::from([(
            Environment::Production,
            HashMap::from([(Severity::Info, 7), (Severity::Critical, 180)]),
        )]);
        let result = RetentionPolicy::new(rows);
        match result {
            Err(AuditError::InvalidPolicy(msg)) => assert!(msg.contains("missing retention row")),
            other => panic!("Expected InvalidPolicy, got {:?}", other),
        }
    }

    #[test]
    fn test_retention_from_json_file() {
        let dir = std::env::temp_dir().join(format!("ops-audit-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("retention.json");

        let json = serde_json::to_string_pretty(&RetentionPolicy::default()).unwrap();
        std::fs::write(&path, json).unwrap();

        let policy = RetentionPolicy::from_json_file(&path).unwrap();
        assert_eq!(
            policy
                .retention_days(Environment::Production, Severity::Critical)
                .unwrap(),
            180
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_retention_from_json_file_rejects_invalid() {
        let dir = std::env::temp_dir().join(format!("ops-audit-test-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("retention.json");

        // Warning shorter than info: violates monotonicity
        std::fs::write(
            &path,
            r#"{"production": {"debug": 7, "info": 7, "warning": 3, "error": 90, "critical": 180}}"#,
        )
        .unwrap();

        assert!(matches!(
            RetentionPolicy::from_json_file(&path),
            Err(AuditError::InvalidPolicy(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_retention_from_json_file_missing() {
        let result = RetentionPolicy::from_json_file("/tmp/nonexistent-ops-audit-policy.json");
        assert!(matches!(result, Err(AuditError::Config(_))));
    }

    #[test]
    fn test_canonical_thresholds() {
        let thresholds = PerformanceThresholds::default();
        assert_eq!(
            thresholds.max_acceptable_ms(OperationClass::Database),
            Some(100)
        );
        assert_eq!(thresholds.max_acceptable_ms(OperationClass::Api), Some(1000));
        assert_eq!(
            thresholds.max_acceptable_ms(OperationClass::Operation),
            Some(500)
        );
    }

    #[test]
    fn test_threshold_miss_is_none() {
        let thresholds =
            PerformanceThresholds::new(HashMap::from([(OperationClass::Database, 100)])).unwrap();
        assert_eq!(thresholds.max_acceptable_ms(OperationClass::Api), None);
    }

    #[test]
    fn test_threshold_validation_rejects_zero() {
        let result = PerformanceThresholds::new(HashMap::from([(OperationClass::Api, 0)]));
        assert!(matches!(result, Err(AuditError::InvalidPolicy(_))));
    }

    #[test]
    fn test_threshold_validation_rejects_empty() {
        let result = PerformanceThresholds::new(HashMap::new());
        assert!(matches!(result, Err(AuditError::InvalidPolicy(_))));
    }

    #[tokio::test]
    async fn test_policy_handle_snapshot_and_replace() {
        let handle = PolicyHandle::default();

        let before = handle.retention().await;
        assert_eq!(
            before
                .retention_days(Environment::Production, Severity::Info)
                .unwrap(),
            7
        );

        let mut rows = HashMap::new();
        rows.insert(
            Environment::Production,
            HashMap::from([
                (Severity::Debug, 14),
                (Severity::Info, 14),
                (Severity::Warning, 60),
                (Severity::Error, 180),
                (Severity::Critical, 365),
            ]),
        );
        handle
            .replace_retention(RetentionPolicy::new(rows).unwrap())
            .await
            .unwrap();

        let after = handle.retention().await;
        assert_eq!(
            after
                .retention_days(Environment::Production, Severity::Info)
                .unwrap(),
            14
        );

        // The snapshot taken before the swap is unchanged
        assert_eq!(
            before
                .retention_days(Environment::Production, Severity::Info)
                .unwrap(),
            7
        );
    }

    #[tokio::test]
    async fn test_policy_handle_keeps_previous_on_invalid_replacement() {
        let handle = PolicyHandle::default();

        // Deserialize bypasses the validating constructor, so an invalid
        // table can reach replace_retention
        let invalid: RetentionPolicy = serde_json::from_value(serde_json::json!({
            "production": {
                "debug": 7, "info": 7, "warning": 30, "error": 10, "critical": 180
            }
        }))
        .unwrap();

        assert!(handle.replace_retention(invalid).await.is_err());

        let current = handle.retention().await;
        assert_eq!(
            current
                .retention_days(Environment::Production, Severity::Error)
                .unwrap(),
            90
        );
    }

    #[tokio::test]
    async fn test_policy_handle_threshold_replacement() {
        let handle = PolicyHandle::default();

        let custom =
            PerformanceThresholds::new(HashMap::from([(OperationClass::Api, 250)])).unwrap();
        handle.replace_thresholds(custom).await.unwrap();

        let current = handle.thresholds().await;
        assert_eq!(current.max_acceptable_ms(OperationClass::Api), Some(250));
        assert_eq!(current.max_acceptable_ms(OperationClass::Database), None);

        let invalid: PerformanceThresholds =
            serde_json::from_value(serde_json::json!({"database": 0})).unwrap();
        assert!(handle.replace_thresholds(invalid).await.is_err());
        assert_eq!(
            handle.thresholds().await.max_acceptable_ms(OperationClass::Api),
            Some(250)
        );
    }
}
