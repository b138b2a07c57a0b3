//! Error types for ops-audit

use thiserror::Error;

/// Errors that can occur in the governance engine
#[derive(Debug, Error)]
pub enum AuditError {
    /// Retention lookup against an environment with no policy row
    ///
    /// Surfaced as a configuration error rather than defaulting to zero
    /// retention, so a misconfigured deployment never silently purges data.
    #[error("No retention policy row for environment '{environment}'")]
    UnknownEnvironment {
        environment: String,
    },

    /// A policy table failed validation and was not activated
    #[error("Invalid policy table: {0}")]
    InvalidPolicy(String),

    /// Transient persistence failure during append, query, or purge
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Serialization/deserialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for governance operations
pub type Result<T> = std::result::Result<T, AuditError>;
