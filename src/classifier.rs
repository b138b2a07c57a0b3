//! Performance classifier — escalates slow operations
//!
//! Compares a measured duration against the configured latency ceiling for
//! its operation class and raises the event's effective severity to at
//! least `warning` on breach. Runs before admission, so a slow `info`-level
//! event in production is promoted past the noise-reduction rule instead of
//! being silently dropped.

use crate::policy::PerformanceThresholds;
use crate::types::{OperationClass, Severity};

/// Compute the effective severity for a measured operation
///
/// A duration over the class ceiling raises the level to at least
/// `Warning`; a base level that is already higher is never lowered.
/// Missing duration, missing class, or a class absent from the table is a
/// no-op — classification misses fail open so the event itself is never
/// blocked by a lookup miss.
pub fn classify(
    thresholds: &PerformanceThresholds,
    operation_class: Option<OperationClass>,
    duration_ms: Option<u64>,
    base: Severity,
) -> Severity {
    let (class, duration_ms) = match (operation_class, duration_ms) {
        (Some(class), Some(duration_ms)) => (class, duration_ms),
        _ => return base,
    };

    match thresholds.max_acceptable_ms(class) {
        Some(max_ms) if duration_ms > max_ms => {
            let escalated = base.max(Severity::Warning);
            if escalated > base {
                tracing::debug!(
                    class = %class,
                    duration_ms,
                    max_ms,
                    from = %base,
                    to = %escalated,
                    "Slow operation escalated"
                );
            }
            escalated
        }
        _ => base,
    }
}
