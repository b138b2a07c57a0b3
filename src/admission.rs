//! Admission filter — decides whether a candidate event is recorded
//!
//! Pure function of environment, level, and category; safe to call from
//! arbitrarily many concurrent callers without synchronization.

use crate::types::{Category, Environment, Severity};

/// Decide whether an event is worth persisting
///
/// Rules, first match wins:
/// 1. Outside production, admit everything — debugging visibility takes
///    priority over noise reduction.
/// 2. Always-admit categories (`security`, `system_action`,
///    `critical_operation`) are admitted at any level.
/// 3. `warning` and above is admitted.
/// 4. Everything else (production, ordinary category, `info`/`debug`) is
///    dropped.
pub fn should_admit(environment: Environment, level: Severity, category: Category) -> bool {
    if environment != Environment::Production {
        return true;
    }
    if category.is_always_admitted() {
        return true;
    }
    level >= Severity::Warning
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_admits_everything() {
        for level in Severity::ALL {
            for category in [
                Category::UserAction,
                Category::SystemAction,
                Category::Security,
                Category::CriticalOperation,
                Category::Performance,
            ] {
                assert!(
                    should_admit(Environment::Development, level, category),
                    "{}/{}",
                    level,
                    category
                );
            }
        }
    }

    #[test]
    fn test_non_production_environments_admit_everything() {
        assert!(should_admit(
            Environment::Staging,
            Severity::Debug,
            Category::UserAction
        ));
    }

    #[test]
    fn test_always_admit_categories_in_production() {
        for category in [
            Category::Security,
            Category::SystemAction,
            Category::CriticalOperation,
        ] {
            for level in Severity::ALL {
                assert!(
                    should_admit(Environment::Production, level, category),
                    "{}/{}",
                    level,
                    category
                );
            }
        }
    }

    #[test]
    fn test_production_drops_low_severity_ordinary_events() {
        assert!(!should_admit(
            Environment::Production,
            Severity::Info,
            Category::UserAction
        ));
        assert!(!should_admit(
            Environment::Production,
            Severity::Debug,
            Category::UserAction
        ));
        assert!(!should_admit(
            Environment::Production,
            Severity::Info,
            Category::Performance
        ));
    }

    #[test]
    fn test_production_admits_warning_and_above() {
        for level in [Severity::Warning, Severity::Error, Severity::Critical] {
            assert!(should_admit(
                Environment::Production,
                level,
                Category::UserAction
            ));
        }
    }
}
