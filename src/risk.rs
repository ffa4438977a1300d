//! Collision-risk verdict from the two load-bearing signals.

use std::fmt;

use serde::Serialize;

use crate::result::{ServiceResult, ServiceStatus};

/// GitHub repository count above which similar names make a collision likely.
pub const CROWDED_REPO_COUNT: u64 = 5;

/// How likely a new project under this name collides with an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No exact match and few similar repositories.
    Low,
    /// Many similarly named repositories.
    Medium,
    /// An exact crate or repository already exists.
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

/// Classify risk from the crates.io (`registry`) and GitHub (`codehost`)
/// results.
///
/// ```
/// use nametrace::result::ServiceResult;
/// use nametrace::risk::{classify, RiskLevel};
///
/// let registry = ServiceResult::taken("foo v1.0.0");
/// let codehost = ServiceResult::not_found("No repositories found").with_count(0);
/// assert_eq!(classify(&registry, &codehost), RiskLevel::High);
/// ```
#[must_use]
pub fn classify(registry: &ServiceResult, codehost: &ServiceResult) -> RiskLevel {
    if registry.status == ServiceStatus::Taken || codehost.is_exact() {
        RiskLevel::High
    } else if codehost.count_or_zero() > CROWDED_REPO_COUNT {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Human-readable reasons behind the verdict. Never empty.
#[must_use]
pub fn reasons(registry: &ServiceResult, codehost: &ServiceResult) -> Vec<String> {
    let mut reasons = Vec::new();
    if registry.status == ServiceStatus::Taken {
        reasons.push("Exact crate name exists".to_owned());
    }
    if codehost.is_exact() {
        reasons.push("Exact GitHub repo name exists".to_owned());
    } else if codehost.count_or_zero() > CROWDED_REPO_COUNT {
        reasons.push("Multiple GitHub repos with similar names".to_owned());
    }
    if reasons.is_empty() {
        reasons.push("No exact matches detected".to_owned());
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn github(exact: bool, count: u64) -> ServiceResult {
        ServiceResult::new(ServiceStatus::Similar, "")
            .with_exact(exact)
            .with_count(count)
    }

    #[test]
    fn taken_crate_is_high() {
        let registry = ServiceResult::taken("foo v1.0.0");
        assert_eq!(classify(&registry, &github(false, 0)), RiskLevel::High);
    }

    #[test]
    fn exact_repo_is_high() {
        let registry = ServiceResult::not_found("No crate found");
        assert_eq!(classify(&registry, &github(true, 1)), RiskLevel::High);
    }

    #[test]
    fn crowded_github_is_medium() {
        let registry = ServiceResult::not_found("No crate found");
        assert_eq!(classify(&registry, &github(false, 6)), RiskLevel::Medium);
        assert_eq!(classify(&registry, &github(false, 5)), RiskLevel::Low);
    }

    #[test]
    fn quiet_name_is_low() {
        let registry = ServiceResult::not_found("No crate found");
        assert_eq!(classify(&registry, &github(false, 0)), RiskLevel::Low);
    }

    #[test]
    fn degraded_signals_read_as_absent() {
        let registry = ServiceResult::unknown("Network error");
        let codehost = ServiceResult::unknown("Rate limit exceeded");
        assert_eq!(classify(&registry, &codehost), RiskLevel::Low);
    }

    #[test]
    fn reasons_can_stack() {
        let registry = ServiceResult::taken("foo v1.0.0");
        assert_eq!(
            reasons(&registry, &github(true, 40)),
            vec!["Exact crate name exists", "Exact GitHub repo name exists"]
        );
        assert_eq!(
            reasons(&registry, &github(false, 40)),
            vec!["Exact crate name exists", "Multiple GitHub repos with similar names"]
        );
    }

    #[test]
    fn default_reason() {
        let registry = ServiceResult::not_found("No crate found");
        assert_eq!(
            reasons(&registry, &github(false, 2)),
            vec!["No exact matches detected"]
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn status() -> impl Strategy<Value = ServiceStatus> {
            prop_oneof![
                Just(ServiceStatus::Taken),
                Just(ServiceStatus::Similar),
                Just(ServiceStatus::NotFound),
                Just(ServiceStatus::Unknown),
            ]
        }

        proptest! {
            #[test]
            fn classify_is_pure(s in status(), exact in any::<bool>(), count in 0u64..1000) {
                let registry = ServiceResult::new(s, "");
                let codehost = github(exact, count);
                prop_assert_eq!(classify(&registry, &codehost), classify(&registry, &codehost));
            }

            #[test]
            fn high_iff_taken_or_exact(s in status(), exact in any::<bool>(), count in 0u64..1000) {
                let registry = ServiceResult::new(s, "");
                let level = classify(&registry, &github(exact, count));
                prop_assert_eq!(level == RiskLevel::High, s == ServiceStatus::Taken || exact);
            }
        }
    }
}
