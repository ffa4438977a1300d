//! The uniform result shape produced by every adapter, and the request and
//! aggregate types built around it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;

use crate::error::CheckError;
use crate::risk::RiskLevel;
use crate::service::ServiceKey;

/// Maximum number of example names an adapter reports.
pub const MAX_EXAMPLES: usize = 3;

/// Placeholder `details` for a service whose adapter has not settled yet.
pub const CHECKING: &str = "Checking...";

/// Annotation for adapters that infer presence indirectly.
pub const BEST_EFFORT: &str = "best-effort";

/// Outcome of one service check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// An item with exactly this name exists.
    Taken,
    /// No exact item, but the service's search returned related names.
    Similar,
    /// Neither an exact item nor any search match.
    NotFound,
    /// The service could not give a confident answer.
    Unknown,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Taken => write!(f, "taken"),
            Self::Similar => write!(f, "similar"),
            Self::NotFound => write!(f, "not_found"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// What a single adapter reports for a name.
///
/// Only `status` and `details` are always meaningful. The remaining fields
/// depend on the adapter; read them through [`count_or_zero`](Self::count_or_zero)
/// and [`is_exact`](Self::is_exact) to treat absence as zero / false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceResult {
    /// Outcome classification.
    pub status: ServiceStatus,
    /// Short human-readable summary.
    pub details: String,
    /// Number of matches reported by a fuzzy search.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Up to three example names, in the service's relevance order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
    /// Whether an item whose name case-insensitively equals the query exists.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exact: Option<bool>,
    /// Free-form annotation such as `best-effort`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl ServiceResult {
    /// A result with the given status and details and no optional fields.
    pub fn new(status: ServiceStatus, details: impl Into<String>) -> Self {
        Self {
            status,
            details: details.into(),
            count: None,
            examples: Vec::new(),
            exact: None,
            note: None,
        }
    }

    /// An exact item exists.
    pub fn taken(details: impl Into<String>) -> Self {
        Self::new(ServiceStatus::Taken, details)
    }

    /// Related names exist; `count` and `examples` come from the search.
    pub fn similar(details: impl Into<String>, count: u64, examples: Vec<String>) -> Self {
        Self::new(ServiceStatus::Similar, details)
            .with_count(count)
            .with_examples(examples)
    }

    /// Nothing found.
    pub fn not_found(details: impl Into<String>) -> Self {
        Self::new(ServiceStatus::NotFound, details)
    }

    /// Degraded signal.
    pub fn unknown(details: impl Into<String>) -> Self {
        Self::new(ServiceStatus::Unknown, details)
    }

    /// The sentinel shown for a service that has not settled yet.
    pub fn checking() -> Self {
        Self::unknown(CHECKING)
    }

    /// Set the match count.
    #[must_use]
    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    /// Set the examples, keeping at most [`MAX_EXAMPLES`].
    #[must_use]
    pub fn with_examples(mut self, mut examples: Vec<String>) -> Self {
        examples.truncate(MAX_EXAMPLES);
        self.examples = examples;
        self
    }

    /// Set the exact-match flag.
    #[must_use]
    pub fn with_exact(mut self, exact: bool) -> Self {
        self.exact = Some(exact);
        self
    }

    /// Attach an annotation.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// The match count, or zero when the adapter did not report one.
    #[must_use]
    pub fn count_or_zero(&self) -> u64 {
        self.count.unwrap_or(0)
    }

    /// The exact-match flag, or `false` when the adapter did not report one.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.exact.unwrap_or(false)
    }
}

/// A project name normalized for querying: trimmed and lowercased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    /// Normalize a raw user-supplied name.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::EmptyName`] when nothing remains after trimming.
    ///
    /// ```
    /// use nametrace::result::ProjectName;
    /// assert_eq!(ProjectName::parse("  My-Tool ").unwrap().as_str(), "my-tool");
    /// ```
    pub fn parse(raw: &str) -> Result<Self, CheckError> {
        let name = raw.trim().to_lowercase();
        if name.is_empty() {
            return Err(CheckError::EmptyName);
        }
        Ok(Self(name))
    }

    /// The normalized name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProjectName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One user-initiated check: a normalized name and the services to ask.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    name: ProjectName,
    services: BTreeSet<ServiceKey>,
}

impl QueryRequest {
    /// Validate and build a request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::EmptyName`] for a blank name and
    /// [`CheckError::NoServices`] when `services` is empty.
    pub fn new(
        raw_name: &str,
        services: impl IntoIterator<Item = ServiceKey>,
    ) -> Result<Self, CheckError> {
        let name = ProjectName::parse(raw_name)?;
        let services: BTreeSet<ServiceKey> = services.into_iter().collect();
        if services.is_empty() {
            return Err(CheckError::NoServices);
        }
        Ok(Self { name, services })
    }

    /// The normalized name.
    #[must_use]
    pub const fn name(&self) -> &ProjectName {
        &self.name
    }

    /// The enabled services, in key order.
    #[must_use]
    pub const fn services(&self) -> &BTreeSet<ServiceKey> {
        &self.services
    }

    /// Whether both load-bearing services are enabled, so a risk verdict
    /// can eventually be computed.
    #[must_use]
    pub fn can_assess_risk(&self) -> bool {
        self.services.contains(&ServiceKey::Crates) && self.services.contains(&ServiceKey::Github)
    }
}

/// The verdict for a request, produced once both load-bearing services have
/// settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateResult {
    /// The normalized name that was checked.
    pub name: ProjectName,
    /// Results settled at the moment the verdict was computed.
    pub checks: BTreeMap<ServiceKey, ServiceResult>,
    /// Collision risk.
    pub risk_level: RiskLevel,
    /// Display reasons backing `risk_level`.
    pub reasons: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn examples_are_capped() {
        let names = ["a", "b", "c", "d"].map(String::from).to_vec();
        let result = ServiceResult::similar("4 results", 4, names);
        assert_eq!(result.examples, vec!["a", "b", "c"]);
        assert_eq!(result.count, Some(4));
    }

    #[test]
    fn absent_fields_read_as_zero() {
        let result = ServiceResult::not_found("nothing");
        assert_eq!(result.count_or_zero(), 0);
        assert!(!result.is_exact());
    }

    #[test]
    fn project_name_is_normalized() {
        assert_eq!(ProjectName::parse("  FooBar\t").unwrap().as_str(), "foobar");
        assert_eq!(ProjectName::parse("   "), Err(CheckError::EmptyName));
    }

    #[test]
    fn request_requires_services() {
        assert_eq!(QueryRequest::new("foo", []), Err(CheckError::NoServices));
        assert_eq!(
            QueryRequest::new("", [ServiceKey::Npm]),
            Err(CheckError::EmptyName)
        );
    }

    #[test]
    fn risk_needs_both_load_bearing_services() {
        let both = QueryRequest::new("foo", [ServiceKey::Crates, ServiceKey::Github]).unwrap();
        assert!(both.can_assess_risk());
        let one = QueryRequest::new("foo", [ServiceKey::Crates, ServiceKey::Npm]).unwrap();
        assert!(!one.can_assess_risk());
    }

    #[test]
    fn serializes_without_absent_fields() {
        let json = serde_json::to_value(ServiceResult::not_found("No crate found")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "not_found", "details": "No crate found"})
        );
    }
}
