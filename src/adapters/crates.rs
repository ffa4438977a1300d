//! crates.io: the load-bearing registry signal.

use serde::Deserialize;
use tracing::debug;

use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Route, Transport};

const API: &str = "https://crates.io/api/v1/crates";

/// The crates.io adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crates;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrateResponse {
    #[serde(rename = "crate")]
    krate: CrateInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CrateInfo {
    max_version: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    crates: Vec<SearchHit>,
    meta: SearchMeta,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchHit {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchMeta {
    total: u64,
}

fn crate_url(name: &str) -> String {
    format!("{API}/{}", encode(name))
}

impl Adapter for Crates {
    fn key(&self) -> ServiceKey {
        ServiceKey::Crates
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        match transport.fetch_json::<CrateResponse>(&crate_url(name.as_str()), Route::DIRECT) {
            Ok(found) => Ok(ServiceResult::taken(found.value.krate.max_version.map_or_else(
                || format!("{name} exists"),
                |version| format!("{name} v{version}"),
            ))),
            Err(FetchError::Http { status: 404 }) => search(transport, name),
            Err(e) => Err(e.into()),
        }
    }
}

fn search(transport: &Transport, name: &ProjectName) -> Result<ServiceResult, AdapterError> {
    let url = format!("{API}?q={}&per_page=3", encode(name.as_str()));
    let found = transport
        .fetch_json::<SearchResponse>(&url, Route::DIRECT)
        .map_err(AdapterError::search)?;
    let provenance = found.provenance_note();
    let examples = found
        .value
        .crates
        .into_iter()
        .filter_map(|hit| hit.name)
        .collect();
    Ok(search_outcome(
        found.value.meta.total,
        examples,
        provenance,
        "No crate found",
    ))
}

/// Whether crates.io affirmatively has no crate called `name`.
///
/// Only a 404 from the exact endpoint counts as available; any other status
/// or a network failure counts as unavailable.
#[must_use]
pub fn is_available(transport: &Transport, name: &str) -> bool {
    match transport.probe_status(&crate_url(name)) {
        Ok(status) => status == 404,
        Err(e) => {
            debug!(name, error = %e, "availability probe failed");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ServiceStatus;
    use crate::transport::testing::{FakeClient, transport};

    const EXACT: &str = "https://crates.io/api/v1/crates/foo";
    const SEARCH: &str = "https://crates.io/api/v1/crates?q=foo&per_page=3";

    fn check(client: FakeClient) -> ServiceResult {
        Crates.check(&transport(client), &ProjectName::parse("foo").unwrap())
    }

    #[test]
    fn existing_crate_is_taken_with_version() {
        let result = check(FakeClient::new().reply(
            EXACT,
            200,
            r#"{"crate": {"name": "foo", "max_version": "1.2.3"}}"#,
        ));
        assert_eq!(result, ServiceResult::taken("foo v1.2.3"));
    }

    #[test]
    fn existing_crate_without_version() {
        let result = check(FakeClient::new().reply(EXACT, 200, r#"{"crate": {}}"#));
        assert_eq!(result.status, ServiceStatus::Taken);
        assert_eq!(result.details, "foo exists");
    }

    #[test]
    fn missing_crate_with_no_search_hits_is_not_found() {
        let result = check(
            FakeClient::new()
                .reply(EXACT, 404, r#"{"errors": []}"#)
                .reply(SEARCH, 200, r#"{"crates": [], "meta": {"total": 0}}"#),
        );
        assert_eq!(result, ServiceResult::not_found("No crate found"));
    }

    #[test]
    fn missing_crate_with_search_hits_is_similar() {
        let result = check(
            FakeClient::new().reply(EXACT, 404, "{}").reply(
                SEARCH,
                200,
                r#"{"crates": [{"name": "foo-bar"}, {"name": "foobar"}, {"name": "foo_rs"}],
                    "meta": {"total": 41}}"#,
            ),
        );
        assert_eq!(result.status, ServiceStatus::Similar);
        assert_eq!(result.count, Some(41));
        assert_eq!(result.examples, vec!["foo-bar", "foobar", "foo_rs"]);
        assert_eq!(result.details, "41 results · Examples: foo-bar, foobar");
    }

    #[test]
    fn server_error_is_unknown() {
        let result = check(FakeClient::new().reply(EXACT, 503, ""));
        assert_eq!(result, ServiceResult::unknown("Error: 503"));
    }

    #[test]
    fn search_failure_is_unknown() {
        let result = check(FakeClient::new().reply(EXACT, 404, "").reply(SEARCH, 500, ""));
        assert_eq!(result, ServiceResult::unknown("Search error: 500"));
    }

    #[test]
    fn network_failure_is_unknown() {
        let result = check(FakeClient::new().fail(EXACT));
        assert_eq!(result, ServiceResult::unknown("Network error"));
    }

    #[test]
    fn availability_probe_needs_404() {
        let t = transport(
            FakeClient::new()
                .reply("https://crates.io/api/v1/crates/free", 404, "")
                .reply("https://crates.io/api/v1/crates/used", 200, "{}")
                .reply("https://crates.io/api/v1/crates/limited", 429, ""),
        );
        assert!(is_available(&t, "free"));
        assert!(!is_available(&t, "used"));
        assert!(!is_available(&t, "limited"));
        assert!(!is_available(&t, "offline"));
    }

    #[test]
    fn same_upstream_gives_equal_results() {
        let t = transport(
            FakeClient::new()
                .reply(EXACT, 404, "")
                .reply(SEARCH, 200, r#"{"crates": [{"name": "foox"}], "meta": {"total": 1}}"#),
        );
        let name = ProjectName::parse("foo").unwrap();
        assert_eq!(Crates.check(&t, &name), Crates.check(&t, &name));
    }

    #[test]
    #[ignore = "requires network access"]
    fn serde_is_taken() {
        let t = Transport::new(crate::transport::Client::new());
        let result = Crates.check(&t, &ProjectName::parse("serde").unwrap());
        assert_eq!(result.status, ServiceStatus::Taken);
    }
}
