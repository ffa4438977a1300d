//! npm registry.

use std::collections::HashMap;

use serde::Deserialize;

use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Route, Transport};

const REGISTRY: &str = "https://registry.npmjs.org";

/// The npm adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Npm;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Packument {
    #[serde(rename = "dist-tags")]
    dist_tags: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchResponse {
    total: u64,
    objects: Vec<SearchObject>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchObject {
    package: SearchPackage,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchPackage {
    name: Option<String>,
}

impl Adapter for Npm {
    fn key(&self) -> ServiceKey {
        ServiceKey::Npm
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let url = format!("{REGISTRY}/{}", encode(name.as_str()));
        match transport.fetch_json::<Packument>(&url, Route::DIRECT) {
            Ok(found) => Ok(ServiceResult::taken(found.value.dist_tags.get("latest").map_or_else(
                || format!("{name} exists"),
                |latest| format!("{name}@{latest}"),
            ))),
            Err(FetchError::Http { status: 404 }) => {
                let url = format!(
                    "{REGISTRY}/-/v1/search?text={}&size=3",
                    encode(name.as_str())
                );
                let found = transport
                    .fetch_json::<SearchResponse>(&url, Route::DIRECT)
                    .map_err(AdapterError::search)?;
                let provenance = found.provenance_note();
                let examples = found
                    .value
                    .objects
                    .into_iter()
                    .filter_map(|object| object.package.name)
                    .collect();
                Ok(search_outcome(
                    found.value.total,
                    examples,
                    provenance,
                    "No package found",
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ServiceStatus;
    use crate::transport::testing::{FakeClient, transport};

    const EXACT: &str = "https://registry.npmjs.org/foo";
    const SEARCH: &str = "https://registry.npmjs.org/-/v1/search?text=foo&size=3";

    fn check(client: FakeClient) -> ServiceResult {
        Npm.check(&transport(client), &ProjectName::parse("foo").unwrap())
    }

    #[test]
    fn published_package_reports_latest() {
        let result = check(FakeClient::new().reply(
            EXACT,
            200,
            r#"{"name": "foo", "dist-tags": {"latest": "3.1.0", "next": "4.0.0-rc.1"}}"#,
        ));
        assert_eq!(result, ServiceResult::taken("foo@3.1.0"));
    }

    #[test]
    fn search_hits_are_similar() {
        let result = check(FakeClient::new().reply(EXACT, 404, r#"{"error":"Not found"}"#).reply(
            SEARCH,
            200,
            r#"{"total": 2, "objects": [{"package": {"name": "foo-x"}}, {"package": {"name": "xfoo"}}]}"#,
        ));
        assert_eq!(result.status, ServiceStatus::Similar);
        assert_eq!(result.count, Some(2));
        assert_eq!(result.details, "2 results · Examples: foo-x, xfoo");
    }

    #[test]
    fn empty_search_is_not_found() {
        let result = check(
            FakeClient::new()
                .reply(EXACT, 404, "")
                .reply(SEARCH, 200, r#"{"total": 0, "objects": []}"#),
        );
        assert_eq!(result, ServiceResult::not_found("No package found"));
    }

    #[test]
    fn malformed_search_is_unknown() {
        let result = check(FakeClient::new().reply(EXACT, 404, "").reply(SEARCH, 200, "<html>"));
        assert_eq!(result, ServiceResult::unknown("Search error: unexpected response"));
    }
}
