//! Maven Central, through its Solr search API. Both queries go through the
//! relay first because the API rejects cross-origin reads.

use serde::Deserialize;

use super::{encode, search_outcome};
use crate::error::AdapterError;
use crate::result::{ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Relay, Route, Transport};

const SOLR: &str = "https://search.maven.org/solrsearch/select";
const ROUTE: Route = Route::prefer_relay(&[Relay::AllOrigins]);

/// The Maven Central adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MavenCentral;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SolrEnvelope {
    response: SolrResponse,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SolrResponse {
    num_found: u64,
    docs: Vec<SolrDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SolrDoc {
    g: Option<String>,
    a: Option<String>,
}

impl SolrDoc {
    fn coordinates(&self) -> Option<String> {
        Some(format!("{}:{}", self.g.as_deref()?, self.a.as_deref()?))
    }
}

impl Adapter for MavenCentral {
    fn key(&self) -> ServiceKey {
        ServiceKey::Maven
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let term = format!("a:{name}");
        let url = format!("{SOLR}?q={}&rows=1&wt=json", encode(&term));
        let exact = transport.fetch_json::<SolrEnvelope>(&url, ROUTE)?;
        let via = exact.provenance_note();
        if exact.value.response.num_found > 0 {
            let details = match exact.value.response.docs.first().and_then(SolrDoc::coordinates) {
                Some(coordinates) => format!("Artifact exists: {coordinates}{via}"),
                None => format!("Artifact exists{via}"),
            };
            return Ok(ServiceResult::taken(details));
        }

        let url = format!("{SOLR}?q={}&rows=3&wt=json", encode(name.as_str()));
        let found = transport
            .fetch_json::<SolrEnvelope>(&url, ROUTE)
            .map_err(AdapterError::search)?;
        let provenance = found.provenance_note();
        let response = found.value.response;
        let examples = response.docs.into_iter().filter_map(|doc| doc.a).collect();
        Ok(search_outcome(
            response.num_found,
            examples,
            provenance,
            "No artifact found",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ServiceStatus;
    use crate::transport::testing::{FakeClient, transport};

    const EXACT: &str = "https://search.maven.org/solrsearch/select?q=a%3Afoo&rows=1&wt=json";
    const SEARCH: &str = "https://search.maven.org/solrsearch/select?q=foo&rows=3&wt=json";

    fn check(client: FakeClient) -> ServiceResult {
        MavenCentral.check(&transport(client), &ProjectName::parse("foo").unwrap())
    }

    #[test]
    fn artifact_is_taken_with_coordinates() {
        let result = check(FakeClient::new().reply(
            Relay::AllOrigins.wrap(EXACT),
            200,
            r#"{"response": {"numFound": 1, "docs": [{"g": "org.example", "a": "foo", "latestVersion": "1.0"}]}}"#,
        ));
        assert_eq!(
            result,
            ServiceResult::taken("Artifact exists: org.example:foo (via relay)")
        );
    }

    #[test]
    fn fuzzy_hits_are_similar() {
        let result = check(
            FakeClient::new()
                .reply(
                    Relay::AllOrigins.wrap(EXACT),
                    200,
                    r#"{"response": {"numFound": 0, "docs": []}}"#,
                )
                .reply(
                    Relay::AllOrigins.wrap(SEARCH),
                    200,
                    r#"{"response": {"numFound": 57, "docs": [{"a": "foo-core"}, {"a": "foo-api"}, {"a": "jfoo"}]}}"#,
                ),
        );
        assert_eq!(result.status, ServiceStatus::Similar);
        assert_eq!(result.count, Some(57));
        assert_eq!(result.examples.len(), 3);
    }

    #[test]
    fn nothing_found_is_not_found() {
        let empty = r#"{"response": {"numFound": 0, "docs": []}}"#;
        let result = check(
            FakeClient::new()
                .reply(Relay::AllOrigins.wrap(EXACT), 200, empty)
                .reply(Relay::AllOrigins.wrap(SEARCH), 200, empty),
        );
        assert_eq!(
            result,
            ServiceResult::not_found("No artifact found (via relay)")
        );
    }

    #[test]
    fn relay_failure_is_unknown() {
        let result = check(FakeClient::new().reply(Relay::AllOrigins.wrap(EXACT), 408, ""));
        assert_eq!(result, ServiceResult::unknown("Error: 408"));
    }
}
