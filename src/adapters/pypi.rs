//! Python Package Index. The JSON API answers exact lookups; fuzzy search
//! only exists as an HTML page, which is scraped.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use super::markup::{count_literal, inner_texts};
use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{MAX_EXAMPLES, ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Relay, Route, Transport};

const SNIPPET: &str = r#"class="package-snippet""#;
const SEARCH_ROUTE: Route = Route::prefer_relay(&[Relay::AllOrigins]);

static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"class="package-snippet__name">([^<]+)</span>"#).unwrap()
});

/// The PyPI adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PyPi;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectResponse {
    info: ProjectInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectInfo {
    version: Option<String>,
}

/// Count result snippets and collect their names from a search page.
fn scrape_results(page: &str) -> Result<(u64, Vec<String>), FetchError> {
    if !page.to_ascii_lowercase().contains("<html") {
        return Err(FetchError::parse("search payload is not an HTML page"));
    }
    let total = count_literal(page, SNIPPET) as u64;
    let names = inner_texts(page, &NAME_RE, MAX_EXAMPLES, |_| true);
    Ok((total, names))
}

impl Adapter for PyPi {
    fn key(&self) -> ServiceKey {
        ServiceKey::Pypi
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let url = format!("https://pypi.org/pypi/{}/json", encode(name.as_str()));
        match transport.fetch_json::<ProjectResponse>(&url, Route::DIRECT) {
            Ok(found) => Ok(ServiceResult::taken(found.value.info.version.map_or_else(
                || format!("{name} exists"),
                |version| format!("{name} {version}"),
            ))),
            Err(FetchError::Http { status: 404 }) => {
                let url = format!("https://pypi.org/search/?q={}", encode(name.as_str()));
                let page = transport
                    .fetch_text(&url, SEARCH_ROUTE)
                    .map_err(AdapterError::search)?;
                let (total, names) = scrape_results(&page.value).map_err(AdapterError::search)?;
                Ok(search_outcome(
                    total,
                    names,
                    page.provenance_note(),
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

    const EXACT: &str = "https://pypi.org/pypi/foo/json";
    const SEARCH: &str = "https://pypi.org/search/?q=foo";

    const RESULTS_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<body>
  <ul class="unstyled" aria-label="Search results">
    <li><a class="package-snippet" href="/project/foo-bar/">
      <h3 class="package-snippet__title">
        <span class="package-snippet__name">foo-bar</span>
        <span class="package-snippet__version">0.3.1</span>
      </h3>
    </a></li>
    <li><a class="package-snippet" href="/project/pyfoo/">
      <h3 class="package-snippet__title">
        <span class="package-snippet__name">pyfoo</span>
        <span class="package-snippet__version">2.0</span>
      </h3>
    </a></li>
  </ul>
</body>
</html>"#;

    const EMPTY_PAGE: &str = r#"<!DOCTYPE html>
<html lang="en"><body><p>There were no results for 'foo'</p></body></html>"#;

    fn check(client: FakeClient) -> ServiceResult {
        PyPi.check(&transport(client), &ProjectName::parse("foo").unwrap())
    }

    #[test]
    fn existing_project_reports_version() {
        let result = check(FakeClient::new().reply(EXACT, 200, r#"{"info": {"version": "1.4"}}"#));
        assert_eq!(result, ServiceResult::taken("foo 1.4"));
    }

    #[test]
    fn scraped_snippets_are_similar() {
        let result = check(FakeClient::new().reply(EXACT, 404, "").reply(
            Relay::AllOrigins.wrap(SEARCH),
            200,
            RESULTS_PAGE,
        ));
        assert_eq!(result.status, ServiceStatus::Similar);
        assert_eq!(result.count, Some(2));
        assert_eq!(result.examples, vec!["foo-bar", "pyfoo"]);
        assert!(result.details.starts_with("2 results (via relay)"));
    }

    #[test]
    fn page_without_snippets_is_not_found() {
        let result = check(FakeClient::new().reply(EXACT, 404, "").reply(
            Relay::AllOrigins.wrap(SEARCH),
            200,
            EMPTY_PAGE,
        ));
        assert_eq!(result.status, ServiceStatus::NotFound);
    }

    #[test]
    fn non_html_search_payload_is_unknown() {
        let result = check(FakeClient::new().reply(EXACT, 404, "").reply(
            Relay::AllOrigins.wrap(SEARCH),
            200,
            "{}",
        ));
        assert_eq!(result, ServiceResult::unknown("Search error: unexpected response"));
    }

    #[test]
    fn scraper_ignores_name_class_when_counting() {
        let (total, names) = scrape_results(RESULTS_PAGE).unwrap();
        assert_eq!(total, 2);
        assert_eq!(names.len(), 2);
    }
}
