//! PowerShell Gallery, scraped from its OData v2 Atom feeds.
//!
//! The gallery blocks cross-origin reads, so both requests go through the
//! relays first.

use std::sync::LazyLock;

use regex::Regex;

use super::markup::{count_literal, inner_texts};
use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{MAX_EXAMPLES, ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Fetched, Relay, Route, Transport};

const API: &str = "https://www.powershellgallery.com/api/v2";
const ROUTE: Route = Route::prefer_relay(&[Relay::Jina, Relay::AllOrigins]);
const ENTRY: &str = "<entry>";

static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<title[^>]*>([^<]+)</title>").unwrap());

/// The PowerShell Gallery adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerShellGallery;

/// Fetch an Atom feed, rejecting payloads that are not one.
fn fetch_feed(transport: &Transport, url: &str) -> Result<Fetched<String>, FetchError> {
    let fetched = transport.fetch_text(url, ROUTE)?;
    if fetched.value.contains("<feed") {
        Ok(fetched)
    } else {
        Err(FetchError::parse("payload is not an Atom feed"))
    }
}

impl Adapter for PowerShellGallery {
    fn key(&self) -> ServiceKey {
        ServiceKey::Powershell
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let url = format!("{API}/FindPackagesById()?id='{}'", encode(name.as_str()));
        let exact = fetch_feed(transport, &url)?;
        if exact.value.contains(ENTRY) {
            return Ok(ServiceResult::taken(format!(
                "Module exists{}",
                exact.provenance_note()
            )));
        }

        let url = format!(
            "{API}/Search()?searchTerm='{}'&includePrerelease=false",
            encode(name.as_str())
        );
        let found = fetch_feed(transport, &url).map_err(AdapterError::search)?;
        let total = count_literal(&found.value, ENTRY) as u64;
        // The feed's own <title> reads "Search"; entry titles are module ids.
        let titles = inner_texts(&found.value, &TITLE_RE, MAX_EXAMPLES, |title| {
            !title.to_lowercase().contains("search")
        });
        Ok(search_outcome(
            total,
            titles,
            found.provenance_note(),
            "No module found",
        ))
    }
}
