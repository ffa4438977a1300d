//! NuGet gallery.

use serde::Deserialize;

use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Route, Transport};

const REGISTRATION: &str = "https://api.nuget.org/v3/registration5-semver1";
const SEARCH: &str = "https://azuresearch-usnc.nuget.org/query";

/// The NuGet adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct NuGet;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistrationIndex {
    count: u64,
    items: Vec<RegistrationPage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RegistrationPage {
    upper: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SearchResponse {
    total_hits: u64,
    data: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchHit {
    id: Option<String>,
}

impl Adapter for NuGet {
    fn key(&self) -> ServiceKey {
        ServiceKey::Nuget
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        // Registration ids are lowercase; the name is already normalized.
        let url = format!("{REGISTRATION}/{}/index.json", encode(name.as_str()));
        match transport.fetch_json::<RegistrationIndex>(&url, Route::DIRECT) {
            Ok(found) if found.value.count > 0 => {
                let latest = found.value.items.last().and_then(|page| page.upper.as_deref());
                Ok(ServiceResult::taken(latest.map_or_else(
                    || "Package exists".to_owned(),
                    |version| format!("{name} {version}"),
                )))
            }
            Ok(_) => Ok(ServiceResult::not_found("No package found")),
            Err(FetchError::Http { status: 404 }) => {
                let url = format!(
                    "{SEARCH}?q={}&prerelease=false&take=3",
                    encode(name.as_str())
                );
                let found = transport
                    .fetch_json::<SearchResponse>(&url, Route::DIRECT)
                    .map_err(AdapterError::search)?;
                let provenance = found.provenance_note();
                let examples = found.value.data.into_iter().filter_map(|hit| hit.id).collect();
                Ok(search_outcome(
                    found.value.total_hits,
                    examples,
                    provenance,
                    "No package found",
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}
