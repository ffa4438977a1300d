//! RubyGems.

use serde::Deserialize;

use super::{encode, search_outcome};
use crate::error::{AdapterError, FetchError};
use crate::result::{ProjectName, ServiceResult};
use crate::service::{Adapter, ServiceKey};
use crate::transport::{Route, Transport};

const API: &str = "https://rubygems.org/api/v1";

/// The RubyGems adapter.
#[derive(Debug, Clone, Copy, Default)]
pub struct RubyGems;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Gem {
    name: Option<String>,
    version: Option<String>,
}

impl Adapter for RubyGems {
    fn key(&self) -> ServiceKey {
        ServiceKey::Rubygems
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let url = format!("{API}/gems/{}.json", encode(name.as_str()));
        match transport.fetch_json::<Gem>(&url, Route::DIRECT) {
            Ok(found) => Ok(ServiceResult::taken(found.value.version.map_or_else(
                || format!("{name} exists"),
                |version| format!("{name} {version}"),
            ))),
            Err(FetchError::Http { status: 404 }) => {
                let url = format!("{API}/search.json?query={}", encode(name.as_str()));
                // The search endpoint returns a bare array of gems, one page.
                let found = transport
                    .fetch_json::<Vec<Gem>>(&url, Route::DIRECT)
                    .map_err(AdapterError::search)?;
                let provenance = found.provenance_note();
                let total = found.value.len() as u64;
                let examples = found.value.into_iter().filter_map(|gem| gem.name).collect();
                Ok(search_outcome(total, examples, provenance, "No gem found"))
            }
            Err(e) => Err(e.into()),
        }
    }
}
