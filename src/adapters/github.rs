//! GitHub repository search, and the Homebrew approximation built on it.

use serde::Deserialize;

use super::encode;
use crate::error::{AdapterError, FetchError};
use crate::result::{BEST_EFFORT, ProjectName, ServiceResult, ServiceStatus};
use crate::service::{Adapter, DetailFormatter, ServiceKey};
use crate::transport::{Route, Transport};

const SEARCH_API: &str = "https://api.github.com/search/repositories";

/// The GitHub adapter: the load-bearing code-hosting signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Github;

/// The Homebrew adapter. Homebrew has no name-lookup API reachable without
/// cloning its taps, so presence is inferred from GitHub repositories whose
/// names mention both `brew` and the project.
#[derive(Debug, Clone, Copy, Default)]
pub struct Homebrew;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RepoSearch {
    total_count: u64,
    items: Vec<Repo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Repo {
    name: Option<String>,
}

impl RepoSearch {
    fn names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|repo| repo.name.as_deref())
    }
}

/// Search repositories by name. GitHub answers rate limiting with 403 (or
/// 429 for secondary limits); both surface as a dedicated diagnostic.
fn search_repositories(transport: &Transport, term: &str) -> Result<RepoSearch, SearchFailure> {
    let url = format!("{SEARCH_API}?q={}", encode(&format!("{term} in:name")));
    match transport.fetch_json::<RepoSearch>(&url, Route::DIRECT) {
        Ok(found) => Ok(found.value),
        Err(FetchError::Http {
            status: 403 | 429,
        }) => Err(SearchFailure::RateLimited),
        Err(e) => Err(SearchFailure::Fetch(e.into())),
    }
}

enum SearchFailure {
    RateLimited,
    Fetch(AdapterError),
}

impl SearchFailure {
    fn details(self) -> String {
        match self {
            Self::RateLimited => "Rate limit exceeded".to_owned(),
            Self::Fetch(e) => e.to_string(),
        }
    }
}

impl Github {
    fn classify(name: &ProjectName, found: &RepoSearch) -> ServiceResult {
        let exact = found
            .names()
            .any(|repo| repo.to_lowercase() == name.as_str());
        let examples: Vec<String> = found.names().take(3).map(str::to_owned).collect();
        let total = found.total_count;

        let details = if exact {
            "Exact repo name exists".to_owned()
        } else if total > 0 {
            format!("{total} repos")
        } else {
            "No repositories found".to_owned()
        };
        let status = if exact {
            ServiceStatus::Taken
        } else if total > 0 {
            ServiceStatus::Similar
        } else {
            ServiceStatus::NotFound
        };

        ServiceResult::new(status, details)
            .with_count(total)
            .with_examples(examples)
            .with_exact(exact)
    }
}

impl Adapter for Github {
    fn key(&self) -> ServiceKey {
        ServiceKey::Github
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        match search_repositories(transport, name.as_str()) {
            Ok(found) => Ok(Self::classify(name, &found)),
            Err(SearchFailure::Fetch(e)) => Err(e),
            Err(limited @ SearchFailure::RateLimited) => Ok(self.degraded(limited.details())),
        }
    }

    fn degraded(&self, details: String) -> ServiceResult {
        ServiceResult::unknown(details)
            .with_count(0)
            .with_exact(false)
    }
}

impl DetailFormatter for Github {
    fn format_details(&self, result: &ServiceResult) -> String {
        if result.status == ServiceStatus::Unknown {
            return result.details.clone();
        }
        let count = match result.count_or_zero() {
            0 => result.details.clone(),
            n => format!("{n} repos"),
        };
        if result.examples.is_empty() {
            count
        } else {
            format!("{count} · Examples: {}", result.examples.join(", "))
        }
    }
}

impl Adapter for Homebrew {
    fn key(&self) -> ServiceKey {
        ServiceKey::Homebrew
    }

    fn lookup(
        &self,
        transport: &Transport,
        name: &ProjectName,
    ) -> Result<ServiceResult, AdapterError> {
        let found = match search_repositories(transport, &format!("brew {name}")) {
            Ok(found) => found,
            Err(SearchFailure::Fetch(e)) => return Err(e),
            Err(limited @ SearchFailure::RateLimited) => {
                return Ok(self.degraded(limited.details()));
            }
        };

        let total = found.total_count;
        let result = if total == 0 {
            ServiceResult::not_found("Not found (best-effort)")
        } else {
            let examples = found.names().map(str::to_owned).collect();
            ServiceResult::similar(format!("{total} results (best-effort)"), total, examples)
        };
        Ok(result.with_note(BEST_EFFORT))
    }

    fn degraded(&self, details: String) -> ServiceResult {
        ServiceResult::unknown(details).with_note(BEST_EFFORT)
    }
}
