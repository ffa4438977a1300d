//! The fixed set of services and the adapter interfaces they implement.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::adapters;
use crate::error::{AdapterError, CheckError};
use crate::result::{ProjectName, ServiceResult};
use crate::transport::Transport;

/// Every service `nametrace` knows how to query.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKey {
    /// crates.io (load-bearing)
    Crates,
    /// GitHub repository search (load-bearing)
    Github,
    /// Homebrew, approximated through GitHub repository names
    Homebrew,
    /// npm registry
    Npm,
    /// NuGet gallery
    Nuget,
    /// PowerShell Gallery
    Powershell,
    /// Python Package Index
    Pypi,
    /// RubyGems
    Rubygems,
    /// Maven Central
    Maven,
}

impl ServiceKey {
    /// All services, in display order.
    pub const ALL: [Self; 9] = [
        Self::Crates,
        Self::Github,
        Self::Homebrew,
        Self::Npm,
        Self::Nuget,
        Self::Powershell,
        Self::Pypi,
        Self::Rubygems,
        Self::Maven,
    ];

    /// The stable key used in config files and JSON output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Crates => "crates",
            Self::Github => "github",
            Self::Homebrew => "homebrew",
            Self::Npm => "npm",
            Self::Nuget => "nuget",
            Self::Powershell => "powershell",
            Self::Pypi => "pypi",
            Self::Rubygems => "rubygems",
            Self::Maven => "maven",
        }
    }

    /// Human-facing service name.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crates => "crates.io",
            Self::Github => "GitHub",
            Self::Homebrew => "Homebrew",
            Self::Npm => "npm",
            Self::Nuget => "NuGet",
            Self::Powershell => "PowerShell Gallery",
            Self::Pypi => "PyPI",
            Self::Rubygems => "RubyGems",
            Self::Maven => "Maven Central",
        }
    }

    /// The adapter implementing this service.
    #[must_use]
    pub fn adapter(self) -> &'static dyn Adapter {
        match self {
            Self::Crates => &adapters::crates::Crates,
            Self::Github => &adapters::github::Github,
            Self::Homebrew => &adapters::github::Homebrew,
            Self::Npm => &adapters::npm::Npm,
            Self::Nuget => &adapters::nuget::NuGet,
            Self::Powershell => &adapters::powershell::PowerShellGallery,
            Self::Pypi => &adapters::pypi::PyPi,
            Self::Rubygems => &adapters::rubygems::RubyGems,
            Self::Maven => &adapters::maven::MavenCentral,
        }
    }

    /// The service-specific details formatter, if it has one.
    #[must_use]
    pub fn formatter(self) -> Option<&'static dyn DetailFormatter> {
        match self {
            Self::Github => Some(&adapters::github::Github),
            _ => None,
        }
    }

    /// Display text for a result of this service: the formatter's output when
    /// one exists, the raw `details` otherwise.
    #[must_use]
    pub fn display_details(self, result: &ServiceResult) -> String {
        self.formatter().map_or_else(
            || result.details.clone(),
            |formatter| formatter.format_details(result),
        )
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceKey {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == wanted)
            .ok_or_else(|| CheckError::UnknownService(s.to_owned()))
    }
}

/// Translates one service's responses into a [`ServiceResult`].
pub trait Adapter: Send + Sync {
    /// The service this adapter answers for.
    fn key(&self) -> ServiceKey;

    /// Query the service. Errors are reported to [`check`](Self::check),
    /// which turns them into an `unknown` result.
    ///
    /// # Errors
    ///
    /// Returns an [`AdapterError`] naming the failed stage.
    fn lookup(&self, transport: &Transport, name: &ProjectName)
    -> Result<ServiceResult, AdapterError>;

    /// Check `name` on this service. Never fails: every error degrades to
    /// [`ServiceStatus::Unknown`](crate::result::ServiceStatus::Unknown) with a short diagnostic.
    fn check(&self, transport: &Transport, name: &ProjectName) -> ServiceResult {
        let key = self.key();
        match self.lookup(transport, name) {
            Ok(result) => {
                debug!(service = %key, %name, status = %result.status, "check settled");
                result
            }
            Err(e) => {
                warn!(service = %key, %name, error = %e, "check degraded to unknown");
                self.degraded(e.to_string())
            }
        }
    }

    /// The `unknown` result this adapter reports on failure.
    fn degraded(&self, details: String) -> ServiceResult {
        ServiceResult::unknown(details)
    }
}

/// Formats a service's result for display when the raw `details` string is
/// not enough.
pub trait DetailFormatter: Send + Sync {
    /// Display text for `result`.
    fn format_details(&self, result: &ServiceResult) -> String;
}
