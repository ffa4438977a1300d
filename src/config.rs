//! Layered configuration: built-in defaults, config files, then environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

use crate::service::ServiceKey;
use crate::transport::{Client, REQUEST_TIMEOUT, Transport};

/// Project-level config file, looked up in the working directory.
pub const PROJECT_FILE: &str = "nametrace.toml";

/// Prefix for environment overrides, e.g. `NAMETRACE_HTTP__TIMEOUT_SECS`.
pub const ENV_PREFIX: &str = "NAMETRACE_";

/// Everything `nametrace` reads from config files and the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP behaviour.
    pub http: HttpConfig,
    /// Services queried when none are named on the command line.
    pub services: Vec<ServiceKey>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            services: ServiceKey::ALL.to_vec(),
        }
    }
}

/// The `[http]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Global per-request timeout, in seconds.
    pub timeout_secs: u64,
    /// Whether relays may be used at all.
    pub relays: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: REQUEST_TIMEOUT.as_secs(),
            relays: true,
        }
    }
}

impl Config {
    /// Merge every source, later ones winning:
    ///
    /// 1. Built-in defaults
    /// 2. Global: `$XDG_CONFIG_HOME/nametrace/config.toml`
    /// 3. Project: `./nametrace.toml`
    /// 4. `explicit`, when given (must exist)
    /// 5. `NAMETRACE_*` environment variables, `__` separating tables
    ///
    /// # Errors
    ///
    /// Returns the figment error when a file is malformed, a value has the
    /// wrong type, or `explicit` does not exist.
    pub fn load(explicit: Option<&Path>) -> Result<Self, Box<figment::Error>> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        if let Some(global) = global_config_path() {
            if global.exists() {
                figment = figment.merge(Toml::file(global));
            }
        }

        let project = PathBuf::from(PROJECT_FILE);
        if project.exists() {
            figment = figment.merge(Toml::file(project));
        }

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Box::new(figment::Error::from(format!(
                    "config file not found: {}",
                    path.display()
                ))));
            }
            figment = figment.merge(Toml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .map_err(Box::new)
    }

    /// The configured request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// A transport honouring the timeout and relay settings.
    #[must_use]
    pub fn transport(&self) -> Transport {
        Transport::new(Client::with_timeout(self.timeout())).with_relays(self.http.relays)
    }
}

/// `$XDG_CONFIG_HOME/nametrace/config.toml`, or the platform equivalent.
#[must_use]
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nametrace").join("config.toml"))
}
