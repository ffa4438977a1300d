//! HTTP plumbing: a blocking client seam, relay endpoints, and the
//! direct-then-relay fetch strategy every adapter goes through.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use ureq::Agent;

use crate::error::{FetchError, TransportError};

/// Default global timeout for a single HTTP exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const ALLORIGINS_BASE: &str = "https://api.allorigins.win/raw?url=";
const JINA_BASE: &str = "https://r.jina.ai/http://";

/// A raw HTTP response: status code and body text, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Response status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Build a response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is 2xx.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// The seam between the fetch strategy and an actual HTTP stack.
///
/// Implementations return `Ok` for every response the server produced,
/// including non-2xx ones, and `Err` only when no response arrived.
pub trait HttpGet: Send + Sync {
    /// Issue a GET request.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request produced no response.
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// An HTTP client backed by a `ureq` agent.
///
/// Non-2xx responses come back as ordinary [`HttpResponse`]s; only a
/// missing response is an error.
#[derive(Debug, Clone)]
pub struct Client {
    agent: Agent,
}

impl Client {
    /// Create a client with the default timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    /// Create a client with a custom global timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .build();
        Self {
            agent: Agent::new_with_config(config),
        }
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpGet for Client {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let mut response = self.agent.get(url).call()?;
        let status = response.status().as_u16();
        let body = response.body_mut().read_to_string()?;
        Ok(HttpResponse { status, body })
    }
}

/// A third-party service that re-issues a request server-side and returns
/// the body verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relay {
    /// `api.allorigins.win`: takes the fully percent-encoded target URL.
    AllOrigins,
    /// `r.jina.ai`: takes the target URL with its scheme stripped.
    Jina,
}

impl Relay {
    /// The relay URL that fetches `target`.
    ///
    /// ```
    /// use nametrace::transport::Relay;
    /// assert_eq!(
    ///     Relay::Jina.wrap("https://example.com/a?b=c"),
    ///     "https://r.jina.ai/http://example.com/a?b=c"
    /// );
    /// assert_eq!(
    ///     Relay::AllOrigins.wrap("https://example.com/?q=1"),
    ///     "https://api.allorigins.win/raw?url=https%3A%2F%2Fexample.com%2F%3Fq%3D1"
    /// );
    /// ```
    #[must_use]
    pub fn wrap(self, target: &str) -> String {
        match self {
            Self::AllOrigins => format!("{ALLORIGINS_BASE}{}", urlencoding::encode(target)),
            Self::Jina => {
                let bare = target
                    .strip_prefix("https://")
                    .or_else(|| target.strip_prefix("http://"))
                    .unwrap_or(target);
                format!("{JINA_BASE}{bare}")
            }
        }
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllOrigins => write!(f, "allorigins"),
            Self::Jina => write!(f, "jina"),
        }
    }
}

/// How a logical request is routed: which relays back it up, and whether
/// the direct attempt is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    prefer_relay: bool,
    relays: &'static [Relay],
}

impl Route {
    /// Direct request only; a transport failure is final.
    pub const DIRECT: Self = Self {
        prefer_relay: false,
        relays: &[],
    };

    /// Direct request, falling back to `relays` on transport failure.
    #[must_use]
    pub const fn with_fallback(relays: &'static [Relay]) -> Self {
        Self {
            prefer_relay: false,
            relays,
        }
    }

    /// Skip the direct request and go straight to `relays`.
    #[must_use]
    pub const fn prefer_relay(relays: &'static [Relay]) -> Self {
        Self {
            prefer_relay: true,
            relays,
        }
    }
}

/// A fetched body plus its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    /// The decoded body.
    pub value: T,
    /// The relay that served the body, or `None` for a direct response.
    pub via: Option<Relay>,
}

impl<T> Fetched<T> {
    /// Whether the body came through a relay.
    #[must_use]
    pub const fn via_relay(&self) -> bool {
        self.via.is_some()
    }

    /// Suffix to append to `details` for relayed bodies.
    #[must_use]
    pub const fn provenance_note(&self) -> &'static str {
        if self.via_relay() { " (via relay)" } else { "" }
    }
}

/// The fetch strategy shared by all adapters.
#[derive(Clone)]
pub struct Transport {
    client: Arc<dyn HttpGet>,
    relays_enabled: bool,
}

impl fmt::Debug for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transport")
            .field("relays_enabled", &self.relays_enabled)
            .finish_non_exhaustive()
    }
}

impl Transport {
    /// Wrap an HTTP client. Relays are enabled.
    pub fn new(client: impl HttpGet + 'static) -> Self {
        Self::from_arc(Arc::new(client))
    }

    /// Wrap a shared HTTP client. Relays are enabled.
    #[must_use]
    pub fn from_arc(client: Arc<dyn HttpGet>) -> Self {
        Self {
            client,
            relays_enabled: true,
        }
    }

    /// Enable or disable relays. With relays disabled every route behaves
    /// like [`Route::DIRECT`].
    #[must_use]
    pub fn with_relays(mut self, enabled: bool) -> Self {
        self.relays_enabled = enabled;
        self
    }

    /// Issue one GET and classify the outcome. Exposes the raw status for
    /// probes that only care about it.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] when no response arrived.
    pub fn probe_status(&self, url: &str) -> Result<u16, FetchError> {
        debug!(url, "probe");
        Ok(self.client.get(url)?.status)
    }

    /// Fetch `url` as text following `route`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] for a non-2xx direct response, and the
    /// last relay failure when the relay chain is exhausted.
    pub fn fetch_text(&self, url: &str, route: Route) -> Result<Fetched<String>, FetchError> {
        let relays: &[Relay] = if self.relays_enabled { route.relays } else { &[] };

        if !(route.prefer_relay && !relays.is_empty()) {
            debug!(url, "direct request");
            match self.client.get(url) {
                Ok(response) if response.is_success() => {
                    return Ok(Fetched {
                        value: response.body,
                        via: None,
                    });
                }
                Ok(response) => {
                    return Err(FetchError::Http {
                        status: response.status,
                    });
                }
                Err(e) if relays.is_empty() => return Err(e.into()),
                Err(e) => warn!(url, error = %e, "direct request failed, trying relays"),
            }
        }

        self.through_relays(url, relays)
    }

    /// Fetch `url` and decode the body as JSON following `route`.
    ///
    /// # Errors
    ///
    /// As [`fetch_text`](Self::fetch_text), plus [`FetchError::Parse`] when
    /// the body does not decode into `T`.
    pub fn fetch_json<T: DeserializeOwned>(
        &self,
        url: &str,
        route: Route,
    ) -> Result<Fetched<T>, FetchError> {
        let fetched = self.fetch_text(url, route)?;
        let value = serde_json::from_str(&fetched.value).map_err(FetchError::parse)?;
        Ok(Fetched {
            value,
            via: fetched.via,
        })
    }

    fn through_relays(&self, url: &str, relays: &[Relay]) -> Result<Fetched<String>, FetchError> {
        let mut last = FetchError::Transport(TransportError::new("no relay configured"));
        for &relay in relays {
            let relayed = relay.wrap(url);
            debug!(url, %relay, "relay request");
            match self.client.get(&relayed) {
                Ok(response) if response.is_success() => {
                    return Ok(Fetched {
                        value: response.body,
                        via: Some(relay),
                    });
                }
                Ok(response) => {
                    last = FetchError::Http {
                        status: response.status,
                    };
                }
                Err(e) => last = e.into(),
            }
            debug!(url, %relay, error = %last, "relay failed");
        }
        Err(last)
    }
}
