//! Error types shared by the transport, the adapters and the public API.

use std::fmt;

use thiserror::Error;

/// A transport-level failure: connection refused, DNS, TLS, timeout, or a
/// body that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
}

impl TransportError {
    /// Create a transport error from any displayable cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<ureq::Error> for TransportError {
    fn from(e: ureq::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Why a logical fetch did not produce a usable body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum FetchError {
    /// The server (or the last relay tried) answered with a non-2xx status.
    #[error("HTTP {status}")]
    Http {
        /// Response status code.
        status: u16,
    },
    /// The request never produced a response.
    #[error("network error: {0}")]
    Transport(#[from] TransportError),
    /// The body arrived but did not have the expected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl FetchError {
    /// Shorthand for a response-shape failure.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// The HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status } => Some(*status),
            _ => None,
        }
    }
}

/// Which request of an adapter failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The exact-item request.
    Lookup,
    /// The secondary fuzzy search.
    Search,
}

/// A fetch failure tagged with the adapter stage it happened in.
///
/// Its `Display` output is the short diagnostic placed in
/// [`ServiceResult::details`](crate::result::ServiceResult::details) when an
/// adapter degrades to `unknown`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", self.diagnostic())]
pub struct AdapterError {
    stage: Stage,
    #[source]
    source: FetchError,
}

impl AdapterError {
    /// Tag a failure of the secondary search.
    #[must_use]
    pub const fn search(source: FetchError) -> Self {
        Self {
            stage: Stage::Search,
            source,
        }
    }

    /// The stage that failed.
    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    fn diagnostic(&self) -> String {
        match (self.stage, &self.source) {
            (Stage::Lookup, FetchError::Http { status }) => format!("Error: {status}"),
            (Stage::Lookup, FetchError::Transport(_)) => "Network error".to_owned(),
            (Stage::Lookup, FetchError::Parse(_)) => "Unexpected response".to_owned(),
            (Stage::Search, FetchError::Http { status }) => format!("Search error: {status}"),
            (Stage::Search, FetchError::Transport(_)) => "Search error: network".to_owned(),
            (Stage::Search, FetchError::Parse(_)) => {
                "Search error: unexpected response".to_owned()
            }
        }
    }
}

impl From<FetchError> for AdapterError {
    fn from(source: FetchError) -> Self {
        Self {
            stage: Stage::Lookup,
            source,
        }
    }
}

/// Caller-level validation failures raised before any adapter runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CheckError {
    /// The name was empty after trimming.
    #[error("project name cannot be empty")]
    EmptyName,
    /// No service was enabled for the check.
    #[error("select at least one service to run checks")]
    NoServices,
    /// A service key was not recognised.
    #[error("unknown service `{0}`")]
    UnknownService(String),
}
