#![warn(missing_docs, missing_debug_implementations)]

//! Check whether a project name is already in use before you commit to it.
//!
//! A name is looked up concurrently on crates.io, GitHub, Homebrew, npm,
//! NuGet, the PowerShell Gallery, PyPI, RubyGems and Maven Central. Each
//! service reports `taken`, `similar`, `not_found` or `unknown`; a network
//! failure never fails the whole check. Once crates.io and GitHub have both
//! answered, a collision risk is assessed, and for risky names a handful of
//! alternatives confirmed free on crates.io are suggested.
//!
//! Some registries refuse direct reads, so requests can be routed through
//! public relays. Results obtained that way carry a `(via relay)` note.
//!
//! # Example
//!
//! ```no_run
//! use nametrace::engine::Engine;
//! use nametrace::service::ServiceKey;
//! use nametrace::session::Update;
//! use nametrace::transport::{Client, Transport};
//!
//! let engine = Engine::new(Transport::new(Client::new()));
//! let session = engine.check_name("my-cool-tool", ServiceKey::ALL)?;
//! for update in session {
//!     match update {
//!         Update::Settled { key, result } => println!("{key}: {}", result.details),
//!         Update::Verdict(verdict) => println!("risk: {}", verdict.risk_level),
//!         Update::Suggestions(suggestions) => println!("{suggestions:?}"),
//!     }
//! }
//! # Ok::<(), nametrace::error::CheckError>(())
//! ```

pub mod adapters;
pub mod config;
pub mod engine;
pub mod error;
pub mod result;
pub mod risk;
pub mod service;
pub mod session;
pub mod suggest;
pub mod transport;
