//! Concurrent fan-out of adapter checks and fan-in of their results.

use std::collections::BTreeSet;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{debug, error};

use crate::error::CheckError;
use crate::result::{ProjectName, QueryRequest, ServiceResult};
use crate::risk::RiskLevel;
use crate::service::ServiceKey;
use crate::session::CheckSession;
use crate::suggest::{self, Suggestions};
use crate::transport::Transport;

/// Something a run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// One adapter settled.
    Settled {
        /// The service that answered.
        key: ServiceKey,
        /// Its result.
        result: ServiceResult,
    },
    /// Suggestion probing finished.
    Suggested(Suggestions),
}

/// Runs checks. Each run gets a generation number; starting a run makes
/// every earlier run from the same engine stale.
#[derive(Debug, Clone)]
pub struct Engine {
    transport: Arc<Transport>,
    latest: Arc<AtomicU64>,
}

impl Engine {
    /// Build an engine over a transport.
    #[must_use]
    pub fn new(transport: Transport) -> Self {
        Self {
            transport: Arc::new(transport),
            latest: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fire every service in `services` concurrently for `name`.
    ///
    /// The returned run yields exactly one [`Event::Settled`] per service,
    /// in completion order.
    #[must_use]
    pub fn run_checks(&self, name: &ProjectName, services: &BTreeSet<ServiceKey>) -> CheckRun {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let (tx, rx) = mpsc::channel();
        debug!(%name, generation, services = services.len(), "starting checks");

        for &key in services {
            spawn_check(Arc::clone(&self.transport), name.clone(), key, tx.clone());
        }

        CheckRun {
            generation,
            latest: Arc::clone(&self.latest),
            transport: Arc::clone(&self.transport),
            tx,
            rx,
            outstanding: services.len(),
        }
    }

    /// Validate a raw name and service selection and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`CheckError::EmptyName`] or [`CheckError::NoServices`] before
    /// any request is sent.
    pub fn check_name(
        &self,
        raw_name: &str,
        services: impl IntoIterator<Item = ServiceKey>,
    ) -> Result<CheckSession, CheckError> {
        let request = QueryRequest::new(raw_name, services)?;
        Ok(self.start(request))
    }

    /// Start a session for an already validated request.
    #[must_use]
    pub fn start(&self, request: QueryRequest) -> CheckSession {
        let run = self.run_checks(request.name(), request.services());
        CheckSession::new(request, run)
    }
}

fn spawn_check(
    transport: Arc<Transport>,
    name: ProjectName,
    key: ServiceKey,
    tx: Sender<Event>,
) {
    let fallback = tx.clone();
    let spawned = thread::Builder::new()
        .name(format!("check-{key}"))
        .spawn(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(|| {
                key.adapter().check(&transport, &name)
            }))
            .unwrap_or_else(|_| ServiceResult::unknown("Internal error"));
            if tx.send(Event::Settled { key, result }).is_err() {
                debug!(service = %key, "run dropped before check settled");
            }
        });
    if let Err(e) = spawned {
        error!(service = %key, error = %e, "could not spawn check thread");
        // The run still owes one event for this key.
        let result = ServiceResult::unknown("Internal error");
        fallback.send(Event::Settled { key, result }).ok();
    }
}

/// Lifecycle of a request, scoped to its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Events are still outstanding.
    Checking,
    /// Every event has been delivered.
    Complete,
    /// A newer run was started on the same engine.
    Superseded,
}

/// A started request. Iterate it to receive events as they happen.
#[derive(Debug)]
pub struct CheckRun {
    generation: u64,
    latest: Arc<AtomicU64>,
    transport: Arc<Transport>,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    outstanding: usize,
}

impl CheckRun {
    /// This run's generation number.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer run has been started on the engine.
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }

    /// Number of events not yet delivered.
    #[must_use]
    pub const fn outstanding(&self) -> usize {
        self.outstanding
    }

    /// Request-scoped status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        if !self.is_current() {
            RunStatus::Superseded
        } else if self.outstanding == 0 {
            RunStatus::Complete
        } else {
            RunStatus::Checking
        }
    }

    /// Probe suggestions for `name` in the background; the outcome arrives
    /// as an [`Event::Suggested`] on this run.
    pub fn spawn_suggestions(&mut self, name: &ProjectName, risk: RiskLevel) {
        let transport = Arc::clone(&self.transport);
        let tx = self.tx.clone();
        let name = name.clone();
        let spawned = thread::Builder::new()
            .name("suggest".to_owned())
            .spawn(move || {
                let suggestions = panic::catch_unwind(AssertUnwindSafe(|| {
                    suggest::suggest(&transport, name.as_str(), risk)
                }))
                .unwrap_or(Suggestions::NoneAvailable);
                tx.send(Event::Suggested(suggestions)).ok();
            });
        match spawned {
            Ok(_) => self.outstanding += 1,
            Err(e) => self.suggestions_unavailable(&e),
        }
    }

    /// Settle suggestions without probing; the run still owes the event.
    fn suggestions_unavailable(&mut self, e: &io::Error) {
        error!(error = %e, "could not spawn suggestion thread");
        if self
            .tx
            .send(Event::Suggested(Suggestions::NoneAvailable))
            .is_ok()
        {
            self.outstanding += 1;
        }
    }
}

impl Iterator for CheckRun {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.outstanding == 0 {
            return None;
        }
        // Every worker sends exactly once, panics included.
        let event = self.rx.recv().ok()?;
        self.outstanding -= 1;
        Some(event)
    }
}
