//! Folding a run's events into a live results map, a one-shot risk verdict
//! and suggestions.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::Serialize;
use tracing::{debug, info};

use crate::engine::{CheckRun, Event, RunStatus};
use crate::result::{AggregateResult, ProjectName, QueryRequest, ServiceResult, ServiceStatus};
use crate::risk::{self, RiskLevel};
use crate::service::ServiceKey;
use crate::suggest::Suggestions;

/// Folds settled results for one request and latches the verdict.
#[derive(Debug, Clone)]
pub struct Aggregator {
    name: ProjectName,
    checks: BTreeMap<ServiceKey, ServiceResult>,
    settled: BTreeSet<ServiceKey>,
    verdict: Option<AggregateResult>,
}

impl Aggregator {
    /// Start with every enabled service showing the `Checking...` sentinel.
    #[must_use]
    pub fn new(request: &QueryRequest) -> Self {
        Self {
            name: request.name().clone(),
            checks: request
                .services()
                .iter()
                .map(|&key| (key, ServiceResult::checking()))
                .collect(),
            settled: BTreeSet::new(),
            verdict: None,
        }
    }

    /// Record one settled result.
    ///
    /// Returns the verdict the first time both crates.io and GitHub have
    /// settled, and `None` on every other call.
    pub fn apply(&mut self, key: ServiceKey, result: ServiceResult) -> Option<&AggregateResult> {
        self.checks.insert(key, result);
        self.settled.insert(key);

        if self.verdict.is_some() {
            return None;
        }
        let registry = self.settled_result(ServiceKey::Crates)?;
        let codehost = self.settled_result(ServiceKey::Github)?;

        let verdict = AggregateResult {
            name: self.name.clone(),
            checks: self
                .checks
                .iter()
                .filter(|(key, _)| self.settled.contains(key))
                .map(|(&key, result)| (key, result.clone()))
                .collect(),
            risk_level: risk::classify(registry, codehost),
            reasons: risk::reasons(registry, codehost),
        };
        info!(name = %self.name, risk = %verdict.risk_level, "risk assessed");
        self.verdict = Some(verdict);
        self.verdict.as_ref()
    }

    fn settled_result(&self, key: ServiceKey) -> Option<&ServiceResult> {
        if self.settled.contains(&key) {
            self.checks.get(&key)
        } else {
            None
        }
    }

    /// The live view: settled results plus sentinels for the rest.
    #[must_use]
    pub const fn checks(&self) -> &BTreeMap<ServiceKey, ServiceResult> {
        &self.checks
    }

    /// The verdict, once latched.
    #[must_use]
    pub const fn verdict(&self) -> Option<&AggregateResult> {
        self.verdict.as_ref()
    }

    /// Whether `key` has settled.
    #[must_use]
    pub fn is_settled(&self, key: ServiceKey) -> bool {
        self.settled.contains(&key)
    }
}

/// A change a presentation layer should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// A service settled.
    Settled {
        /// The service.
        key: ServiceKey,
        /// Its result.
        result: ServiceResult,
    },
    /// The risk verdict was computed.
    Verdict(AggregateResult),
    /// Suggestions are ready.
    Suggestions(Suggestions),
}

/// One user-initiated check in progress.
///
/// Iterating yields [`Update`]s until every adapter (and the suggestion
/// probe, if one was started) has reported. Once a newer run starts on the
/// same engine, remaining events are discarded.
#[derive(Debug)]
pub struct CheckSession {
    request: QueryRequest,
    run: CheckRun,
    aggregator: Aggregator,
    suggestions: Option<Suggestions>,
    pending: VecDeque<Update>,
}

impl CheckSession {
    pub(crate) fn new(request: QueryRequest, run: CheckRun) -> Self {
        Self {
            aggregator: Aggregator::new(&request),
            request,
            run,
            suggestions: None,
            pending: VecDeque::new(),
        }
    }

    /// The validated request.
    #[must_use]
    pub const fn request(&self) -> &QueryRequest {
        &self.request
    }

    /// Request-scoped status.
    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.run.status()
    }

    /// The live results map.
    #[must_use]
    pub const fn checks(&self) -> &BTreeMap<ServiceKey, ServiceResult> {
        self.aggregator.checks()
    }

    /// The verdict, once latched.
    #[must_use]
    pub const fn verdict(&self) -> Option<&AggregateResult> {
        self.aggregator.verdict()
    }

    fn absorb(&mut self, event: Event) {
        match event {
            Event::Settled { key, result } => {
                let verdict = self.aggregator.apply(key, result.clone()).cloned();
                self.pending.push_back(Update::Settled { key, result });
                if let Some(verdict) = verdict {
                    if verdict.risk_level == RiskLevel::Low {
                        self.suggestions = Some(Suggestions::NotNeeded);
                        self.pending.push_back(Update::Verdict(verdict));
                        self.pending
                            .push_back(Update::Suggestions(Suggestions::NotNeeded));
                    } else {
                        self.run.spawn_suggestions(&verdict.name, verdict.risk_level);
                        self.pending.push_back(Update::Verdict(verdict));
                    }
                }
            }
            Event::Suggested(suggestions) => {
                self.suggestions = Some(suggestions.clone());
                self.pending.push_back(Update::Suggestions(suggestions));
            }
        }
    }

    /// Drain the session and return the final report.
    #[must_use]
    pub fn finish(mut self) -> Report {
        while self.next().is_some() {}
        Report {
            name: self.request.name().clone(),
            checks: self.aggregator.checks().clone(),
            verdict: self.aggregator.verdict().cloned(),
            suggestions: self.suggestions,
        }
    }
}

impl Iterator for CheckSession {
    type Item = Update;

    fn next(&mut self) -> Option<Update> {
        loop {
            if let Some(update) = self.pending.pop_front() {
                return Some(update);
            }
            let event = self.run.next()?;
            if !self.run.is_current() {
                debug!(generation = self.run.generation(), "discarding superseded event");
                continue;
            }
            self.absorb(event);
        }
    }
}

/// Everything known about a request once its session has drained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    /// The normalized name.
    pub name: ProjectName,
    /// Final result per enabled service.
    pub checks: BTreeMap<ServiceKey, ServiceResult>,
    /// The verdict, absent when crates.io or GitHub was not enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<AggregateResult>,
    /// Suggestions, absent when no verdict was reached.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Suggestions>,
}

impl Report {
    /// Whether the name looks risky: a verdict above low, or any service
    /// reporting an exact match.
    #[must_use]
    pub fn has_collision(&self) -> bool {
        let risky = self
            .verdict
            .as_ref()
            .is_some_and(|verdict| verdict.risk_level > RiskLevel::Low);
        risky
            || self
                .checks
                .values()
                .any(|result| result.status == ServiceStatus::Taken)
    }
}
