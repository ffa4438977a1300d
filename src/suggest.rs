//! Alternative names, each confirmed free on crates.io before it is offered.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::adapters::crates;
use crate::risk::RiskLevel;
use crate::transport::Transport;

/// Most suggestions ever returned.
pub const MAX_SUGGESTIONS: usize = 5;

/// Name decorations, applied in this order.
const TEMPLATES: &[fn(&str) -> String] = &[
    |name| format!("{name}-rs"),
    |name| format!("git-{name}"),
    |name| format!("{name}-cli"),
    |name| format!("{name}-dev"),
    |name| format!("{name}x"),
];

/// The outcome of suggestion generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "names", rename_all = "snake_case")]
pub enum Suggestions {
    /// Risk is low; nothing was probed.
    NotNeeded,
    /// Every candidate is already taken (or could not be confirmed free).
    NoneAvailable,
    /// Confirmed-available candidates, in template order.
    Available(Vec<String>),
}

/// Candidate names for `name`, deduplicated in first-occurrence order.
///
/// ```
/// use nametrace::suggest::candidates;
/// assert_eq!(
///     candidates("foo"),
///     vec!["foo-rs", "git-foo", "foo-cli", "foo-dev", "foox"]
/// );
/// ```
#[must_use]
pub fn candidates(name: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names: Vec<String> = TEMPLATES.iter().map(|template| template(name)).collect();
    names.retain(|candidate| seen.insert(candidate.clone()));
    names
}

/// Suggest alternatives to `name` given its risk verdict.
///
/// Candidates are probed concurrently against crates.io; only those with an
/// affirmative not-found answer are kept.
#[must_use]
pub fn suggest(transport: &Transport, name: &str, risk: RiskLevel) -> Suggestions {
    if risk == RiskLevel::Low {
        return Suggestions::NotNeeded;
    }

    let candidates = candidates(name);
    let available: Vec<bool> = std::thread::scope(|s| {
        let handles: Vec<_> = candidates
            .iter()
            .map(|candidate| s.spawn(move || crates::is_available(transport, candidate)))
            .collect();
        // A panicked probe counts as unconfirmed.
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or(false))
            .collect()
    });

    let kept: Vec<String> = candidates
        .into_iter()
        .zip(available)
        .filter_map(|(candidate, free)| free.then_some(candidate))
        .take(MAX_SUGGESTIONS)
        .collect();
    debug!(name, kept = kept.len(), "suggestions probed");

    if kept.is_empty() {
        Suggestions::NoneAvailable
    } else {
        Suggestions::Available(kept)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::transport::testing::FakeClient;

    fn crate_url(name: &str) -> String {
        format!("https://crates.io/api/v1/crates/{name}")
    }

    #[test]
    fn candidates_cover_every_template() {
        let names = candidates("foo");
        for expected in ["foo-rs", "git-foo", "foo-cli", "foo-dev", "foox"] {
            assert!(names.contains(&expected.to_owned()), "missing {expected}");
        }
    }

    #[test]
    fn low_risk_probes_nothing() {
        let client = Arc::new(FakeClient::new());
        let transport = Transport::new(Arc::clone(&client));
        assert_eq!(
            suggest(&transport, "foo", RiskLevel::Low),
            Suggestions::NotNeeded
        );
        assert!(client.calls().is_empty());
    }

    #[test]
    fn keeps_available_in_template_order() {
        let client = FakeClient::new()
            .reply(crate_url("foo-rs"), 200, "{}")
            .reply(crate_url("git-foo"), 404, "")
            .reply(crate_url("foo-cli"), 200, "{}")
            .reply(crate_url("foo-dev"), 404, "")
            .reply(crate_url("foox"), 404, "");
        let transport = Transport::new(client);
        assert_eq!(
            suggest(&transport, "foo", RiskLevel::High),
            Suggestions::Available(vec!["git-foo".into(), "foo-dev".into(), "foox".into()])
        );
    }

    #[test]
    fn all_taken_is_explicit() {
        let client = candidates("foo")
            .iter()
            .fold(FakeClient::new(), |client, name| {
                client.reply(crate_url(name), 200, "{}")
            });
        let transport = Transport::new(client);
        assert_eq!(
            suggest(&transport, "foo", RiskLevel::Medium),
            Suggestions::NoneAvailable
        );
    }

    #[test]
    fn unreachable_registry_suggests_nothing() {
        let transport = Transport::new(FakeClient::new());
        assert_eq!(
            suggest(&transport, "foo", RiskLevel::High),
            Suggestions::NoneAvailable
        );
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn candidates_are_unique(name in "[a-z0-9-]{0,12}") {
                let names = candidates(&name);
                let unique: HashSet<&String> = names.iter().collect();
                prop_assert_eq!(unique.len(), names.len());
            }

            #[test]
            fn candidates_contain_the_name(name in "[a-z][a-z0-9-]{0,12}") {
                for candidate in candidates(&name) {
                    prop_assert!(candidate.contains(&name));
                }
            }
        }
    }
}
