//! One adapter per service, plus the helpers they share.
//!
//! Every adapter follows the same skeleton: ask the exact-item endpoint, fall
//! back to a fuzzy search on the service's not-found signal, and map the
//! outcome into a [`ServiceResult`](crate::result::ServiceResult).

pub mod crates;
pub mod github;
pub mod maven;
pub mod npm;
pub mod nuget;
pub mod powershell;
pub mod pypi;
pub mod rubygems;

mod markup;

use std::borrow::Cow;

use crate::result::ServiceResult;

/// Examples shown inline in `details`.
const INLINE_EXAMPLES: usize = 2;
/// Longest example shown inline before it is shortened.
const MAX_EXAMPLE_LEN: usize = 40;

/// Percent-encode a value for a URL path segment or query parameter.
pub(crate) fn encode(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

/// `Examples: a, b` for the first two non-blank examples, each shortened to
/// 40 characters. Empty when there is nothing to show.
#[must_use]
pub fn format_examples(examples: &[String]) -> String {
    let shown: Vec<String> = examples
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .take(INLINE_EXAMPLES)
        .map(|item| {
            if item.chars().count() > MAX_EXAMPLE_LEN {
                let head: String = item.chars().take(MAX_EXAMPLE_LEN - 3).collect();
                format!("{head}…")
            } else {
                item.to_owned()
            }
        })
        .collect();

    if shown.is_empty() {
        String::new()
    } else {
        format!("Examples: {}", shown.join(", "))
    }
}

/// The result for a search that found `total` related names.
pub(crate) fn similar(total: u64, examples: Vec<String>, provenance: &str) -> ServiceResult {
    let summary = format!("{total} results{provenance}");
    let inline = format_examples(&examples);
    let details = if inline.is_empty() {
        summary
    } else {
        format!("{summary} · {inline}")
    };
    ServiceResult::similar(details, total, examples)
}

/// Turn a search outcome into `similar` or `not_found`.
pub(crate) fn search_outcome(
    total: u64,
    examples: Vec<String>,
    provenance: &str,
    none_found: &str,
) -> ServiceResult {
    if total > 0 {
        similar(total, examples, provenance)
    } else {
        ServiceResult::not_found(format!("{none_found}{provenance}"))
    }
}
