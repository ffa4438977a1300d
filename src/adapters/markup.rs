//! Anchored extraction from semi-structured markup (Atom XML, HTML pages).

use regex::Regex;

/// Number of non-overlapping occurrences of a literal fragment.
pub(super) fn count_literal(haystack: &str, needle: &str) -> usize {
    haystack.matches(needle).count()
}

/// Trimmed first capture group of every match of `pattern`, skipping blanks
/// and anything `keep` rejects, up to `limit` items.
pub(super) fn inner_texts(
    haystack: &str,
    pattern: &Regex,
    limit: usize,
    keep: impl Fn(&str) -> bool,
) -> Vec<String> {
    pattern
        .captures_iter(haystack)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|text| !text.is_empty() && keep(text))
        .take(limit)
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_literal_tags() {
        assert_eq!(count_literal("<entry>a</entry><entry>b</entry>", "<entry>"), 2);
        assert_eq!(count_literal("<entries>", "<entry>"), 0);
    }

    #[test]
    fn extracts_inner_text_with_filter() {
        let re = Regex::new(r"<b>([^<]+)</b>").unwrap();
        let texts = inner_texts("<b> one </b><b>skip</b><b>two</b><b>three</b>", &re, 2, |t| {
            t != "skip"
        });
        assert_eq!(texts, vec!["one", "two"]);
    }
}
