/*!
 * Placeholder preservation.
 *
 * Format placeholders (`{0}`, `{{actor}}`) are filled in by the host at
 * runtime, so each one in the source must survive translation.
 */

use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::issues::Finding;

/// Regex for matching positional and named placeholders
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\w+\}\}|\{\d+\}").expect("Invalid placeholder regex")
});

/// Distinct placeholders in a text
pub fn placeholders(text: &str) -> BTreeSet<&str> {
    PLACEHOLDER_REGEX
        .find_iter(text)
        .map(|m| m.as_str())
        .collect()
}

/// One error per missing placeholder, one warning per unexpected one
pub fn check(source: &str, translation: &str) -> Vec<Finding> {
    let expected = placeholders(source);
    let found = placeholders(translation);

    let missing = expected
        .difference(&found)
        .map(|token| Finding::error(format!("Missing placeholder {}", token)));
    let extra = found
        .difference(&expected)
        .map(|token| Finding::warning(format!("Unexpected placeholder {}", token)));

    missing.chain(extra).collect()
}
