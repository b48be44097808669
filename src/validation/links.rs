/*!
 * Link integrity: the translation must carry exactly the source's links.
 */

use std::collections::BTreeMap;

use super::issues::Finding;
use crate::segmenter::Skeleton;

fn counts<'a>(links: Vec<&'a str>) -> BTreeMap<&'a str, usize> {
    let mut counts = BTreeMap::new();
    for link in links {
        *counts.entry(link).or_insert(0) += 1;
    }
    counts
}

/// One error per missing or extra link occurrence; order does not matter
pub fn check(source: &Skeleton, translation: &Skeleton) -> Vec<Finding> {
    let expected = counts(source.links());
    let found = counts(translation.links());
    let mut findings = Vec::new();

    for (link, &count) in &expected {
        let present = found.get(link).copied().unwrap_or(0);
        for _ in present..count {
            findings.push(Finding::error(format!("Missing link {}", link)));
        }
    }

    for (link, &count) in &found {
        let allowed = expected.get(link).copied().unwrap_or(0);
        for _ in allowed..count {
            findings.push(Finding::error(format!("Unexpected link {}", link)));
        }
    }

    findings
}
