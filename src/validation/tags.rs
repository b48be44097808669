/*!
 * Tag balance of translated markup.
 *
 * Runs a stack over the protected tag tokens. Problems already present in the
 * source field are reported as warnings, new ones as errors.
 */

use super::issues::Finding;
use crate::segmenter::Skeleton;

/// Elements that never take a closing tag
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A balance problem, identified by tag name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagProblem {
    /// Closing tag without a matching open tag
    Unexpected(String),
    /// Open tag never closed
    Unclosed(String),
}

impl TagProblem {
    fn describe(&self) -> String {
        match self {
            TagProblem::Unexpected(name) => format!("Closing tag </{}> has no matching open tag", name),
            TagProblem::Unclosed(name) => format!("Tag <{}> is never closed", name),
        }
    }
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Balance problems of a skeleton, in order of detection
pub fn problems(skeleton: &Skeleton) -> Vec<TagProblem> {
    let mut stack: Vec<String> = Vec::new();
    let mut found = Vec::new();

    for tag in skeleton.tags() {
        if is_void(&tag.name) || tag.self_closing {
            continue;
        }

        if !tag.closing {
            stack.push(tag.name);
            continue;
        }

        match stack.iter().rposition(|open| *open == tag.name) {
            Some(position) => {
                // Everything opened after the match was left unclosed
                for open in stack.drain(position..).skip(1) {
                    found.push(TagProblem::Unclosed(open));
                }
            }
            None => found.push(TagProblem::Unexpected(tag.name)),
        }
    }

    found.extend(stack.into_iter().map(TagProblem::Unclosed));
    found
}

/// Check the translated field against its source
pub fn check(source: &Skeleton, translation: &Skeleton) -> Vec<Finding> {
    let mut inherited = problems(source);

    problems(translation)
        .into_iter()
        .map(|problem| match inherited.iter().position(|p| *p == problem) {
            Some(index) => {
                inherited.remove(index);
                Finding::warning(format!("{} (also in source)", problem.describe()))
            }
            None => Finding::error(problem.describe()),
        })
        .collect()
}
