/*!
 * Glossary consistency.
 *
 * A glossary maps source terms to their canonical translation. Terms are
 * matched in the source as whole words, case-sensitively. Across one run the
 * tracker remembers every rendering seen for a term, so a translation that
 * uses a known alternate rendering instead of the canonical one is caught.
 */

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;

use log::debug;

use super::issues::Finding;
use crate::errors::GlossaryError;

/// Read-only term mapping, ordered by term
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Glossary {
    terms: BTreeMap<String, String>,
}

impl Glossary {
    pub fn new(terms: BTreeMap<String, String>) -> Self {
        Self { terms }
    }

    /// Load a JSON object of `term -> translation`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, GlossaryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| GlossaryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let glossary = Self::from_json_str(&path.display().to_string(), &json)?;
        debug!("Loaded {} glossary term(s) from {}", glossary.len(), path.display());
        Ok(glossary)
    }

    pub fn from_json_str(origin: &str, json: &str) -> Result<Self, GlossaryError> {
        let terms: BTreeMap<String, String> =
            serde_json::from_str(json).map_err(|e| GlossaryError::Format {
                path: origin.to_string(),
                message: e.to_string(),
            })?;

        if terms.keys().any(|term| term.trim().is_empty()) {
            return Err(GlossaryError::Format {
                path: origin.to_string(),
                message: "empty term".to_string(),
            });
        }

        Ok(Self { terms })
    }

    pub fn get(&self, term: &str) -> Option<&str> {
        self.terms.get(term).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Terms occurring as whole words in `text`, with their canonical rendering
    pub fn terms_in<'a>(&'a self, text: &str) -> Vec<(&'a str, &'a str)> {
        self.terms
            .iter()
            .filter(|(term, _)| contains_whole_word(text, term))
            .map(|(term, translation)| (term.as_str(), translation.as_str()))
            .collect()
    }
}

/// Whether `needle` occurs in `haystack` without a letter or digit on either side
fn contains_whole_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

/// Renderings observed per term during one run
#[derive(Debug, Clone, Default)]
pub struct GlossaryTracker {
    renderings: HashMap<String, BTreeSet<String>>,
}

impl GlossaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderings recorded for a term
    pub fn renderings(&self, term: &str) -> Vec<&str> {
        self.renderings
            .get(term)
            .map(|set| set.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn record(&mut self, term: &str, rendering: &str) {
        self.renderings
            .entry(term.to_string())
            .or_default()
            .insert(rendering.to_string());
    }

    /// Check one translated field given the visible text of source and translation
    pub fn check(
        &mut self,
        glossary: &Glossary,
        source_text: &str,
        translated_text: &str,
        report_missing: bool,
    ) -> Vec<Finding> {
        let source_text = source_text.trim();
        let translated_text = translated_text.trim();
        let mut findings = Vec::new();

        if let Some(canonical) = glossary.get(source_text) {
            self.record(source_text, translated_text);
            if translated_text != canonical {
                findings.push(Finding::warning(format!(
                    "'{}' translated as '{}', glossary says '{}'",
                    source_text, translated_text, canonical
                )));
            }
            return findings;
        }

        for (term, canonical) in glossary.terms_in(source_text) {
            if translated_text.contains(canonical) {
                continue;
            }

            let alternate = self
                .renderings(term)
                .into_iter()
                .find(|rendering| *rendering != canonical && translated_text.contains(rendering))
                .map(str::to_string);

            match alternate {
                Some(rendering) => findings.push(Finding::warning(format!(
                    "'{}' rendered as '{}' instead of '{}'",
                    term, rendering, canonical
                ))),
                None if report_missing => findings.push(Finding::info(format!(
                    "'{}' is expected to appear as '{}'",
                    term, canonical
                ))),
                None => {}
            }
        }

        findings
    }
}
