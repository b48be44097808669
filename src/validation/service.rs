/*!
 * Quality validator that runs every enabled check over a translated document.
 */

use log::debug;
use serde::{Deserialize, Serialize};

use super::glossary::{Glossary, GlossaryTracker};
use super::issues::{Finding, IssueKind, QualityIssue};
use super::report::QualityReport;
use super::{links, placeholders, tags};
use crate::document::{Document, EntryStatus};
use crate::segmenter::Skeleton;

/// Configuration for the quality validator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Whether to check `{0}` / `{{name}}` placeholders
    #[serde(default = "default_true")]
    pub placeholder_check: bool,

    /// Whether to check tag balance
    #[serde(default = "default_true")]
    pub tag_balance_check: bool,

    /// Whether to check link integrity
    #[serde(default = "default_true")]
    pub link_integrity_check: bool,

    /// Whether to check glossary consistency
    #[serde(default = "default_true")]
    pub glossary_check: bool,

    /// Whether to report glossary terms whose canonical rendering is absent
    #[serde(default = "default_true")]
    pub report_missing_glossary_terms: bool,

    /// Whether warnings fail a check run like errors do
    #[serde(default)]
    pub treat_warnings_as_errors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            placeholder_check: true,
            tag_balance_check: true,
            link_integrity_check: true,
            glossary_check: true,
            report_missing_glossary_terms: true,
            treat_warnings_as_errors: false,
        }
    }
}

/// Validator for one run.
///
/// The glossary tracker lives as long as the validator, so documents must be
/// validated in a stable order for reproducible glossary findings.
pub struct QualityValidator {
    config: ValidationConfig,
    glossary: Option<Glossary>,
    tracker: GlossaryTracker,
}

impl QualityValidator {
    pub fn new(config: ValidationConfig) -> Self {
        Self {
            config,
            glossary: None,
            tracker: GlossaryTracker::new(),
        }
    }

    pub fn with_glossary(mut self, glossary: Glossary) -> Self {
        self.glossary = Some(glossary);
        self
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Check every translated field of `target` present in `source`.
    ///
    /// Deprecated entries and empty fields are skipped. Neither document is
    /// modified.
    pub fn validate(&mut self, source: &Document, target: &Document) -> QualityReport {
        let mut issues = Vec::new();
        let mut checked_fields = 0;

        for (key, entry) in &target.entries {
            if entry.status() == EntryStatus::Deprecated {
                continue;
            }
            let Some(source_entry) = source.entries.get(key) else {
                continue;
            };

            for (path, translated) in entry.text_fields() {
                if translated.is_empty() {
                    continue;
                }
                let Some(original) = source_entry.text_at(&path) else {
                    continue;
                };
                checked_fields += 1;

                let source_skeleton = Skeleton::extract(original);
                let translated_skeleton = Skeleton::extract(translated);
                let mut push = |kind: IssueKind, findings: Vec<Finding>| {
                    issues.extend(
                        findings
                            .into_iter()
                            .map(|finding| QualityIssue::from_finding(kind, key, &path, finding)),
                    );
                };

                if self.config.placeholder_check {
                    push(IssueKind::Placeholder, placeholders::check(original, translated));
                }
                if self.config.tag_balance_check {
                    push(
                        IssueKind::HtmlBalance,
                        tags::check(&source_skeleton, &translated_skeleton),
                    );
                }
                if self.config.link_integrity_check {
                    push(
                        IssueKind::LinkIntegrity,
                        links::check(&source_skeleton, &translated_skeleton),
                    );
                }
                if self.config.glossary_check {
                    if let Some(glossary) = &self.glossary {
                        push(
                            IssueKind::GlossaryConsistency,
                            self.tracker.check(
                                glossary,
                                &source_skeleton.plain_text(),
                                &translated_skeleton.plain_text(),
                                self.config.report_missing_glossary_terms,
                            ),
                        );
                    }
                }
            }
        }

        debug!(
            "Validated {} field(s) of '{}': {} issue(s)",
            checked_fields,
            target.id,
            issues.len()
        );

        QualityReport::new(&target.id, checked_fields, issues)
    }
}

/// Validate a single document pair with default settings
pub fn validate(source: &Document, target: &Document, glossary: Option<&Glossary>) -> Vec<QualityIssue> {
    let mut validator = QualityValidator::new(ValidationConfig::default());
    if let Some(glossary) = glossary {
        validator = validator.with_glossary(glossary.clone());
    }
    validator.validate(source, target).issues
}
