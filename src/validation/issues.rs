/*!
 * Quality issue types shared by all checks.
 */

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::EntryKey;

/// How serious an issue is, ordered from least to most severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        f.write_str(name)
    }
}

/// Which check produced an issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    Placeholder,
    HtmlBalance,
    LinkIntegrity,
    GlossaryConsistency,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IssueKind::Placeholder => "placeholder",
            IssueKind::HtmlBalance => "html-balance",
            IssueKind::LinkIntegrity => "link-integrity",
            IssueKind::GlossaryConsistency => "glossary-consistency",
        };
        f.write_str(name)
    }
}

/// Result of one check on one field, before it is located
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub severity: Severity,
    pub message: String,
}

impl Finding {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
        }
    }
}

/// A located quality issue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub kind: IssueKind,
    pub key: EntryKey,
    /// Field path inside the entry
    pub field: String,
    pub message: String,
}

impl QualityIssue {
    pub fn from_finding(kind: IssueKind, key: &EntryKey, field: &str, finding: Finding) -> Self {
        Self {
            severity: finding.severity,
            kind,
            key: key.clone(),
            field: field.to_string(),
            message: finding.message,
        }
    }
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}/{}: {}",
            self.severity, self.kind, self.key, self.field, self.message
        )
    }
}
