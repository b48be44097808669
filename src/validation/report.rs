/*!
 * Quality report aggregation and rendering.
 */

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use super::issues::{QualityIssue, Severity};

/// Issues found in one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub document: String,
    /// Number of translated fields that were checked
    pub checked_fields: usize,
    pub issues: Vec<QualityIssue>,
}

impl QualityReport {
    pub fn new(document: &str, checked_fields: usize, issues: Vec<QualityIssue>) -> Self {
        Self {
            document: document.to_string(),
            checked_fields,
            issues,
        }
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == severity)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Whether the report should fail a check run
    pub fn is_failure(&self, treat_warnings_as_errors: bool) -> bool {
        self.has_errors() || (treat_warnings_as_errors && self.count(Severity::Warning) > 0)
    }
}

/// Output format of rendered reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
    Markdown,
}

pub fn render(reports: &[QualityReport], format: ReportFormat) -> String {
    match format {
        ReportFormat::Text => render_text(reports),
        ReportFormat::Json => render_json(reports),
        ReportFormat::Markdown => render_markdown(reports),
    }
}

fn totals(reports: &[QualityReport]) -> (usize, usize, usize) {
    reports.iter().fold((0, 0, 0), |(e, w, i), report| {
        (
            e + report.count(Severity::Error),
            w + report.count(Severity::Warning),
            i + report.count(Severity::Info),
        )
    })
}

pub fn render_text(reports: &[QualityReport]) -> String {
    let mut out = String::new();
    for report in reports {
        let _ = writeln!(
            out,
            "{}: {} field(s) checked, {} error(s), {} warning(s), {} info",
            report.document,
            report.checked_fields,
            report.count(Severity::Error),
            report.count(Severity::Warning),
            report.count(Severity::Info),
        );
        for issue in &report.issues {
            let _ = writeln!(out, "  {}", issue);
        }
    }

    let (errors, warnings, infos) = totals(reports);
    let _ = writeln!(
        out,
        "Total: {} error(s), {} warning(s), {} info",
        errors, warnings, infos
    );
    out
}

pub fn render_json(reports: &[QualityReport]) -> String {
    let (errors, warnings, infos) = totals(reports);
    let value = serde_json::json!({
        "summary": {
            "documents": reports.len(),
            "errors": errors,
            "warnings": warnings,
            "info": infos,
        },
        "reports": reports,
    });
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

pub fn render_markdown(reports: &[QualityReport]) -> String {
    let (errors, warnings, infos) = totals(reports);
    let mut out = String::new();
    let _ = writeln!(out, "# Quality Report\n");
    let _ = writeln!(
        out,
        "- Errors: {}\n- Warnings: {}\n- Info: {}",
        errors, warnings, infos
    );

    for report in reports.iter().filter(|report| !report.issues.is_empty()) {
        let _ = writeln!(out, "\n## {}\n", report.document);
        let _ = writeln!(out, "| Severity | Check | Entry | Field | Message |");
        let _ = writeln!(out, "|----------|-------|-------|-------|---------|");
        for issue in &report.issues {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                issue.severity,
                issue.kind,
                issue.key,
                issue.field,
                issue.message.replace('|', "\\|"),
            );
        }
    }

    out
}
