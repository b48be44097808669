/*!
 * Translation progress per document, computed from entry statuses.
 */

use std::fmt::Write as _;

use serde::Serialize;

use crate::document::{Document, EntryStatus};

/// Status counts of one target document
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentProgress {
    pub document: String,
    /// Entries in the source
    pub total: usize,
    pub translated: usize,
    /// Source entries with no target entry or status `New`
    pub untranslated: usize,
    pub needs_review: usize,
    /// Target entries kept for removed source entries
    pub deprecated: usize,
}

impl DocumentProgress {
    /// Compare a target against its source
    pub fn compute(source: &Document, target: &Document) -> Self {
        let mut progress = Self {
            document: source.id.clone(),
            total: source.len(),
            ..Self::default()
        };

        for key in source.entries.keys() {
            match target.entries.get(key).map(|entry| entry.status()) {
                Some(EntryStatus::Translated) => progress.translated += 1,
                Some(EntryStatus::NeedsReview) => progress.needs_review += 1,
                // Deprecated in the target but back in the source
                Some(EntryStatus::Deprecated) => progress.needs_review += 1,
                Some(EntryStatus::New) | None => progress.untranslated += 1,
            }
        }

        progress.deprecated = target
            .entries
            .iter()
            .filter(|(key, entry)| {
                entry.status() == EntryStatus::Deprecated && !source.entries.contains_key(*key)
            })
            .count();

        progress
    }

    /// Share of source entries translated, 0 for an empty source
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.translated as f64 / self.total as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.translated == self.total
    }
}

/// Progress over a set of documents
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProgressReport {
    pub documents: Vec<DocumentProgress>,
}

impl ProgressReport {
    pub fn new(mut documents: Vec<DocumentProgress>) -> Self {
        documents.sort_by(|a, b| a.document.cmp(&b.document));
        Self { documents }
    }

    /// Sum of all documents
    pub fn overall(&self) -> DocumentProgress {
        self.documents.iter().fold(
            DocumentProgress {
                document: "Total".to_string(),
                ..DocumentProgress::default()
            },
            |mut sum, doc| {
                sum.total += doc.total;
                sum.translated += doc.translated;
                sum.untranslated += doc.untranslated;
                sum.needs_review += doc.needs_review;
                sum.deprecated += doc.deprecated;
                sum
            },
        )
    }

    /// Markdown dashboard table
    pub fn render_markdown(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Translation Progress\n");
        let _ = writeln!(
            out,
            "| Document | Translated | Needs review | Untranslated | Deprecated | Progress |"
        );
        let _ = writeln!(
            out,
            "|----------|------------|--------------|--------------|------------|----------|"
        );

        for doc in self.documents.iter().chain(std::iter::once(&self.overall())) {
            let _ = writeln!(
                out,
                "| {} | {}/{} | {} | {} | {} | {:.1}% |",
                doc.document,
                doc.translated,
                doc.total,
                doc.needs_review,
                doc.untranslated,
                doc.deprecated,
                doc.percentage(),
            );
        }

        out
    }
}
