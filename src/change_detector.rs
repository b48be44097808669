/*!
 * Entry-level change detection between document revisions.
 *
 * Entries are compared by content hash only. Every key present in either
 * revision gets exactly one record, and records are sorted by key.
 */

use std::collections::BTreeSet;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::document::{Document, EntryKey};

/// Classification of one entry between two revisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
    Unchanged,
}

impl ChangeKind {
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Added,
        ChangeKind::Modified,
        ChangeKind::Deleted,
        ChangeKind::Unchanged,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChangeKind::Added => "Added",
            ChangeKind::Modified => "Modified",
            ChangeKind::Deleted => "Deleted",
            ChangeKind::Unchanged => "Unchanged",
        }
    }
}

/// Change of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub key: EntryKey,
    pub kind: ChangeKind,
    /// Hash in the old revision, absent when the entry is new
    pub old_hash: Option<String>,
    /// Hash in the new revision, absent when the entry was removed
    pub new_hash: Option<String>,
}

/// All entry changes of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeReport {
    /// Identifier of the compared document
    pub document: String,
    /// One record per key, sorted by key
    pub records: Vec<ChangeRecord>,
}

impl ChangeReport {
    /// Record for a key
    pub fn get(&self, key: &str) -> Option<&ChangeRecord> {
        self.records
            .binary_search_by(|record| record.key.as_str().cmp(key))
            .ok()
            .map(|index| &self.records[index])
    }

    pub fn kind_of(&self, key: &str) -> Option<ChangeKind> {
        self.get(key).map(|record| record.kind)
    }

    /// Keys classified as `kind`, in key order
    pub fn keys_of(&self, kind: ChangeKind) -> Vec<&EntryKey> {
        self.records
            .iter()
            .filter(|record| record.kind == kind)
            .map(|record| &record.key)
            .collect()
    }

    pub fn count(&self, kind: ChangeKind) -> usize {
        self.records.iter().filter(|record| record.kind == kind).count()
    }

    pub fn total(&self) -> usize {
        self.records.len()
    }

    /// Whether anything other than unchanged entries was found
    pub fn has_changes(&self) -> bool {
        self.records
            .iter()
            .any(|record| record.kind != ChangeKind::Unchanged)
    }

    /// One-line count summary
    pub fn summary(&self) -> String {
        format!(
            "{}: {} added, {} modified, {} deleted, {} unchanged",
            self.document,
            self.count(ChangeKind::Added),
            self.count(ChangeKind::Modified),
            self.count(ChangeKind::Deleted),
            self.count(ChangeKind::Unchanged),
        )
    }
}

/// Compare two revisions of the same source document
pub fn compare(old: &Document, new: &Document) -> ChangeReport {
    let keys: BTreeSet<&EntryKey> = old.entries.keys().chain(new.entries.keys()).collect();

    let records = keys
        .into_iter()
        .map(|key| {
            let old_hash = old.entries.get(key).map(|entry| entry.content_hash());
            let new_hash = new.entries.get(key).map(|entry| entry.content_hash());
            record(key, old_hash, new_hash)
        })
        .collect();

    let report = ChangeReport {
        document: new.id.clone(),
        records,
    };
    debug!("{}", report.summary());
    report
}

/// Compare a source revision with the hashes recorded in a target document.
///
/// Used when no previous source snapshot exists. A target entry without a
/// recorded hash counts as modified, since its origin is unknown.
pub fn compare_with_target(source: &Document, target: &Document) -> ChangeReport {
    let keys: BTreeSet<&EntryKey> = source.entries.keys().chain(target.entries.keys()).collect();

    let records = keys
        .into_iter()
        .map(|key| {
            let new_hash = source.entries.get(key).map(|entry| entry.content_hash());
            match target.entries.get(key) {
                None => record(key, None, new_hash),
                Some(entry) => match (&entry.metadata.content_hash, new_hash) {
                    (Some(recorded), new_hash) => record(key, Some(recorded.clone()), new_hash),
                    (None, Some(new_hash)) => ChangeRecord {
                        key: key.clone(),
                        kind: ChangeKind::Modified,
                        old_hash: None,
                        new_hash: Some(new_hash),
                    },
                    (None, None) => ChangeRecord {
                        key: key.clone(),
                        kind: ChangeKind::Deleted,
                        old_hash: None,
                        new_hash: None,
                    },
                },
            }
        })
        .collect();

    let report = ChangeReport {
        document: source.id.clone(),
        records,
    };
    debug!("{} (against target hashes)", report.summary());
    report
}

fn record(key: &EntryKey, old_hash: Option<String>, new_hash: Option<String>) -> ChangeRecord {
    let kind = match (&old_hash, &new_hash) {
        (None, _) => ChangeKind::Added,
        (Some(_), None) => ChangeKind::Deleted,
        (Some(old), Some(new)) if old == new => ChangeKind::Unchanged,
        _ => ChangeKind::Modified,
    };

    ChangeRecord {
        key: key.clone(),
        kind,
        old_hash,
        new_hash,
    }
}

/// Markdown changelog grouped per document.
///
/// Documents without changes are listed in the summary table only.
pub fn render_changelog(reports: &[ChangeReport], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Changelog\n");
    let _ = writeln!(out, "Generated at {}\n", generated_at.format("%Y-%m-%d %H:%M:%S UTC"));

    let _ = writeln!(out, "| Document | Added | Modified | Deleted | Unchanged |");
    let _ = writeln!(out, "|----------|-------|----------|---------|-----------|");
    for report in reports {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            report.document,
            report.count(ChangeKind::Added),
            report.count(ChangeKind::Modified),
            report.count(ChangeKind::Deleted),
            report.count(ChangeKind::Unchanged),
        );
    }

    for report in reports.iter().filter(|report| report.has_changes()) {
        let _ = writeln!(out, "\n## {}", report.document);
        for kind in [ChangeKind::Added, ChangeKind::Modified, ChangeKind::Deleted] {
            let keys = report.keys_of(kind);
            if keys.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n### {} ({})\n", kind.label(), keys.len());
            for key in keys {
                let _ = writeln!(out, "- {}", key);
            }
        }
    }

    if reports.iter().all(|report| !report.has_changes()) {
        let _ = writeln!(out, "\nNo changes detected.");
    }

    out
}
