/*!
 * Incremental merge of a new source revision into an existing target.
 *
 * The merge never discards human work: unchanged translations are copied
 * verbatim, translations of changed entries are kept and flagged for review,
 * and entries removed from the source are retained as deprecated. Merging the
 * same inputs twice yields the same document.
 */

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::change_detector::{ChangeKind, ChangeReport};
use crate::document::{Document, Entry, EntryKey, EntryStatus};
use crate::reuse::TranslationRepository;

/// Source of timestamps for metadata stamping
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Field-level conflict kind of a modified entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// The field left the source but the target still has a translation for it
    FieldRemoved,
    /// The source value of the field changed
    ContentChange,
}

/// Conflict on one field of a modified entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldConflict {
    pub key: EntryKey,
    pub field: String,
    pub kind: ConflictKind,
}

/// What a merge did, entry by entry
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Entries copied verbatim
    pub preserved: Vec<EntryKey>,
    /// Placeholders created
    pub added: Vec<EntryKey>,
    /// Entries flagged for review
    pub modified: Vec<EntryKey>,
    /// Entries that became deprecated in this merge
    pub deprecated: Vec<EntryKey>,
    /// Placeholders pre-filled from the translation repository
    pub reused: Vec<EntryKey>,
    /// Empty fields added to modified entries, as `(key, field)`
    pub fields_added: Vec<(EntryKey, String)>,
    /// Field conflicts, only known when the previous source is available
    pub conflicts: Vec<FieldConflict>,
}

impl MergeSummary {
    /// Whether the merge changed the target in any way
    pub fn has_changes(&self) -> bool {
        !(self.added.is_empty() && self.modified.is_empty() && self.deprecated.is_empty())
    }

    pub fn describe(&self) -> String {
        format!(
            "{} preserved, {} added ({} reused), {} modified, {} deprecated, {} field conflicts",
            self.preserved.len(),
            self.added.len(),
            self.reused.len(),
            self.modified.len(),
            self.deprecated.len(),
            self.conflicts.len(),
        )
    }
}

/// Merged document with its summary
#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub document: Document,
    pub summary: MergeSummary,
}

/// Merge engine configured with its collaborators
pub struct MergeEngine<'a> {
    clock: &'a dyn Clock,
    repository: Option<&'a dyn TranslationRepository>,
    previous_source: Option<&'a Document>,
}

impl<'a> MergeEngine<'a> {
    pub fn new(clock: &'a dyn Clock) -> Self {
        Self {
            clock,
            repository: None,
            previous_source: None,
        }
    }

    /// Pre-fill new entries from existing translations
    pub fn with_repository(mut self, repository: &'a dyn TranslationRepository) -> Self {
        self.repository = Some(repository);
        self
    }

    /// Source revision the report was computed against, for field conflicts
    pub fn with_previous_source(mut self, previous_source: &'a Document) -> Self {
        self.previous_source = Some(previous_source);
        self
    }

    /// Merge `new_source` into `old_target` following `report`
    pub fn merge(
        &self,
        new_source: &Document,
        old_target: &Document,
        report: &ChangeReport,
    ) -> MergeOutcome {
        let mut merged = old_target.clone();
        if merged.id.is_empty() {
            merged.id = new_source.id.clone();
        }
        if merged.kind.is_none() {
            merged.kind = new_source.kind.clone();
        }

        let kind = new_source.kind_or_default().to_string();
        let mut summary = MergeSummary::default();

        for record in &report.records {
            let key = &record.key;
            let source_entry = new_source.entries.get(key);
            let target_entry = merged.entries.get_mut(key);

            match (record.kind, source_entry, target_entry) {
                (ChangeKind::Deleted, _, Some(existing)) => {
                    if existing.metadata.status == EntryStatus::Deprecated {
                        summary.preserved.push(key.clone());
                    } else {
                        existing.metadata.status = EntryStatus::Deprecated;
                        existing.metadata.last_modified_at = Some(self.clock.now());
                        debug!("Deprecated '{}'", key);
                        summary.deprecated.push(key.clone());
                    }
                }
                (ChangeKind::Deleted, _, None) => {}
                (_, None, Some(_)) => {
                    // Report and source disagree; leave the target alone
                    summary.preserved.push(key.clone());
                }
                (_, None, None) => {
                    debug!("Skipping '{}': not in source or target", key);
                }
                (ChangeKind::Unchanged, Some(_), Some(_)) => {
                    summary.preserved.push(key.clone());
                }
                (ChangeKind::Added | ChangeKind::Modified, Some(source), Some(existing)) => {
                    let source_hash = source.content_hash();
                    if existing.metadata.content_hash.as_deref() == Some(source_hash.as_str())
                        && existing.metadata.status != EntryStatus::Deprecated
                    {
                        summary.preserved.push(key.clone());
                    } else if existing.metadata.status == EntryStatus::New && !existing.has_translation() {
                        // Never translated: refresh the placeholder instead of asking for review
                        *existing = self.placeholder(key, &kind, source, &mut summary);
                    } else {
                        self.flag_for_review(key, existing, source, source_hash, &mut summary);
                    }
                }
                (_, Some(source), None) => {
                    let entry = self.placeholder(key, &kind, source, &mut summary);
                    merged.entries.insert(key.clone(), entry);
                }
            }
        }

        info!("Merged '{}': {}", merged.id, summary.describe());

        MergeOutcome {
            document: merged,
            summary,
        }
    }

    fn placeholder(
        &self,
        key: &EntryKey,
        kind: &str,
        source: &Entry,
        summary: &mut MergeSummary,
    ) -> Entry {
        let mut entry = Entry::placeholder_of(source, self.clock.now());
        summary.added.push(key.clone());

        let Some(reused) = self
            .repository
            .and_then(|repository| repository.lookup(key, kind))
            .map(Entry::new)
        else {
            return entry;
        };

        let paths: Vec<String> = entry.text_fields().into_iter().map(|(path, _)| path).collect();
        let mut filled = 0;
        for path in paths {
            if let Some(text) = reused.text_at(&path).filter(|text| !text.is_empty()) {
                if entry.set_text_at(&path, text.to_string()) {
                    filled += 1;
                }
            }
        }

        if filled > 0 {
            entry.metadata.status = EntryStatus::NeedsReview;
            debug!("Pre-filled {} field(s) of '{}' from an existing translation", filled, key);
            summary.reused.push(key.clone());
        }

        entry
    }

    fn flag_for_review(
        &self,
        key: &EntryKey,
        existing: &mut Entry,
        source: &Entry,
        source_hash: String,
        summary: &mut MergeSummary,
    ) {
        if let Some(previous) = self.previous_source.and_then(|doc| doc.entries.get(key)) {
            for (field, old_value) in &previous.fields {
                match source.fields.get(field) {
                    None => {
                        let translated = existing
                            .fields
                            .get(field)
                            .is_some_and(|value| !value.is_blank());
                        if translated {
                            summary.conflicts.push(FieldConflict {
                                key: key.clone(),
                                field: field.clone(),
                                kind: ConflictKind::FieldRemoved,
                            });
                        }
                    }
                    Some(new_value) if new_value != old_value => {
                        summary.conflicts.push(FieldConflict {
                            key: key.clone(),
                            field: field.clone(),
                            kind: ConflictKind::ContentChange,
                        });
                    }
                    Some(_) => {}
                }
            }
        }

        for field in existing.fill_missing_from(source) {
            summary.fields_added.push((key.clone(), field));
        }

        existing.metadata.status = EntryStatus::NeedsReview;
        existing.metadata.content_hash = Some(source_hash);
        existing.metadata.last_modified_at = Some(self.clock.now());
        debug!("Flagged '{}' for review", key);
        summary.modified.push(key.clone());
    }
}
