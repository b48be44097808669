/*!
 * Translator interchange rows.
 *
 * `extract` turns every translatable text segment of a document into a CSV
 * row; `inject` writes translated rows back through the segmenter so protected
 * markup is reproduced exactly. Rows that no longer line up with the source
 * are reported as alignment warnings and leave the field untouched.
 */

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::document::{Document, Entry, EntryKey, EntryStatus};
use crate::errors::InterchangeError;
use crate::segmenter::Skeleton;

/// One translatable segment of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterchangeRow {
    pub entry_key: String,
    /// Field path, `items[0].name` for embedded values
    pub field_name: String,
    /// Ordinal of the text segment within the field
    pub segment: usize,
    pub source_text: String,
    #[serde(default)]
    pub translated_text: String,
}

/// A row or field that could not be applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlignmentWarning {
    pub entry_key: String,
    pub field_name: String,
    pub message: String,
}

/// What an injection changed
#[derive(Debug, Clone, Default)]
pub struct InjectReport {
    /// Fields whose value was rebuilt from rows
    pub applied_fields: usize,
    pub warnings: Vec<AlignmentWarning>,
    /// Entries that became fully translated
    pub submitted: Vec<EntryKey>,
}

impl InjectReport {
    /// One-line summary for logs
    pub fn describe(&self) -> String {
        format!(
            "{} field(s) applied, {} entr(ies) submitted, {} warning(s)",
            self.applied_fields,
            self.submitted.len(),
            self.warnings.len()
        )
    }
}

/// Rows for every translatable segment that still needs work.
///
/// Without a target every source entry is exported. With a target, only
/// entries missing from it or in status `New` or `NeedsReview` are exported,
/// and segments are pre-filled with the target's current text when the
/// target field still lines up with the source field.
pub fn extract_rows(source: &Document, target: Option<&Document>) -> Vec<InterchangeRow> {
    let mut rows = Vec::new();

    for (key, entry) in &source.entries {
        let existing = target.and_then(|doc| doc.entries.get(key));
        if target.is_some() && !needs_work(existing) {
            continue;
        }

        for (path, text) in entry.text_fields() {
            let skeleton = Skeleton::extract(text);
            let current = existing
                .and_then(|e| e.text_at(&path))
                .filter(|t| !t.is_empty())
                .map(Skeleton::extract)
                .filter(|t| aligned(&skeleton, t));

            for segment in skeleton.translatable_view() {
                let translated_text = current
                    .as_ref()
                    .and_then(|t| t.text_segments().nth(segment.index))
                    .map(|(_, text)| text.to_string())
                    .unwrap_or_default();

                rows.push(InterchangeRow {
                    entry_key: key.to_string(),
                    field_name: path.clone(),
                    segment: segment.index,
                    source_text: segment.text,
                    translated_text,
                });
            }
        }
    }

    debug!("Extracted {} row(s) from '{}'", rows.len(), source.id);
    rows
}

fn needs_work(existing: Option<&Entry>) -> bool {
    match existing {
        None => true,
        Some(entry) => matches!(entry.status(), EntryStatus::New | EntryStatus::NeedsReview),
    }
}

/// Same protected tokens in the same order and the same number of text slots
fn aligned(a: &Skeleton, b: &Skeleton) -> bool {
    let protected = |s: &Skeleton| -> Vec<String> {
        s.segments()
            .iter()
            .filter(|segment| !segment.is_text())
            .map(|segment| segment.literal().to_string())
            .collect()
    };
    a.text_segment_count() == b.text_segment_count() && protected(a) == protected(b)
}

pub fn write_rows<W: Write>(writer: W, rows: &[InterchangeRow]) -> Result<(), InterchangeError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

pub fn read_rows<R: Read>(reader: R) -> Result<Vec<InterchangeRow>, InterchangeError> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (index, record) in csv_reader.deserialize::<InterchangeRow>().enumerate() {
        let row = record?;
        if row.entry_key.is_empty() || row.field_name.is_empty() {
            return Err(InterchangeError::InvalidRow {
                row: index + 1,
                message: "entry_key and field_name must not be empty".to_string(),
            });
        }
        rows.push(row);
    }

    Ok(rows)
}

pub fn write_rows_to_path<P: AsRef<Path>>(path: P, rows: &[InterchangeRow]) -> Result<(), InterchangeError> {
    let file = std::fs::File::create(path).map_err(csv::Error::from)?;
    write_rows(file, rows)
}

pub fn read_rows_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<InterchangeRow>, InterchangeError> {
    let file = std::fs::File::open(path).map_err(csv::Error::from)?;
    read_rows(file)
}

/// Apply translated rows to `target`.
///
/// Entries missing from the target are created as placeholders first. An
/// entry whose every translatable segment ends up translated is submitted.
pub fn inject_rows(
    source: &Document,
    target: &Document,
    rows: &[InterchangeRow],
    now: DateTime<Utc>,
) -> (Document, InjectReport) {
    let mut document = target.clone();
    let mut report = InjectReport::default();

    let mut grouped: BTreeMap<(&str, &str), Vec<&InterchangeRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry((row.entry_key.as_str(), row.field_name.as_str()))
            .or_default()
            .push(row);
    }

    // Segments explicitly provided by rows, per entry, as (field, segment)
    let mut provided: BTreeMap<EntryKey, HashSet<(String, usize)>> = BTreeMap::new();

    for ((entry_key, field_name), field_rows) in grouped {
        let warn_field = |message: String| AlignmentWarning {
            entry_key: entry_key.to_string(),
            field_name: field_name.to_string(),
            message,
        };

        let Some(source_entry) = source.entry(entry_key) else {
            report.warnings.push(warn_field("entry not found in source".to_string()));
            continue;
        };
        let Some(source_text) = source_entry.text_at(field_name) else {
            report.warnings.push(warn_field("field not found in source".to_string()));
            continue;
        };

        let skeleton = Skeleton::extract(source_text);
        let view: HashMap<usize, String> = skeleton
            .translatable_view()
            .into_iter()
            .map(|segment| (segment.index, segment.text))
            .collect();

        let mut translations: HashMap<usize, String> = HashMap::new();
        let mut mismatch = None;
        for row in &field_rows {
            match view.get(&row.segment) {
                None => {
                    mismatch = Some(format!("segment {} does not exist in source", row.segment));
                    break;
                }
                Some(text) if *text != row.source_text => {
                    mismatch = Some(format!("source text of segment {} has changed", row.segment));
                    break;
                }
                Some(_) => {
                    if !row.translated_text.is_empty() {
                        translations.insert(row.segment, row.translated_text.clone());
                    }
                }
            }
        }

        if let Some(message) = mismatch {
            warn!("Skipping {}/{}: {}", entry_key, field_name, message);
            report.warnings.push(warn_field(message));
            continue;
        }
        if translations.is_empty() {
            continue;
        }

        let key = EntryKey::new(entry_key);
        let target_entry = document
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::placeholder_of(source_entry, now));

        // Start from the current translation when it still lines up with the source
        let mut merged: HashMap<usize, String> = target_entry
            .text_at(field_name)
            .filter(|t| !t.is_empty())
            .map(Skeleton::extract)
            .filter(|current| aligned(&skeleton, current))
            .map(|current| {
                current
                    .text_segments()
                    .filter(|(index, _)| view.contains_key(index))
                    .map(|(index, text)| (index, text.to_string()))
                    .collect()
            })
            .unwrap_or_default();

        let current_filled = target_entry
            .text_at(field_name)
            .is_some_and(|t| !t.is_empty());
        let covers_all = view.keys().all(|index| translations.contains_key(index));
        if current_filled && merged.is_empty() && !covers_all {
            let message = "existing translation no longer lines up with the source".to_string();
            warn!("Skipping {}/{}: {}", entry_key, field_name, message);
            report.warnings.push(warn_field(message));
            continue;
        }

        let segments: Vec<usize> = translations.keys().copied().collect();
        merged.extend(translations);
        if target_entry.set_text_at(field_name, skeleton.inject(&merged)) {
            report.applied_fields += 1;
            provided
                .entry(key)
                .or_default()
                .extend(segments.into_iter().map(|index| (field_name.to_string(), index)));
        } else {
            report
                .warnings
                .push(warn_field("field not found in target".to_string()));
        }
    }

    for (key, segments) in provided {
        let Some(source_entry) = source.entries.get(&key) else {
            continue;
        };
        if let Some(entry) = document.entries.get_mut(&key) {
            if fully_translated(source_entry, entry, &segments)
                && entry.status() != EntryStatus::Translated
            {
                entry.submit_translation(&source_entry.content_hash(), now);
                report.submitted.push(key);
            }
        }
    }

    debug!(
        "Injected {} field(s) into '{}' with {} warning(s)",
        report.applied_fields,
        document.id,
        report.warnings.len()
    );
    (document, report)
}

/// Every translatable slot of every source field is either provided by a row
/// of this injection or already holds text that differs from the source
fn fully_translated(source: &Entry, target: &Entry, provided: &HashSet<(String, usize)>) -> bool {
    source.text_fields().into_iter().all(|(path, text)| {
        let skeleton = Skeleton::extract(text);
        let view = skeleton.translatable_view();
        if view.is_empty() {
            return true;
        }

        let Some(translated) = target.text_at(&path).filter(|t| !t.is_empty()) else {
            return false;
        };
        let current = Skeleton::extract(translated);
        if !aligned(&skeleton, &current) {
            // Restructured by hand; a non-empty value counts as translated
            return true;
        }

        let current_texts: Vec<&str> = current.text_segments().map(|(_, text)| text).collect();
        view.iter().all(|segment| {
            provided.contains(&(path.clone(), segment.index))
                || current_texts
                    .get(segment.index)
                    .is_some_and(|text| *text != segment.text || is_untranslatable(text))
        })
    })
}

/// Numbers and punctuation read the same in every language
fn is_untranslatable(text: &str) -> bool {
    !text.chars().any(char::is_alphabetic)
}
