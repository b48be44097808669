/*!
 * Tests for entry-level change detection
 */

use std::collections::{BTreeMap, BTreeSet};

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use compendia::change_detector::{self, ChangeKind};
use compendia::document::{Document, Entry, EntryStatus};

fn document_from(id: &str, entries: &BTreeMap<String, String>) -> Document {
    entries.iter().fold(Document::new(id, id), |doc, (key, text)| {
        doc.with_entry(key, Entry::default().with_text("description", text))
    })
}

fn revision() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("[A-F]", "[ab]{0,2}", 0..6)
}

proptest! {
    /// Every key of either revision is classified exactly once, consistently with presence
    #[test]
    fn test_compare_withRandomRevisions_shouldClassifyTotallyAndExclusively(
        old in revision(),
        new in revision(),
    ) {
        let report = change_detector::compare(&document_from("d", &old), &document_from("d", &new));

        let union: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        let keys: Vec<&str> = report.records.iter().map(|r| r.key.as_str()).collect();
        let expected: Vec<&str> = union.iter().map(|k| k.as_str()).collect();
        prop_assert_eq!(keys, expected);

        for record in &report.records {
            let key = record.key.as_str();
            let kind = match (old.get(key), new.get(key)) {
                (None, Some(_)) => ChangeKind::Added,
                (Some(_), None) => ChangeKind::Deleted,
                (Some(a), Some(b)) if a == b => ChangeKind::Unchanged,
                (Some(_), Some(_)) => ChangeKind::Modified,
                (None, None) => unreachable!(),
            };
            prop_assert_eq!(record.kind, kind);
        }

        let total: usize = ChangeKind::ALL.iter().map(|kind| report.count(*kind)).sum();
        prop_assert_eq!(total, report.total());
    }
}

#[test]
fn test_compare_withSameTextInOtherField_shouldBeModified() {
    let old = Document::new("d", "d").with_entry("A", Entry::default().with_text("name", "Alert"));
    let new = Document::new("d", "d").with_entry("A", Entry::default().with_text("label", "Alert"));

    let report = change_detector::compare(&old, &new);
    assert_eq!(report.kind_of("A"), Some(ChangeKind::Modified));
}

#[test]
fn test_compare_withOnlyMetadataDifference_shouldBeUnchanged() {
    let old = Document::new("d", "d").with_entry("A", Entry::default().with_text("name", "Alert"));
    let new = Document::new("d", "d").with_entry(
        "A",
        Entry::default().with_text("name", "Alert").with_status(EntryStatus::Translated),
    );

    assert!(!change_detector::compare(&old, &new).has_changes());
}

#[test]
fn test_compareWithTarget_withTargetOnlyEntryWithoutHash_shouldBeDeleted() {
    let source = Document::new("d", "d");
    let target = Document::new("d", "d").with_entry("Orphan", Entry::default().with_text("name", "x"));

    let report = change_detector::compare_with_target(&source, &target);
    assert_eq!(report.kind_of("Orphan"), Some(ChangeKind::Deleted));
}

#[test]
fn test_compareWithTarget_withUnhashedTranslation_shouldBeModified() {
    let source = Document::new("d", "d").with_entry("A", Entry::default().with_text("name", "Alert"));
    let target = Document::new("d", "d").with_entry("A", Entry::default().with_text("name", "Vif"));

    let report = change_detector::compare_with_target(&source, &target);
    assert_eq!(report.kind_of("A"), Some(ChangeKind::Modified));
}

#[test]
fn test_renderChangelog_withNoChanges_shouldSaySo() {
    let doc = Document::new("edges", "Edges").with_entry("A", Entry::default().with_text("name", "A"));
    let report = change_detector::compare(&doc, &doc);
    let at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();

    let changelog = change_detector::render_changelog(&[report], at);

    assert!(changelog.contains("Generated at 2024-05-01 12:00:00 UTC"));
    assert!(changelog.contains("| edges | 0 | 0 | 0 | 1 |"));
    assert!(changelog.contains("No changes detected."));
    assert!(!changelog.contains("## edges"));
}
