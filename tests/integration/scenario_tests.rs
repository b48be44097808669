/*!
 * End-to-end scenarios of detection, merge and validation
 */

use anyhow::Result;
use chrono::{TimeZone, Utc};

use compendia::change_detector::{self, ChangeKind};
use compendia::document::{Document, Entry, EntryStatus, FieldValue};
use compendia::merge::{FixedClock, MergeEngine};
use compendia::validation::{self, IssueKind, Severity};

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2024, 9, 1, 10, 0, 0).unwrap())
}

/// A new entry in the source becomes an empty placeholder in an empty target
#[test]
fn test_scenarioA_withEmptyTarget_shouldAddNewPlaceholder() {
    let source = Document::new("edges", "Edges")
        .with_entry("Alertness", Entry::default().with_text("description", "desc A"));
    let target = Document::empty_like(&source);

    let report = change_detector::compare_with_target(&source, &target);
    assert_eq!(report.kind_of("Alertness"), Some(ChangeKind::Added));

    let clock = clock();
    let merged = MergeEngine::new(&clock).merge(&source, &target, &report).document;

    let entry = merged.entry("Alertness").expect("placeholder");
    assert_eq!(entry.status(), EntryStatus::New);
    assert_eq!(entry.fields.get("description"), Some(&FieldValue::PlainText(String::new())));
    assert_eq!(entry.metadata.last_modified_at, Some(clock.0));
}

/// A changed source keeps the existing translation and flags it
#[test]
fn test_scenarioB_withChangedDescription_shouldKeepChineseTextAndFlag() -> Result<()> {
    let old_source = Document::new("hindrances", "Hindrances")
        .with_entry("Enemy", Entry::default().with_text("description", "hates the character"));
    let new_source = Document::new("hindrances", "Hindrances")
        .with_entry("Enemy", Entry::default().with_text("description", "despises the character"));
    let hash = old_source.entry("Enemy").map(Entry::content_hash).unwrap_or_default();
    let target = Document::new("hindrances", "障碍").with_entry(
        "Enemy",
        Entry::default()
            .with_text("description", "憎恨角色")
            .with_status(EntryStatus::Translated)
            .with_content_hash(hash),
    );

    // With and without a snapshot of the previous source
    let clock = clock();
    for report in [
        change_detector::compare(&old_source, &new_source),
        change_detector::compare_with_target(&new_source, &target),
    ] {
        assert_eq!(report.kind_of("Enemy"), Some(ChangeKind::Modified));

        let outcome = MergeEngine::new(&clock)
            .with_previous_source(&old_source)
            .merge(&new_source, &target, &report);

        let entry = outcome.document.entry("Enemy").expect("entry");
        assert_eq!(entry.status(), EntryStatus::NeedsReview);
        assert_eq!(entry.text_at("description"), Some("憎恨角色"));
        assert_eq!(
            entry.metadata.content_hash,
            Some(new_source.entry("Enemy").map(Entry::content_hash).unwrap_or_default())
        );
        assert_eq!(outcome.summary.conflicts.len(), 1);
    }
    Ok(())
}

/// A dropped positional placeholder is a single located error
#[test]
fn test_scenarioC_withMissingPlaceholder_shouldReportOneError() {
    let source = Document::new("edges", "Edges")
        .with_entry("Alertness", Entry::default().with_text("description", "Gain {0} to Notice rolls"));
    let target = Document::new("edges", "专长").with_entry(
        "Alertness",
        Entry::default()
            .with_text("description", "获得注意检定加值")
            .with_status(EntryStatus::Translated),
    );

    let issues = validation::validate(&source, &target, None);

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].kind, IssueKind::Placeholder);
    assert_eq!(issues[0].severity, Severity::Error);
    assert_eq!(issues[0].key.as_str(), "Alertness");
    assert_eq!(issues[0].field, "description");
}

/// Translated prose around a preserved link and balanced tags passes every check
#[test]
fn test_scenarioD_withPreservedLink_shouldPassLinkAndTagChecks() {
    let source = Document::new("rules", "Rules")
        .with_entry("Setting", Entry::default().with_text("description", "<p>See @UUID[X]{Rules}.</p>"));
    let target = Document::new("rules", "规则").with_entry(
        "Setting",
        Entry::default()
            .with_text("description", "<p>详见@UUID[X]{Rules}了解更多。</p>")
            .with_status(EntryStatus::Translated),
    );

    let issues = validation::validate(&source, &target, None);

    assert!(issues.iter().all(|i| i.kind != IssueKind::LinkIntegrity));
    assert!(issues.iter().all(|i| i.kind != IssueKind::HtmlBalance));
    assert!(issues.is_empty());
}
