/*!
 * Full translation round: merge, extract, translate, inject, validate
 */

use anyhow::Result;
use chrono::{TimeZone, Utc};

use compendia::app_config::Config;
use compendia::app_controller::Controller;
use compendia::document::{Document, EntryStatus};
use compendia::interchange;
use compendia::merge::FixedClock;
use crate::common;

fn translate(text: &str) -> String {
    match text {
        "Alertness" => "Vigilance".to_string(),
        "Not easily surprised. Gain {0} to Notice rolls." => {
            "Difficile à surprendre. Gagne {0} aux jets de Perception.".to_string()
        }
        "Brawny" => "Costaud".to_string(),
        "See " => "Voir ".to_string(),
        " for details." => " pour les détails.".to_string(),
        other => other.to_string(),
    }
}

#[test]
fn test_pipeline_fromEmptyTarget_shouldEndFullyTranslatedAndClean() -> Result<()> {
    common::init_logging();
    let controller = Controller::with_config(Config::default())?;
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 10, 5, 16, 0, 0).unwrap());
    let root = common::create_temp_dir()?;
    let source_path = common::write_document(root.path(), &common::edges_source())?;
    let target_path = root.path().join("fr").join("edges.json");

    // Merge into a missing target creates placeholders
    let merged = controller.merge_file(&source_path, &target_path, None, &clock)?;
    assert_eq!(merged.summary.added.len(), 2);
    merged.document.save(&target_path)?;

    // Extract what still needs work and let the translator fill it in
    let mut rows = controller.extract_file(&source_path, Some(&target_path))?;
    assert_eq!(rows.len(), 5);
    for row in rows.iter_mut() {
        row.translated_text = translate(&row.source_text);
    }
    let csv_path = root.path().join("edges.csv");
    interchange::write_rows_to_path(&csv_path, &rows)?;

    // Inject the translated rows back
    let (translated, report) = controller.inject_file(&source_path, &csv_path, Some(&target_path), &clock)?;
    assert!(report.warnings.is_empty());
    assert_eq!(report.submitted.len(), 2);
    translated.save(&target_path)?;

    let target = Document::load(&target_path, 10)?;
    assert_eq!(target.count_status(EntryStatus::Translated), 2);
    assert_eq!(
        target.entry("Brawny").and_then(|e| e.text_at("description")),
        Some("<p>Voir @UUID[Compendium.rules.Size]{Size} pour les détails.</p>")
    );

    // Nothing is left to extract, the result validates and progress is complete
    assert!(controller.extract_file(&source_path, Some(&target_path))?.is_empty());
    let reports = controller.check(&source_path, &target_path, None)?;
    assert_eq!(reports.len(), 1);
    assert!(reports[0].issues.is_empty());
    assert_eq!(reports[0].checked_fields, 4);

    let fr_dir = root.path().join("fr");
    let source_dir = root.path().join("src");
    common::write_document(&source_dir, &common::edges_source())?;
    let progress = controller.progress(&source_dir, &fr_dir)?;
    assert!(progress.documents[0].is_complete());
    Ok(())
}

#[test]
fn test_mergeFile_withSnapshotAndTranslatedTarget_shouldFlagOnlyChangedEntry() -> Result<()> {
    let controller = Controller::with_config(Config::default())?;
    let clock = FixedClock(Utc.with_ymd_and_hms(2024, 10, 6, 9, 0, 0).unwrap());
    let root = common::create_temp_dir()?;

    let old = common::edges_source();
    let mut new = old.clone();
    if let Some(entry) = new.entries.get_mut("Brawny") {
        entry.set_text_at("name", "Brawny (revised)".to_string());
    }
    let snapshot_path = common::write_document(&root.path().join("old"), &old)?;
    let source_path = common::write_document(&root.path().join("new"), &new)?;
    let target_path = common::write_document(&root.path().join("fr"), &common::edges_target())?;

    let outcome = controller.merge_file(&source_path, &target_path, Some(&snapshot_path), &clock)?;

    assert_eq!(outcome.summary.modified.len(), 1);
    assert_eq!(outcome.summary.preserved.len(), 1);
    assert_eq!(outcome.document.entry("Brawny").map(|e| e.status()), Some(EntryStatus::NeedsReview));
    assert_eq!(outcome.document.entry("Alertness").map(|e| e.status()), Some(EntryStatus::Translated));
    Ok(())
}
