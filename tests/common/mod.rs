/*!
 * Common test utilities for the compendia test suite
 */

use std::fs;
use std::path::{Path, PathBuf};
use anyhow::Result;
use tempfile::TempDir;

use compendia::document::{Document, Entry, EntryStatus};

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Saves a document as `<id>.json` in the given directory
pub fn write_document(dir: &Path, document: &Document) -> Result<PathBuf> {
    let path = dir.join(format!("{}.json", document.id));
    document.save(&path)?;
    Ok(path)
}

/// Route library logs through env_logger while tests run
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Source document of edges with plain and markup fields
pub fn edges_source() -> Document {
    Document::new("edges", "Edges")
        .with_kind("Item")
        .with_entry(
            "Alertness",
            Entry::default()
                .with_text("name", "Alertness")
                .with_text("description", "<p>Not easily surprised. Gain {0} to Notice rolls.</p>"),
        )
        .with_entry(
            "Brawny",
            Entry::default()
                .with_text("name", "Brawny")
                .with_text("description", "<p>See @UUID[Compendium.rules.Size]{Size} for details.</p>"),
        )
}

/// Translated counterpart of `edges_source`
pub fn edges_target() -> Document {
    let source = edges_source();
    let mut target = Document::empty_like(&source);
    target.label = "Atouts".to_string();

    let alertness = source.entry("Alertness").map(Entry::content_hash).unwrap_or_default();
    let brawny = source.entry("Brawny").map(Entry::content_hash).unwrap_or_default();

    target
        .with_entry(
            "Alertness",
            Entry::default()
                .with_text("name", "Vigilant")
                .with_text("description", "<p>Difficile à surprendre. Gagne {0} aux jets de Perception.</p>")
                .with_status(EntryStatus::Translated)
                .with_content_hash(alertness),
        )
        .with_entry(
            "Brawny",
            Entry::default()
                .with_text("name", "Costaud")
                .with_text("description", "<p>Voir @UUID[Compendium.rules.Size]{Size} pour les détails.</p>")
                .with_status(EntryStatus::Translated)
                .with_content_hash(brawny),
        )
}
