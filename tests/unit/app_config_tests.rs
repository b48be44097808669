/*!
 * Tests for configuration loading and validation
 */

use anyhow::Result;

use compendia::app_config::{Config, LogLevel};
use crate::common;

/// Test that a saved configuration loads back with the same values
#[test]
fn test_saveAndLoad_withCustomValues_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.batch.concurrent_documents = 8;
    config.validation.treat_warnings_as_errors = true;
    config.merge.reuse_translations = false;
    config.log_level = LogLevel::Warn;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded.batch.concurrent_documents, 8);
    assert!(loaded.validation.treat_warnings_as_errors);
    assert!(!loaded.merge.reuse_translations);
    assert_eq!(loaded.log_level, LogLevel::Warn);
    Ok(())
}

/// Test that an empty JSON object yields the defaults
#[test]
fn test_fromFile_withEmptyObject_shouldUseDefaults() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{}")?;

    let config = Config::from_file(&path)?;
    assert_eq!(config.segmenter.max_depth, 10);
    assert_eq!(config.batch.file_extension, "json");
    assert!(config.merge.create_missing_targets);
    assert!(config.validation.glossary_check);
    assert!(config.validate().is_ok());
    Ok(())
}

/// Test that invalid JSON is reported with the file name
#[test]
fn test_fromFile_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    let error = Config::from_file(&path).unwrap_err();
    assert!(error.to_string().contains("conf.json"));
    Ok(())
}

/// Test that an empty file extension is rejected
#[test]
fn test_validate_withEmptyExtension_shouldFail() {
    let mut config = Config::default();
    config.batch.file_extension = ".".to_string();
    assert!(config.validate().is_err());
}

/// Test that log levels map to the log crate filters
#[test]
fn test_toLevelFilter_withEachLevel_shouldMatch() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Info.to_level_filter(), log::LevelFilter::Info);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
