/*!
 * Tests for the quality validator and its reports
 */

use anyhow::Result;

use compendia::document::{Document, Entry, EntryStatus};
use compendia::validation::{
    self, report, Glossary, IssueKind, QualityValidator, ReportFormat, Severity, ValidationConfig,
};
use crate::common;

fn pair(source_text: &str, translated_text: &str) -> (Document, Document) {
    let source = Document::new("d", "D").with_entry("A", Entry::default().with_text("description", source_text));
    let target = Document::new("d", "D").with_entry(
        "A",
        Entry::default()
            .with_text("description", translated_text)
            .with_status(EntryStatus::Translated),
    );
    (source, target)
}

#[test]
fn test_validate_withDroppedLinkAndUnclosedTag_shouldReportBothErrors() {
    let (source, target) = pair("<p>See @UUID[X]{Rules}.</p>", "<p>Voir les règles.");

    let issues = validation::validate(&source, &target, None);

    let kinds: Vec<(IssueKind, Severity)> = issues.iter().map(|i| (i.kind, i.severity)).collect();
    assert!(kinds.contains(&(IssueKind::HtmlBalance, Severity::Error)));
    assert!(kinds.contains(&(IssueKind::LinkIntegrity, Severity::Error)));
    assert!(issues.iter().all(|i| i.key.as_str() == "A" && i.field == "description"));
}

#[test]
fn test_validate_withNamedPlaceholderKept_shouldPass() {
    let (source, target) = pair("Deals {{damage}} to {0}", "Inflige {{damage}} à {0}");
    assert!(validation::validate(&source, &target, None).is_empty());
}

#[test]
fn test_validate_withEmbeddedField_shouldUseItsPath() -> Result<()> {
    let source = Document::from_json_str(
        "a",
        r#"{"entries": {"Goblin": {"items": [{"description": "Gain {0} Parry"}]}}}"#,
        10,
    )?;
    let target = Document::from_json_str(
        "a",
        r#"{"entries": {"Goblin": {"items": [{"description": "Gagne en Parade"}]}}}"#,
        10,
    )?;

    let issues = validation::validate(&source, &target, None);

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].field, "items[0].description");
    assert_eq!(issues[0].kind, IssueKind::Placeholder);
    Ok(())
}

#[test]
fn test_validator_withGlossaryFile_shouldFlagAlternateRenderingInLaterDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let glossary_path = common::create_test_file(temp_dir.path(), "glossary.json", r#"{"Parry": "Parade"}"#)?;
    let glossary = Glossary::load(&glossary_path)?;

    let first_source = Document::new("a", "A").with_entry("X", Entry::default().with_text("name", "Parry"));
    let first_target = Document::new("a", "A").with_entry("X", Entry::default().with_text("name", "Esquive"));
    let second_source =
        Document::new("b", "B").with_entry("Y", Entry::default().with_text("description", "Add +2 to Parry."));
    let second_target =
        Document::new("b", "B").with_entry("Y", Entry::default().with_text("description", "Ajoute +2 en Esquive."));

    let mut validator = QualityValidator::new(ValidationConfig::default()).with_glossary(glossary);
    let first = validator.validate(&first_source, &first_target);
    let second = validator.validate(&second_source, &second_target);

    assert_eq!(first.count(Severity::Warning), 1);
    assert_eq!(second.count(Severity::Warning), 1);
    assert!(second.issues[0].message.contains("'Esquive'"));
    Ok(())
}

#[test]
fn test_glossaryLoad_withMalformedFile_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "glossary.json", r#"["Parry"]"#)?;

    assert!(Glossary::load(&path).is_err());
    assert!(Glossary::load(temp_dir.path().join("missing.json")).is_err());
    Ok(())
}

#[test]
fn test_validate_withMissingCanonicalAndReportingDisabled_shouldStayQuiet() {
    let (source, target) = pair("Roll Notice now", "Lancez maintenant");
    let glossary = Glossary::from_json_str("inline", r#"{"Notice": "Perception"}"#).unwrap();
    let config = ValidationConfig {
        report_missing_glossary_terms: false,
        ..ValidationConfig::default()
    };

    let mut validator = QualityValidator::new(config).with_glossary(glossary.clone());
    assert!(validator.validate(&source, &target).issues.is_empty());

    let issues = validation::validate(&source, &target, Some(&glossary));
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].severity, Severity::Info);
}

#[test]
fn test_render_withEveryFormat_shouldDescribeTheSameIssue() -> Result<()> {
    let (source, target) = pair("Gain {0} to Notice rolls", "获得注意检定加值");
    let mut validator = QualityValidator::new(ValidationConfig::default());
    let reports = vec![validator.validate(&source, &target)];

    let text = report::render(&reports, ReportFormat::Text);
    assert!(text.contains("d: 1 field(s) checked, 1 error(s)"));

    let json: serde_json::Value = serde_json::from_str(&report::render(&reports, ReportFormat::Json))?;
    assert_eq!(json["summary"]["errors"], 1);
    assert_eq!(json["reports"][0]["issues"][0]["kind"], "placeholder");

    let markdown = report::render(&reports, ReportFormat::Markdown);
    assert!(markdown.contains("| error | placeholder | A | description |"));
    Ok(())
}
