/*!
 * Tests for the content model and the JSON document format
 */

use anyhow::Result;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

use compendia::document::{Document, EmbeddedEntry, EntryStatus, FieldValue};
use compendia::errors::DocumentError;
use crate::common;

fn leaf_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 {},.]{0,16}".prop_map(Value::String),
        "(<p>|</p>|<em>|</em>|&amp;|@UUID\\[[a-z.]{1,8}\\](\\{[A-Za-z]{1,5}\\})?|\\[\\[/r 1d6\\]\\]|[a-z ]{1,6}){0,6}"
            .prop_map(Value::String),
        any::<i64>().prop_map(Value::from),
        any::<bool>().prop_map(Value::Bool),
        Just(Value::Null),
        Just(json!([])),
        Just(json!(["tag", 1])),
    ]
}

fn object_of(values: impl Strategy<Value = Value>, max: usize) -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-z]{1,6}", values, 0..max).prop_map(|m| m.into_iter().collect())
}

fn field_value() -> impl Strategy<Value = Value> {
    let embedded = prop::collection::vec(
        prop_oneof![
            object_of(leaf_value(), 4).prop_map(Value::Object),
            (0u64..50, object_of(leaf_value(), 4)).prop_map(|(index, data)| json!([index, data])),
        ],
        1..4,
    )
    .prop_map(Value::Array);

    let nested = object_of(leaf_value(), 3).prop_map(Value::Object);

    prop_oneof![3 => leaf_value(), 1 => embedded, 1 => nested]
}

fn document_json() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[A-Z][a-z]{0,8}", object_of(field_value(), 5), 0..5).prop_map(|entries| {
        let entries: Map<String, Value> = entries.into_iter().map(|(k, v)| (k, Value::Object(v))).collect();
        json!({ "label": "Sample", "mapping": { "name": "name" }, "entries": entries })
    })
}

proptest! {
    /// Loading and serializing a document without edits reproduces it exactly
    #[test]
    fn test_roundTrip_withGeneratedDocument_shouldBeIdentity(value in document_json()) {
        let text = value.to_string();
        let document = Document::from_json_str("sample", &text, 10).unwrap();
        prop_assert_eq!(document.to_json_value(), value);
    }

    /// Every string lands in exactly one of the two text variants
    #[test]
    fn test_classification_withAnyString_shouldMatchLexer(text in any::<String>()) {
        let has_markup = compendia::segmenter::contains_markup(&text);
        match FieldValue::text(text.clone()) {
            FieldValue::PlainText(t) => { prop_assert!(!has_markup); prop_assert_eq!(t, text); }
            FieldValue::MarkupText(t) => { prop_assert!(has_markup); prop_assert_eq!(t, text); }
            other => prop_assert!(false, "unexpected variant {:?}", other),
        }
    }
}

#[test]
fn test_fromJsonStr_withLegacyAndKeyedItems_shouldKeepBothForms() -> Result<()> {
    let json = r#"{"label": "Actors", "entries": {"Goblin": {"items": [[3, {"name": "Dagger"}], {"name": "Net"}]}}}"#;
    let document = Document::from_json_str("actors", json, 10)?;

    let entry = document.entry("Goblin").expect("entry");
    let Some(FieldValue::Embedded(items)) = entry.fields.get("items") else {
        panic!("items should be embedded");
    };
    assert!(matches!(items[0], EmbeddedEntry::Indexed { index: 3, .. }));
    assert!(matches!(items[1], EmbeddedEntry::Keyed { .. }));
    assert_eq!(entry.text_at("items[0].name"), Some("Dagger"));
    assert_eq!(entry.text_at("items[1].name"), Some("Net"));

    let expected: Value = serde_json::from_str(json)?;
    assert_eq!(document.to_json_value(), expected);
    Ok(())
}

#[test]
fn test_fromJsonStr_withMixedList_shouldKeepItOpaque() -> Result<()> {
    let json = r#"{"label": "L", "entries": {"A": {"tags": [{"name": "x"}, "loose"]}}}"#;
    let document = Document::from_json_str("l", json, 10)?;

    let entry = document.entry("A").expect("entry");
    assert!(matches!(entry.fields.get("tags"), Some(FieldValue::Opaque(_))));
    assert!(entry.text_fields().is_empty());
    Ok(())
}

#[test]
fn test_fromJsonStr_withMetadata_shouldReadStatusAndHash() -> Result<()> {
    let json = r#"{"label": "L", "entries": {"A": {"name": "Un", "_meta": {"content_hash": "abc", "status": "needs_review"}}}}"#;
    let document = Document::from_json_str("l", json, 10)?;

    let entry = document.entry("A").expect("entry");
    assert_eq!(entry.status(), EntryStatus::NeedsReview);
    assert_eq!(entry.metadata.content_hash.as_deref(), Some("abc"));
    assert!(!entry.fields.contains_key("_meta"));
    assert_eq!(document.to_json_value()["entries"]["A"]["_meta"]["status"], "needs_review");
    Ok(())
}

#[test]
fn test_fromJsonStr_withMissingLabel_shouldDefaultToId() -> Result<()> {
    let document = Document::from_json_str("edges", r#"{"entries": {}}"#, 10)?;
    assert_eq!(document.label, "edges");
    assert!(document.is_empty());
    Ok(())
}

#[test]
fn test_fromJsonStr_withNonObjectEntries_shouldReturnRecoverableSchemaError() {
    let error = Document::from_json_str("edges", r#"{"entries": []}"#, 10).unwrap_err();
    assert!(matches!(error, DocumentError::Schema { .. }));
    assert!(error.is_recoverable());
}

#[test]
fn test_load_withMissingFile_shouldReturnIoError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let error = Document::load(temp_dir.path().join("missing.json"), 10).unwrap_err();

    assert!(matches!(error, DocumentError::Io { .. }));
    assert!(!error.is_recoverable());
    Ok(())
}

#[test]
fn test_save_withUnicode_shouldWriteUnescapedText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let document = Document::from_json_str("d", r#"{"label": "中文", "entries": {"A": {"name": "警觉"}}}"#, 10)?;
    let path = common::write_document(temp_dir.path(), &document)?;

    let written = std::fs::read_to_string(&path)?;
    assert!(written.contains("警觉"));
    assert!(written.ends_with('\n'));
    assert_eq!(Document::load(&path, 10)?, document);
    Ok(())
}
