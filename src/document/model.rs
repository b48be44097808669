/*!
 * Content model for compendium documents.
 *
 * A document maps stable entry keys to entries. Each entry holds named field
 * values and bookkeeping metadata stored under `_meta` in the file. Values are
 * typed: plain text, markup text, embedded sub-entries, nested objects whose
 * strings are translated in place, or opaque JSON that is carried through
 * untouched.
 */

use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::hashing;
use crate::errors::DocumentError;
use crate::segmenter;

/// Name of the reserved metadata property inside an entry
pub const META_FIELD: &str = "_meta";

/// Kind used when a document does not declare one
pub const DEFAULT_KIND: &str = "entry";

/// Field values of an entry, ordered by field name
pub type Fields = BTreeMap<String, FieldValue>;

/// Stable identifier of a translatable unit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryKey(String);

impl EntryKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EntryKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntryKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for EntryKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Value of one field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Text without any protected token
    PlainText(String),
    /// Text containing tags, entities, links or raw literals
    MarkupText(String),
    /// Sub-entries such as actor items or journal pages
    Embedded(Vec<EmbeddedEntry>),
    /// JSON object such as `actions` or `text`, addressed as `actions.skill`
    Nested(Fields),
    /// Any other JSON value, never translated
    Opaque(Value),
}

/// One sub-entry of an embedded list
#[derive(Debug, Clone, PartialEq)]
pub enum EmbeddedEntry {
    /// Legacy `[index, {...}]` form
    Indexed { index: u64, data: Fields },
    /// Plain object form
    Keyed { data: Fields },
}

impl EmbeddedEntry {
    pub fn data(&self) -> &Fields {
        match self {
            EmbeddedEntry::Indexed { data, .. } | EmbeddedEntry::Keyed { data } => data,
        }
    }

    pub fn data_mut(&mut self) -> &mut Fields {
        match self {
            EmbeddedEntry::Indexed { data, .. } | EmbeddedEntry::Keyed { data } => data,
        }
    }

    fn with_data(&self, data: Fields) -> Self {
        match self {
            EmbeddedEntry::Indexed { index, .. } => EmbeddedEntry::Indexed {
                index: *index,
                data,
            },
            EmbeddedEntry::Keyed { .. } => EmbeddedEntry::Keyed { data },
        }
    }
}

impl FieldValue {
    /// Classify a string by whether the lexer finds a protected token in it
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if segmenter::contains_markup(&value) {
            FieldValue::MarkupText(value)
        } else {
            FieldValue::PlainText(value)
        }
    }

    /// Text content for the two text variants
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::PlainText(text) | FieldValue::MarkupText(text) => Some(text),
            _ => None,
        }
    }

    /// Same structure with every string emptied and opaque values kept
    pub fn emptied(&self) -> Self {
        match self {
            FieldValue::PlainText(_) | FieldValue::MarkupText(_) => {
                FieldValue::PlainText(String::new())
            }
            FieldValue::Embedded(children) => FieldValue::Embedded(
                children
                    .iter()
                    .map(|child| child.with_data(empty_fields(child.data())))
                    .collect(),
            ),
            FieldValue::Nested(fields) => FieldValue::Nested(empty_fields(fields)),
            FieldValue::Opaque(value) => FieldValue::Opaque(value.clone()),
        }
    }

    /// Whether no text anywhere in this value is filled in
    pub fn is_blank(&self) -> bool {
        match self {
            FieldValue::PlainText(text) | FieldValue::MarkupText(text) => text.is_empty(),
            FieldValue::Embedded(children) => children
                .iter()
                .all(|child| child.data().values().all(FieldValue::is_blank)),
            FieldValue::Nested(fields) => fields.values().all(FieldValue::is_blank),
            FieldValue::Opaque(_) => true,
        }
    }

    fn from_json(
        document: &str,
        value: Value,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self, DocumentError> {
        if depth > max_depth {
            return Err(DocumentError::schema(
                document,
                format!("embedded values nested deeper than {}", max_depth),
            ));
        }

        match value {
            Value::String(text) => Ok(FieldValue::text(text)),
            Value::Array(items) if is_embedded_list(&items) => {
                let mut children = Vec::with_capacity(items.len());
                for item in items {
                    children.push(embedded_from_json(document, item, depth, max_depth)?);
                }
                Ok(FieldValue::Embedded(children))
            }
            Value::Object(map) => Ok(FieldValue::Nested(fields_from_json(
                document,
                map,
                depth + 1,
                max_depth,
            )?)),
            other => Ok(FieldValue::Opaque(other)),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            FieldValue::PlainText(text) | FieldValue::MarkupText(text) => {
                Value::String(text.clone())
            }
            FieldValue::Embedded(children) => Value::Array(
                children
                    .iter()
                    .map(|child| match child {
                        EmbeddedEntry::Indexed { index, data } => {
                            Value::Array(vec![Value::from(*index), fields_to_json(data)])
                        }
                        EmbeddedEntry::Keyed { data } => fields_to_json(data),
                    })
                    .collect(),
            ),
            FieldValue::Nested(fields) => fields_to_json(fields),
            FieldValue::Opaque(value) => value.clone(),
        }
    }
}

/// Non-empty list whose items are all objects or `[index, object]` pairs
fn is_embedded_list(items: &[Value]) -> bool {
    !items.is_empty()
        && items.iter().all(|item| match item {
            Value::Object(_) => true,
            Value::Array(pair) => {
                pair.len() == 2 && pair[0].is_u64() && pair[1].is_object()
            }
            _ => false,
        })
}

fn embedded_from_json(
    document: &str,
    item: Value,
    depth: usize,
    max_depth: usize,
) -> Result<EmbeddedEntry, DocumentError> {
    match item {
        Value::Object(map) => Ok(EmbeddedEntry::Keyed {
            data: fields_from_json(document, map, depth + 1, max_depth)?,
        }),
        Value::Array(mut pair) => {
            let data = match pair.pop() {
                Some(Value::Object(map)) => map,
                _ => return Err(DocumentError::schema(document, "malformed indexed sub-entry")),
            };
            let index = pair
                .first()
                .and_then(Value::as_u64)
                .ok_or_else(|| DocumentError::schema(document, "malformed indexed sub-entry"))?;
            Ok(EmbeddedEntry::Indexed {
                index,
                data: fields_from_json(document, data, depth + 1, max_depth)?,
            })
        }
        _ => Err(DocumentError::schema(document, "malformed sub-entry")),
    }
}

fn fields_from_json(
    document: &str,
    map: Map<String, Value>,
    depth: usize,
    max_depth: usize,
) -> Result<Fields, DocumentError> {
    let mut fields = Fields::new();
    for (name, value) in map {
        fields.insert(name, FieldValue::from_json(document, value, depth, max_depth)?);
    }
    Ok(fields)
}

fn fields_to_json(fields: &Fields) -> Value {
    Value::Object(
        fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect(),
    )
}

fn empty_fields(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(name, value)| (name.clone(), value.emptied()))
        .collect()
}

/// Translation state of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    #[default]
    New,
    Translated,
    NeedsReview,
    Deprecated,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryStatus::New => "new",
            EntryStatus::Translated => "translated",
            EntryStatus::NeedsReview => "needs_review",
            EntryStatus::Deprecated => "deprecated",
        };
        f.write_str(name)
    }
}

/// Bookkeeping stored under `_meta`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Hash of the source entry this translation corresponds to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,

    #[serde(default)]
    pub status: EntryStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_at: Option<DateTime<Utc>>,
}

impl EntryMetadata {
    fn is_default(&self) -> bool {
        self == &EntryMetadata::default()
    }
}

/// A translatable unit: named field values plus metadata
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Entry {
    pub fields: Fields,
    pub metadata: EntryMetadata,
}

impl Entry {
    pub fn new(fields: Fields) -> Self {
        Self {
            fields,
            metadata: EntryMetadata::default(),
        }
    }

    /// Add a text field, classified by content
    pub fn with_text(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), FieldValue::text(value));
        self
    }

    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.metadata.status = status;
        self
    }

    pub fn with_content_hash(mut self, hash: impl Into<String>) -> Self {
        self.metadata.content_hash = Some(hash.into());
        self
    }

    /// Hash of the field values, metadata excluded
    pub fn content_hash(&self) -> String {
        hashing::hash_fields(&self.fields)
    }

    /// Empty translation target mirroring the structure of `source`
    pub fn placeholder_of(source: &Entry, now: DateTime<Utc>) -> Self {
        Self {
            fields: empty_fields(&source.fields),
            metadata: EntryMetadata {
                content_hash: Some(source.content_hash()),
                status: EntryStatus::New,
                last_modified_at: Some(now),
            },
        }
    }

    pub fn status(&self) -> EntryStatus {
        self.metadata.status
    }

    /// Mark the entry as translated against the given source hash
    pub fn submit_translation(&mut self, source_hash: &str, now: DateTime<Utc>) {
        self.metadata.status = EntryStatus::Translated;
        self.metadata.content_hash = Some(source_hash.to_string());
        self.metadata.last_modified_at = Some(now);
    }

    /// Insert emptied copies of source fields this entry lacks.
    ///
    /// Returns the names of the added fields.
    pub fn fill_missing_from(&mut self, source: &Entry) -> Vec<String> {
        let mut added = Vec::new();
        for (name, value) in &source.fields {
            if !self.fields.contains_key(name) {
                self.fields.insert(name.clone(), value.emptied());
                added.push(name.clone());
            }
        }
        added
    }

    /// Whether any text in the entry has been filled in
    pub fn has_translation(&self) -> bool {
        self.fields.values().any(|value| !value.is_blank())
    }

    /// Every text value with its field path, in field order
    pub fn text_fields(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        collect_text(&self.fields, "", &mut out);
        out
    }

    /// Text at a field path such as `items[2].description` or `actions.skill`
    pub fn text_at(&self, path: &str) -> Option<&str> {
        let parts = parse_path(path)?;
        lookup(&self.fields, &parts).and_then(FieldValue::as_text)
    }

    /// Replace the text at a field path, reclassifying the value.
    ///
    /// Returns false when the path does not name a text value.
    pub fn set_text_at(&mut self, path: &str, text: String) -> bool {
        let Some(parts) = parse_path(path) else {
            return false;
        };
        match lookup_mut(&mut self.fields, &parts) {
            Some(value) if value.as_text().is_some() => {
                *value = FieldValue::text(text);
                true
            }
            _ => false,
        }
    }

    fn from_json(document: &str, key: &str, value: Value, max_depth: usize) -> Result<Self, DocumentError> {
        let Value::Object(mut map) = value else {
            return Err(DocumentError::schema(
                document,
                format!("entry '{}' is not an object", key),
            ));
        };

        let metadata = match map.remove(META_FIELD) {
            Some(meta) => serde_json::from_value(meta).map_err(|e| {
                DocumentError::schema(document, format!("invalid {} of entry '{}': {}", META_FIELD, key, e))
            })?,
            None => EntryMetadata::default(),
        };

        Ok(Self {
            fields: fields_from_json(document, map, 1, max_depth)?,
            metadata,
        })
    }

    fn to_json(&self) -> Value {
        let mut map: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();

        if !self.metadata.is_default() {
            // Serializing a plain struct of strings and an enum cannot fail
            if let Ok(meta) = serde_json::to_value(&self.metadata) {
                map.insert(META_FIELD.to_string(), meta);
            }
        }

        Value::Object(map)
    }
}

fn collect_text<'a>(fields: &'a Fields, prefix: &str, out: &mut Vec<(String, &'a str)>) {
    for (name, value) in fields {
        let path = if prefix.is_empty() {
            name.clone()
        } else {
            format!("{}.{}", prefix, name)
        };
        match value {
            FieldValue::PlainText(text) | FieldValue::MarkupText(text) => out.push((path, text)),
            FieldValue::Embedded(children) => {
                for (position, child) in children.iter().enumerate() {
                    collect_text(child.data(), &format!("{}[{}]", path, position), out);
                }
            }
            FieldValue::Nested(nested) => collect_text(nested, &path, out),
            FieldValue::Opaque(_) => {}
        }
    }
}

/// `name` or `name[position]`
type PathPart<'a> = (&'a str, Option<usize>);

fn parse_path(path: &str) -> Option<Vec<PathPart<'_>>> {
    path.split('.')
        .map(|part| match part.find('[') {
            Some(open) => {
                let position = part[open + 1..].strip_suffix(']')?.parse().ok()?;
                Some((&part[..open], Some(position)))
            }
            None => Some((part, None)),
        })
        .collect()
}

fn lookup<'a>(fields: &'a Fields, parts: &[PathPart<'_>]) -> Option<&'a FieldValue> {
    let ((name, position), rest) = parts.split_first()?;
    let value = fields.get(*name)?;
    match (position, value) {
        (None, _) if rest.is_empty() => Some(value),
        (None, FieldValue::Nested(nested)) => lookup(nested, rest),
        (Some(position), FieldValue::Embedded(children)) if !rest.is_empty() => {
            lookup(children.get(*position)?.data(), rest)
        }
        _ => None,
    }
}

fn lookup_mut<'a>(fields: &'a mut Fields, parts: &[PathPart<'_>]) -> Option<&'a mut FieldValue> {
    let ((name, position), rest) = parts.split_first()?;
    let value = fields.get_mut(*name)?;
    match (position, value) {
        (None, value) if rest.is_empty() => Some(value),
        (None, FieldValue::Nested(nested)) => lookup_mut(nested, rest),
        (Some(position), FieldValue::Embedded(children)) if !rest.is_empty() => {
            lookup_mut(children.get_mut(*position)?.data_mut(), rest)
        }
        _ => None,
    }
}

/// A compendium document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Stable identifier, the file stem
    pub id: String,

    /// Display label
    pub label: String,

    /// Entity type of the entries, such as `Item`
    pub kind: Option<String>,

    /// Entries ordered by key
    pub entries: BTreeMap<EntryKey, Entry>,

    /// Unknown top-level properties, kept verbatim
    pub extra: Map<String, Value>,
}

impl Document {
    pub fn new(id: &str, label: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            kind: None,
            entries: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    pub fn with_entry(mut self, key: &str, entry: Entry) -> Self {
        self.entries.insert(EntryKey::new(key), entry);
        self
    }

    /// Empty document sharing identity, label and kind with `source`
    pub fn empty_like(source: &Document) -> Self {
        Self {
            id: source.id.clone(),
            label: source.label.clone(),
            kind: source.kind.clone(),
            entries: BTreeMap::new(),
            extra: Map::new(),
        }
    }

    pub fn kind_or_default(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }

    pub fn entry(&self, key: &str) -> Option<&Entry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries in a given status
    pub fn count_status(&self, status: EntryStatus) -> usize {
        self.entries
            .values()
            .filter(|entry| entry.status() == status)
            .count()
    }

    /// Parse a document from its JSON text
    pub fn from_json_str(id: &str, json: &str, max_depth: usize) -> Result<Self, DocumentError> {
        let value: Value = serde_json::from_str(json).map_err(|e| DocumentError::parse(id, &e))?;

        let Value::Object(mut root) = value else {
            return Err(DocumentError::schema(id, "top level is not an object"));
        };

        let label = match root.remove("label") {
            Some(Value::String(label)) => label,
            Some(_) => return Err(DocumentError::schema(id, "'label' is not a string")),
            None => id.to_string(),
        };

        let kind = match root.remove("kind") {
            Some(Value::String(kind)) => Some(kind),
            Some(_) => return Err(DocumentError::schema(id, "'kind' is not a string")),
            None => None,
        };

        let mut entries = BTreeMap::new();
        match root.remove("entries") {
            Some(Value::Object(map)) => {
                for (key, value) in map {
                    let entry = Entry::from_json(id, &key, value, max_depth)?;
                    entries.insert(EntryKey::new(key), entry);
                }
            }
            Some(_) => return Err(DocumentError::schema(id, "'entries' is not an object")),
            None => {}
        }

        Ok(Self {
            id: id.to_string(),
            label,
            kind,
            entries,
            extra: root,
        })
    }

    pub fn to_json_value(&self) -> Value {
        let mut root = self.extra.clone();
        root.insert("label".to_string(), Value::String(self.label.clone()));
        if let Some(kind) = &self.kind {
            root.insert("kind".to_string(), Value::String(kind.clone()));
        }
        root.insert(
            "entries".to_string(),
            Value::Object(
                self.entries
                    .iter()
                    .map(|(key, entry)| (key.to_string(), entry.to_json()))
                    .collect(),
            ),
        );
        Value::Object(root)
    }

    /// Pretty-printed JSON, non-ASCII text left unescaped
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string_pretty(&self.to_json_value()).map_err(|e| DocumentError::parse(&self.id, &e))
    }

    /// Load a document, using the file stem as its identifier
    pub fn load<P: AsRef<Path>>(path: P, max_depth: usize) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&document_id(path), &json, max_depth)
    }

    /// Write the document, creating parent directories as needed
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        let io_error = |source| DocumentError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let mut json = self.to_json_string()?;
        json.push('\n');
        std::fs::write(path, json).map_err(io_error)
    }
}

/// Identifier of the document stored at `path`
pub fn document_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
