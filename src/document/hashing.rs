/*!
 * Content hashing for entries.
 *
 * The hash covers field values only, never metadata. Values are written in
 * ascending field-name order with a one-byte type tag and little-endian length
 * prefixes, so concatenation ambiguities like `{"a": "bc"}` vs `{"ab": "c"}`
 * cannot collide.
 */

use sha2::{Digest, Sha256};

use super::model::{EmbeddedEntry, FieldValue, Fields};

/// SHA-256 of the canonical serialization, as 64 lowercase hex chars
pub fn hash_fields(fields: &Fields) -> String {
    let mut hasher = Sha256::new();
    write_fields(&mut hasher, fields);
    format!("{:x}", hasher.finalize())
}

fn write_fields(hasher: &mut Sha256, fields: &Fields) {
    write_len(hasher, fields.len());
    // BTreeMap iteration is already in ascending name order
    for (name, value) in fields {
        write_str(hasher, name);
        write_value(hasher, value);
    }
}

fn write_value(hasher: &mut Sha256, value: &FieldValue) {
    match value {
        // Plain and markup text hash alike: the class is derived from the text
        FieldValue::PlainText(text) | FieldValue::MarkupText(text) => {
            hasher.update(b"S");
            write_str(hasher, text);
        }
        FieldValue::Embedded(children) => {
            hasher.update(b"E");
            write_len(hasher, children.len());
            for child in children {
                match child {
                    EmbeddedEntry::Indexed { index, data } => {
                        hasher.update(b"I");
                        hasher.update(index.to_le_bytes());
                        write_fields(hasher, data);
                    }
                    EmbeddedEntry::Keyed { data } => {
                        hasher.update(b"K");
                        write_fields(hasher, data);
                    }
                }
            }
        }
        FieldValue::Nested(fields) => {
            hasher.update(b"N");
            write_fields(hasher, fields);
        }
        FieldValue::Opaque(json) => {
            hasher.update(b"O");
            write_str(hasher, &json.to_string());
        }
    }
}

fn write_str(hasher: &mut Sha256, text: &str) {
    write_len(hasher, text.len());
    hasher.update(text.as_bytes());
}

fn write_len(hasher: &mut Sha256, len: usize) {
    hasher.update((len as u64).to_le_bytes());
}
