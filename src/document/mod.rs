/*!
 * Content model: documents, entries, typed field values and content hashing.
 */

pub mod hashing;
pub mod model;

pub use hashing::hash_fields;
pub use model::{
    DEFAULT_KIND, Document, EmbeddedEntry, Entry, EntryKey, EntryMetadata, EntryStatus,
    FieldValue, Fields, META_FIELD, document_id,
};
