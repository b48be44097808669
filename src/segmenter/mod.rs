/*!
 * Markup segmentation and reinjection.
 *
 * Field values are split lexically into translatable text runs and protected
 * tokens (tags, entities, host links, raw literals). Translations are written
 * back into the text slots only, so the protected structure survives
 * translation unchanged.
 */

pub mod lexer;
pub mod skeleton;

pub use lexer::{contains_markup, tokenize};
pub use skeleton::{ProtectedKind, Segment, Skeleton, TagToken, TranslatableSegment};
