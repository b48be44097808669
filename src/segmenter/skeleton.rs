/*!
 * Skeleton of a markup-bearing field.
 *
 * A skeleton is the ordered sequence of segments produced by the lexer. Text
 * segments are numbered by their ordinal among text segments only, which is
 * the index translators and interchange rows refer to.
 */

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lexer;

/// Kind of a protected token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProtectedKind {
    /// Opening or self-closing tag, `<p>` or `<br/>`
    TagOpen,
    /// Closing tag, `</p>`
    TagClose,
    /// Character entity, `&nbsp;`
    Entity,
    /// Host link, `@UUID[...]{...}`
    Link,
    /// Comment, declaration or inline roll
    RawLiteral,
}

/// One piece of a field value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Translatable run of text
    Text(String),
    /// Token that must be reproduced byte for byte
    Protected {
        kind: ProtectedKind,
        literal: String,
    },
}

impl Segment {
    /// The exact source bytes of this segment
    pub fn literal(&self) -> &str {
        match self {
            Segment::Text(text) => text,
            Segment::Protected { literal, .. } => literal,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text(_))
    }
}

/// A tag token with its normalized name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagToken {
    /// Lowercased element name
    pub name: String,
    /// `</name>`
    pub closing: bool,
    /// `<name/>`
    pub self_closing: bool,
    /// Original literal
    pub literal: String,
}

/// A translatable text segment exposed to translators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatableSegment {
    /// Ordinal among the skeleton's text segments
    pub index: usize,
    pub text: String,
}

/// Ordered segments of one field value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Skeleton {
    segments: Vec<Segment>,
}

impl Skeleton {
    /// Split a field value into text and protected segments
    pub fn extract(markup: &str) -> Self {
        Self {
            segments: lexer::tokenize(markup),
        }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Text segments paired with their ordinal index
    pub fn text_segments(&self) -> impl Iterator<Item = (usize, &str)> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Text(text) => Some(text.as_str()),
                Segment::Protected { .. } => None,
            })
            .enumerate()
    }

    pub fn text_segment_count(&self) -> usize {
        self.text_segments().count()
    }

    /// Text segments a translator has to work on.
    ///
    /// Whitespace-only segments keep their index slot but are not exposed; they
    /// are always emitted verbatim.
    pub fn translatable_view(&self) -> Vec<TranslatableSegment> {
        self.text_segments()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, text)| TranslatableSegment {
                index,
                text: text.to_string(),
            })
            .collect()
    }

    /// Rebuild the field, substituting translated text segments.
    ///
    /// Missing indices and empty translations fall back to the original text.
    /// Protected segments are always emitted verbatim.
    pub fn inject(&self, translations: &HashMap<usize, String>) -> String {
        let mut output = String::new();
        let mut text_index = 0;

        for segment in &self.segments {
            match segment {
                Segment::Text(original) => {
                    match translations.get(&text_index) {
                        Some(translated) if !translated.is_empty() => output.push_str(translated),
                        _ => output.push_str(original),
                    }
                    text_index += 1;
                }
                Segment::Protected { literal, .. } => output.push_str(literal),
            }
        }

        output
    }

    /// Concatenation of every literal, the original input
    pub fn render(&self) -> String {
        self.segments.iter().map(Segment::literal).collect()
    }

    /// Link literals in order of appearance
    pub fn links(&self) -> Vec<&str> {
        self.protected_of(ProtectedKind::Link)
    }

    /// Protected literals of one kind in order of appearance
    pub fn protected_of(&self, wanted: ProtectedKind) -> Vec<&str> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Protected { kind, literal } if *kind == wanted => Some(literal.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Opening and closing tags in order of appearance
    pub fn tags(&self) -> Vec<TagToken> {
        self.segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Protected {
                    kind: ProtectedKind::TagOpen,
                    literal,
                } => Some(parse_tag(literal, false)),
                Segment::Protected {
                    kind: ProtectedKind::TagClose,
                    literal,
                } => Some(parse_tag(literal, true)),
                _ => None,
            })
            .collect()
    }

    /// Text segments joined by newlines, the words a reader sees.
    ///
    /// Protected tokens act as word boundaries: `<li>A</li><li>B</li>` reads
    /// as two lines, never as `AB`.
    pub fn plain_text(&self) -> String {
        self.text_segments()
            .map(|(_, text)| text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn parse_tag(literal: &str, closing: bool) -> TagToken {
    let start = if closing { 2 } else { 1 };
    let body = literal.get(start..).unwrap_or_default();
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect();

    TagToken {
        name: name.to_ascii_lowercase(),
        closing,
        self_closing: !closing && literal.trim_end_matches('>').trim_end().ends_with('/'),
        literal: literal.to_string(),
    }
}
