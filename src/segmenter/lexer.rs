/*!
 * Lexer for markup-bearing field values.
 *
 * The lexer only tokenizes: tags are never matched into a tree and balance is
 * not required. Every byte of the input ends up in exactly one segment, so the
 * concatenation of all segment literals is the input itself.
 *
 * All token delimiters are ASCII, which keeps every slice boundary on a UTF-8
 * character boundary.
 */

use super::skeleton::{ProtectedKind, Segment};

/// Longest accepted entity body, `&` and `;` excluded
const MAX_ENTITY_LEN: usize = 32;

/// Split a raw field value into text runs and protected tokens
pub fn tokenize(input: &str) -> Vec<Segment> {
    let bytes = input.as_bytes();
    let mut segments = Vec::new();
    let mut text_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let token = match bytes[i] {
            b'<' => scan_angle(bytes, i),
            b'&' => scan_entity(bytes, i),
            b'@' => scan_link(bytes, i),
            b'[' => scan_inline_roll(bytes, i),
            _ => None,
        };

        match token {
            Some((kind, end)) => {
                if text_start < i {
                    segments.push(Segment::Text(input[text_start..i].to_string()));
                }
                segments.push(Segment::Protected {
                    kind,
                    literal: input[i..end].to_string(),
                });
                i = end;
                text_start = end;
            }
            None => i += 1,
        }
    }

    if text_start < bytes.len() {
        segments.push(Segment::Text(input[text_start..].to_string()));
    }

    segments
}

/// Whether the input contains at least one protected token
pub fn contains_markup(input: &str) -> bool {
    tokenize(input)
        .iter()
        .any(|segment| matches!(segment, Segment::Protected { .. }))
}

/// `<...>` constructs: tags, comments and declarations
fn scan_angle(bytes: &[u8], start: usize) -> Option<(ProtectedKind, usize)> {
    let next = *bytes.get(start + 1)?;

    if bytes[start..].starts_with(b"<!--") {
        return find(bytes, start + 4, b"-->").map(|pos| (ProtectedKind::RawLiteral, pos + 3));
    }

    match next {
        b'/' => {
            let first = *bytes.get(start + 2)?;
            if !first.is_ascii_alphabetic() {
                return None;
            }
            scan_tag_end(bytes, start + 2).map(|end| (ProtectedKind::TagClose, end))
        }
        b'!' | b'?' => {
            find(bytes, start + 2, b">").map(|pos| (ProtectedKind::RawLiteral, pos + 1))
        }
        c if c.is_ascii_alphabetic() => {
            scan_tag_end(bytes, start + 1).map(|end| (ProtectedKind::TagOpen, end))
        }
        _ => None,
    }
}

/// Find the `>` closing a tag, skipping quoted attribute values.
///
/// A `<` outside quotes means the tag was never closed; the caller then treats
/// the opening `<` as plain text.
fn scan_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;

    for (offset, &b) in bytes[from..].iter().enumerate() {
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(from + offset + 1),
                b'<' => return None,
                _ => {}
            },
        }
    }

    None
}

/// `&name;`, `&#123;` and `&#x1F;`
fn scan_entity(bytes: &[u8], start: usize) -> Option<(ProtectedKind, usize)> {
    let body_start = start + 1;
    let (digits_start, accept): (usize, fn(u8) -> bool) = match bytes.get(body_start)? {
        b'#' => match bytes.get(body_start + 1)? {
            b'x' | b'X' => (body_start + 2, |b: u8| b.is_ascii_hexdigit()),
            _ => (body_start + 1, |b: u8| b.is_ascii_digit()),
        },
        b if b.is_ascii_alphabetic() => (body_start, |b: u8| b.is_ascii_alphanumeric()),
        _ => return None,
    };

    let mut i = digits_start;
    while i < bytes.len() && accept(bytes[i]) && i - body_start <= MAX_ENTITY_LEN {
        i += 1;
    }

    if i == digits_start || bytes.get(i) != Some(&b';') {
        return None;
    }

    Some((ProtectedKind::Entity, i + 1))
}

/// `@Name[reference]` with an optional `{label}`
fn scan_link(bytes: &[u8], start: usize) -> Option<(ProtectedKind, usize)> {
    let mut i = start + 1;
    while i < bytes.len() && bytes[i].is_ascii_alphabetic() {
        i += 1;
    }

    if i == start + 1 || bytes.get(i) != Some(&b'[') {
        return None;
    }

    let close = find(bytes, i + 1, b"]")?;
    let mut end = close + 1;

    if bytes.get(end) == Some(&b'{') {
        if let Some(label_close) = find(bytes, end + 1, b"}") {
            end = label_close + 1;
        }
    }

    Some((ProtectedKind::Link, end))
}

/// `[[...]]` inline rolls and commands
fn scan_inline_roll(bytes: &[u8], start: usize) -> Option<(ProtectedKind, usize)> {
    if bytes.get(start + 1) != Some(&b'[') {
        return None;
    }

    find(bytes, start + 2, b"]]").map(|pos| (ProtectedKind::RawLiteral, pos + 2))
}

fn find(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    if from > bytes.len() {
        return None;
    }

    bytes[from..]
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|pos| from + pos)
}
