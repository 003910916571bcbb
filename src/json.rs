//! Pulling a JSON object out of free-form completion output.
//!
//! Models wrap the requested JSON in prose or code fences often enough that
//! every stage goes through [`parse_model_json`] instead of decoding the raw
//! response directly.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// Extract and decode the first JSON object embedded in `text`.
///
/// The span starts at the first `{` and ends at its matching `}` by plain
/// brace counting (braces inside string literals are not special). If that
/// span does not decode, the widest span from the first `{` to the last `}`
/// is tried before giving up.
pub fn parse_model_json(text: &str) -> Result<Map<String, Value>, ParseError> {
    let start = text.find('{').ok_or(ParseError::NoJson)?;

    let end = balanced_end(text, start).ok_or(ParseError::NoJson)?;

    let decoded = match serde_json::from_str::<Value>(&text[start..=end]) {
        Ok(value) => value,
        Err(err) => match widest_span(text, start, end) {
            Some(span) => serde_json::from_str::<Value>(span)?,
            None => return Err(err.into()),
        },
    };

    match decoded {
        Value::Object(map) => Ok(map),
        _ => Err(ParseError::NotAnObject),
    }
}

/// Byte index of the `}` closing the `{` at `start`.
fn balanced_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes()[start..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// `text[start..=last '}']`, when that is wider than the balanced span.
fn widest_span(text: &str, start: usize, balanced_end: usize) -> Option<&str> {
    let last = text.rfind('}')?;
    (last > balanced_end).then(|| &text[start..=last])
}

/// Truncate `text` to at most `max_chars` characters for diagnostics.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
