//! Structured-output extraction
//!
//! Model replies are supposed to be a single JSON value but routinely arrive
//! wrapped in prose, fenced in markdown, cut off mid-stream, or as the
//! continuation of a prefilled `{` / `[`. [`extract_json`] recovers the value
//! or reports [`ExtractError::MalformedOutput`].
//!
//! Recovery order for one candidate text:
//! 1. the whole trimmed text
//! 2. the body of each fenced code block
//! 3. a string-aware bracket scan from every `{` / `[`, skipping starts that
//!    do not parse
//!
//! An unterminated value is closed after its last committed member, i.e. the
//! last member followed by a top-level comma.

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::pattern::Pattern;

static FENCE: Pattern = Pattern::new(r"(?s)```[A-Za-z0-9_-]*[ \t]*\r?\n?(.*?)(?:```|\z)");

const PREVIEW_CHARS: usize = 120;

/// Errors from structured-output extraction
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Malformed model output: no JSON value recoverable from '{preview}'")]
    MalformedOutput { preview: String },
}

impl ExtractError {
    fn malformed(text: &str) -> Self {
        let preview: String = text.trim().chars().take(PREVIEW_CHARS).collect();
        ExtractError::MalformedOutput { preview }
    }
}

/// Opening bracket sent as the start of the model's reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefill {
    Array,
    Object,
}

impl Prefill {
    /// The literal prefill text
    pub fn as_str(&self) -> &'static str {
        match self {
            Prefill::Array => "[",
            Prefill::Object => "{",
        }
    }

    fn open(&self) -> char {
        match self {
            Prefill::Array => '[',
            Prefill::Object => '{',
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            Prefill::Array => value.is_array(),
            Prefill::Object => value.is_object(),
        }
    }
}

/// Recover one JSON object or array from raw model text
///
/// With a prefill the text is treated as a continuation of that bracket. Text
/// that already starts with the bracket is tried as-is first so clients that
/// ignore the prefill do not produce a doubly-wrapped value. The recovered
/// value must be of the prefilled kind.
pub fn extract_json(text: &str, prefill: Option<Prefill>) -> Result<Value, ExtractError> {
    debug!(len = text.len(), ?prefill, "extract_json: called");

    let Some(prefill) = prefill else {
        return recover(text, None).ok_or_else(|| ExtractError::malformed(text));
    };

    let continued = format!("{}{}", prefill.open(), text);
    let candidates: [&str; 2] = if text.trim_start().starts_with(prefill.open()) {
        [text, &continued]
    } else {
        [&continued, text]
    };

    for candidate in candidates {
        if let Some(value) = recover(candidate, Some(prefill)) {
            return Ok(value);
        }
    }

    debug!("extract_json: nothing recoverable");
    Err(ExtractError::malformed(text))
}

fn accepts(value: &Value, kind: Option<Prefill>) -> bool {
    match kind {
        Some(k) => k.accepts(value),
        None => value.is_object() || value.is_array(),
    }
}

fn recover(text: &str, kind: Option<Prefill>) -> Option<Value> {
    if let Some(value) = parse_whole(text, kind) {
        debug!("recover: whole text parsed");
        return Some(value);
    }

    for caps in FENCE.captures_all(text) {
        if let Some(body) = caps.get(1)
            && let Some(value) = parse_whole(body.as_str(), kind).or_else(|| scan(body.as_str(), kind))
        {
            debug!("recover: fenced block parsed");
            return Some(value);
        }
    }

    scan(text, kind)
}

fn parse_whole(text: &str, kind: Option<Prefill>) -> Option<Value> {
    serde_json::from_str::<Value>(text.trim())
        .ok()
        .filter(|v| accepts(v, kind))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Span {
    /// Balanced value ending before this byte index
    Complete(usize),
    /// Ran out of text; position of the last top-level comma if any
    Unterminated(Option<usize>),
    /// Mismatched closing bracket
    Invalid,
}

struct Frame {
    closer: u8,
    open: usize,
    last_commit: Option<usize>,
}

/// Walk from the bracket at `start` and report the span of every bracket
/// opened outside a string along the way, `start` included
fn spans_from(bytes: &[u8], start: usize) -> Vec<(usize, Span)> {
    let mut stack: Vec<Frame> = Vec::new();
    let mut spans = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' | b'[' => stack.push(Frame {
                closer: if b == b'{' { b'}' } else { b']' },
                open: i,
                last_commit: None,
            }),
            b'}' | b']' => match stack.pop() {
                Some(frame) if frame.closer == b => {
                    spans.push((frame.open, Span::Complete(i + 1)));
                    if stack.is_empty() {
                        return spans;
                    }
                }
                popped => {
                    spans.extend(popped.into_iter().chain(stack).map(|f| (f.open, Span::Invalid)));
                    return spans;
                }
            },
            b',' => {
                if let Some(top) = stack.last_mut() {
                    top.last_commit = Some(i);
                }
            }
            _ => {}
        }
    }

    spans.extend(stack.into_iter().map(|f| (f.open, Span::Unterminated(f.last_commit))));
    spans
}

fn scan(text: &str, kind: Option<Prefill>) -> Option<Value> {
    let bytes = text.as_bytes();
    let mut known: HashMap<usize, Span> = HashMap::new();

    for (start, &b) in bytes.iter().enumerate() {
        let closer = match (b, kind) {
            (b'{', None | Some(Prefill::Object)) => '}',
            (b'[', None | Some(Prefill::Array)) => ']',
            _ => continue,
        };

        if !known.contains_key(&start) {
            known.extend(spans_from(bytes, start));
        }
        let candidate = match known.get(&start).copied().unwrap_or(Span::Invalid) {
            Span::Complete(end) => serde_json::from_str::<Value>(&text[start..end]).ok(),
            Span::Unterminated(Some(comma)) => {
                let repaired = format!("{}{}", &text[start..comma], closer);
                debug!(start, comma, "scan: closing truncated value");
                serde_json::from_str::<Value>(&repaired).ok()
            }
            Span::Unterminated(None) | Span::Invalid => None,
        };

        if let Some(value) = candidate
            && accepts(&value, kind)
        {
            debug!(start, "scan: recovered value");
            return Some(value);
        }
    }

    None
}
