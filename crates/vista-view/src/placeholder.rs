//! Engine placeholders found in rendered markup
//!
//! These sit outside the template language and survive template rendering:
//!
//! - `{yield}`: the current view, substituted into the layout
//! - `{message}`: the status message, substituted into the layout
//! - `{block:NAME}` / `{block:NAME:DEFAULT_VIEW}`: a named block
//! - `{begin:NAME}` ... `{end}`: inline block capture
//!
//! Only template source may declare them. Request data is guarded before it
//! reaches the template engine: every `{` in it is swapped for
//! [`BRACE_GUARD`], so rendered values can never form a placeholder. The
//! guard is swapped back once the page is composed.

/// Replaced with the rendered view in the layout
pub const YIELD: &str = "{yield}";

/// Replaced with the rendered status message in the layout
pub const MESSAGE: &str = "{message}";

use serde_json::Value;

/// Stands in for `{` inside request data until the page is composed
pub const BRACE_GUARD: char = '\u{E000}';

const GUARD_STR: &str = "\u{E000}";

const BLOCK_OPEN: &str = "{block:";
const BEGIN_OPEN: &str = "{begin:";
const END: &str = "{end}";

/// A piece of rendered markup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Text(&'a str),
    Block {
        name: &'a str,
        default_view: Option<&'a str>,
    },
    Begin(&'a str),
    End,
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '/' | '.')
}

/// Parse `NAME}` or `NAME:DEFAULT}` at the start of `rest`; returns the
/// argument and the byte length consumed including the closing brace
fn argument(rest: &str, allow_default: bool) -> Option<(&str, Option<&str>, usize)> {
    let close = rest.find('}')?;
    let inner = &rest[..close];
    let (name, default_view) = match inner.split_once(':') {
        Some((name, default_view)) if allow_default => (name, Some(default_view)),
        Some(_) => return None,
        None => (inner, None),
    };

    if name.is_empty() || !name.chars().all(is_name_char) {
        return None;
    }
    if let Some(default_view) = default_view {
        if default_view.is_empty() || !default_view.chars().all(is_name_char) {
            return None;
        }
    }
    Some((name, default_view, close + 1))
}

/// Split markup into text and block placeholders.
///
/// Anything that looks like a placeholder but is malformed stays text.
pub(crate) fn segments(src: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut pos = 0;

    while let Some(offset) = src[pos..].find('{') {
        let at = pos + offset;
        let rest = &src[at..];

        let parsed = if let Some(tail) = rest.strip_prefix(BLOCK_OPEN) {
            argument(tail, true).map(|(name, default_view, len)| {
                (Segment::Block { name, default_view }, BLOCK_OPEN.len() + len)
            })
        } else if let Some(tail) = rest.strip_prefix(BEGIN_OPEN) {
            argument(tail, false).map(|(name, _, len)| (Segment::Begin(name), BEGIN_OPEN.len() + len))
        } else if rest.starts_with(END) {
            Some((Segment::End, END.len()))
        } else {
            None
        };

        match parsed {
            Some((segment, len)) => {
                if text_start < at {
                    out.push(Segment::Text(&src[text_start..at]));
                }
                out.push(segment);
                pos = at + len;
                text_start = pos;
            }
            None => pos = at + 1,
        }
    }

    if text_start < src.len() {
        out.push(Segment::Text(&src[text_start..]));
    }
    out
}

/// Swap every `{` in request data for [`BRACE_GUARD`]
pub(crate) fn guard(text: &str) -> String {
    text.replace('{', GUARD_STR)
}

/// Guard every string (and object key) in a variable value
pub(crate) fn guard_value(value: &Value) -> Value {
    match value {
        Value::String(s) if s.contains('{') => Value::String(guard(s)),
        Value::Array(items) => Value::Array(items.iter().map(guard_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (guard(k), guard_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Restore guarded braces in composed output
pub(crate) fn unguard(text: String) -> String {
    if text.contains(BRACE_GUARD) {
        text.replace(BRACE_GUARD, "{")
    } else {
        text
    }
}
