//! JSON formatting: four-space re-indentation over the source tokens.
//!
//! Only whitespace between tokens changes. Key order, duplicate keys,
//! number text and string escapes are copied from the input.

use semver::Version;
use serde::de::IgnoredAny;

use super::{Formatted, Formatter};
use crate::error::FormatError;

/// First package format version whose JSON files are written without
/// HTML escaping.
pub const UNESCAPED_HTML_SINCE: Version = Version::new(2, 12, 0);

const INDENT: &str = "    ";

/// Escape written for a character the HTML-escaping variant rewrites
/// inside strings.
const fn html_escape(c: char) -> Option<&'static str> {
    match c {
        '<' => Some("\\u003c"),
        '>' => Some("\\u003e"),
        '&' => Some("\\u0026"),
        '\u{2028}' => Some("\\u2028"),
        '\u{2029}' => Some("\\u2029"),
        _ => None,
    }
}

/// Format a JSON document.
///
/// With `escape_html` the document is compacted first, so the output never
/// ends in a line break. Without it, trailing whitespace after the value is
/// kept as written. `already_formatted` is byte equality between input and
/// output.
///
/// # Errors
///
/// Returns a [`serde_json::Error`] if `content` is not valid JSON.
pub fn format(content: &[u8], escape_html: bool) -> Result<Formatted, serde_json::Error> {
    serde_json::from_slice::<IgnoredAny>(content)?;
    let text = String::from_utf8_lossy(content);
    let value = text.trim_end_matches(is_json_space);

    let mut out = String::with_capacity(content.len() + content.len() / 2);
    indent(value, escape_html, &mut out);
    if !escape_html {
        out.push_str(text.get(value.len()..).unwrap_or_default());
    }
    Ok(Formatted::compared_to(content, out.into_bytes()))
}

const fn is_json_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\n' | '\r')
}

fn newline(out: &mut String, depth: usize) {
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

/// Re-indent a validated JSON value: whitespace between tokens is dropped,
/// `,` and brackets start new lines, `:` gets one space and empty
/// containers stay on one line.
fn indent(src: &str, escape_html: bool, out: &mut String) {
    let mut depth = 0usize;
    let mut need_indent = false;
    let mut chars = src.chars();
    while let Some(c) = chars.next() {
        if is_json_space(c) {
            continue;
        }
        if need_indent && c != ']' && c != '}' {
            need_indent = false;
            depth += 1;
            newline(out, depth);
        }
        match c {
            '"' => {
                out.push(c);
                copy_string(&mut chars, escape_html, out);
            }
            '{' | '[' => {
                need_indent = true;
                out.push(c);
            }
            ',' => {
                out.push(c);
                newline(out, depth);
            }
            ':' => out.push_str(": "),
            '}' | ']' => {
                if need_indent {
                    need_indent = false;
                } else {
                    depth = depth.saturating_sub(1);
                    newline(out, depth);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
}

/// Copy the rest of a string token, closing quote included. Escape
/// sequences are copied as written.
fn copy_string(chars: &mut std::str::Chars<'_>, escape_html: bool, out: &mut String) {
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            '"' => {
                out.push(c);
                return;
            }
            _ => match html_escape(c).filter(|_| escape_html) {
                Some(escape) => out.push_str(escape),
                None => out.push(c),
            },
        }
    }
}

/// JSON [`Formatter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct JsonFormatter {
    /// Escape `<`, `>`, `&`, U+2028 and U+2029 inside strings.
    pub escape_html: bool,
}

impl JsonFormatter {
    /// Formatter for packages of format version `spec`.
    #[must_use]
    pub fn for_spec_version(spec: &Version) -> Self {
        Self {
            escape_html: *spec < UNESCAPED_HTML_SINCE,
        }
    }
}

impl Formatter for JsonFormatter {
    fn name(&self) -> &'static str {
        "json"
    }

    fn format(&self, content: &[u8]) -> Result<Formatted, FormatError> {
        Ok(format(content, self.escape_html)?)
    }
}
