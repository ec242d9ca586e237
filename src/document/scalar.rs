//! Scalar quoting, escaping and block-scalar folding rules.

/// Trailing line-break handling of a block scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Chomping {
    /// `-`: drop all trailing line breaks.
    Strip,
    /// default: keep exactly one trailing line break.
    Clip,
    /// `+`: keep every trailing line break.
    Keep,
}

impl Chomping {
    /// Indicator character written after `|` or `>`.
    pub(crate) const fn indicator(self) -> &'static str {
        match self {
            Self::Strip => "-",
            Self::Clip => "",
            Self::Keep => "+",
        }
    }

    /// Pick the indicator that reproduces the trailing line breaks of `value`.
    pub(crate) fn for_value(value: &str) -> Self {
        let body = value.trim_end_matches('\n');
        match value.len() - body.len() {
            0 => Self::Strip,
            1 => Self::Clip,
            _ => Self::Keep,
        }
    }
}

/// Return `true` if a plain scalar with this text would be read as a
/// boolean, number or null instead of a string.
pub(crate) fn resolves_to_non_string(s: &str) -> bool {
    if matches!(
        s,
        "" | "~"
            | "null"
            | "Null"
            | "NULL"
            | "true"
            | "True"
            | "TRUE"
            | "false"
            | "False"
            | "FALSE"
            | "yes"
            | "Yes"
            | "YES"
            | "no"
            | "No"
            | "NO"
            | "on"
            | "On"
            | "ON"
            | "off"
            | "Off"
            | "OFF"
            | "y"
            | "Y"
            | "n"
            | "N"
    ) {
        return true;
    }
    let unsigned = s.strip_prefix(['-', '+']).unwrap_or(s);
    if matches!(
        unsigned,
        ".inf" | ".Inf" | ".INF" | ".nan" | ".NaN" | ".NAN"
    ) {
        return true;
    }
    if let Some(hex) = unsigned.strip_prefix("0x") {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit() || c == '_');
    }
    if let Some(oct) = unsigned.strip_prefix("0o") {
        return !oct.is_empty() && oct.chars().all(|c| matches!(c, '0'..='7' | '_'));
    }
    let digits: String = s.chars().filter(|&c| c != '_').collect();
    digits.parse::<i64>().is_ok()
        || (digits.chars().any(|c| c.is_ascii_digit()) && digits.parse::<f64>().is_ok())
}

/// Return `true` if `s` contains characters that only a double-quoted
/// scalar can carry.
pub(crate) fn needs_escaping(s: &str) -> bool {
    s.chars().any(|c| {
        (c.is_control() && c != '\n' && c != '\t') || matches!(c, '\u{feff}' | '\u{2028}' | '\u{2029}')
    })
}

/// Return `true` if `s` can be written as a plain scalar and read back as
/// the same text. `flow` tightens the rules for text inside `[...]`/`{...}`.
pub(crate) fn is_plain_safe(s: &str, flow: bool) -> bool {
    let Some(first) = s.chars().next() else {
        return false;
    };
    if s != s.trim() || s.contains('\n') || needs_escaping(s) {
        return false;
    }
    if s.starts_with("---") || s.starts_with("...") {
        return false;
    }
    let second = s.chars().nth(1);
    match first {
        '-' | '?' | ':' => {
            if second.is_none_or(|c| c == ' ' || (flow && is_flow_indicator(c))) {
                return false;
            }
        }
        ',' | '[' | ']' | '{' | '}' | '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%'
        | '@' | '`' => return false,
        _ => {}
    }
    if s.contains(": ") || s.contains(" #") || s.contains(":\t") || s.contains("\t#") {
        return false;
    }
    if s.ends_with(':') {
        return false;
    }
    if flow && s.chars().any(is_flow_indicator) {
        return false;
    }
    true
}

/// `,[]{}`
pub(crate) const fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Render `s` as a single-quoted scalar.
pub(crate) fn single_quoted(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Render `s` as a double-quoted scalar.
pub(crate) fn double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            '\u{07}' => out.push_str("\\a"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0b}' => out.push_str("\\v"),
            '\u{0c}' => out.push_str("\\f"),
            '\u{1b}' => out.push_str("\\e"),
            '\u{85}' => out.push_str("\\N"),
            '\u{a0}' => out.push_str("\\_"),
            '\u{2028}' => out.push_str("\\L"),
            '\u{2029}' => out.push_str("\\P"),
            '\u{feff}' => out.push_str("\\uFEFF"),
            c if c.is_control() => {
                out.push_str(&format!("\\x{:02X}", u32::from(c)));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Apply folding to the content lines of a `>` block scalar.
///
/// `lines` have the block indentation removed; empty entries are blank
/// lines. Trailing blank lines must already be stripped.
pub(crate) fn fold_lines(lines: &[&str]) -> String {
    let mut out = String::new();
    let mut pending_breaks = 0usize;
    let mut started = false;
    let mut prev_more_indented = false;
    for line in lines {
        if line.is_empty() {
            pending_breaks += 1;
            continue;
        }
        let more_indented = line.starts_with([' ', '\t']);
        if !started {
            out.push_str(&"\n".repeat(pending_breaks));
            started = true;
        } else if more_indented || prev_more_indented {
            out.push_str(&"\n".repeat(pending_breaks + 1));
        } else if pending_breaks == 0 {
            out.push(' ');
        } else {
            out.push_str(&"\n".repeat(pending_breaks));
        }
        out.push_str(line);
        pending_breaks = 0;
        prev_more_indented = more_indented;
    }
    out
}

/// Fold the line breaks of a plain or quoted scalar body.
///
/// A single break becomes a space, `n` blank lines become `n` line breaks
/// and the whitespace around each break is dropped. With `escapes`, a line
/// ending in an unescaped `\` joins the next one directly.
pub(crate) fn fold_flow_lines(text: &str, escapes: bool) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let last = lines.len().saturating_sub(1);
    let mut out = String::with_capacity(text.len());
    let mut breaks = 0usize;
    let mut joined = false;
    for (i, raw) in lines.into_iter().enumerate() {
        let mut line = if i == 0 {
            raw
        } else {
            raw.trim_start_matches([' ', '\t'])
        };
        let mut escaped_break = false;
        if i < last {
            let backslashes = line.len() - line.trim_end_matches('\\').len();
            if escapes && backslashes % 2 == 1 {
                line = line.get(..line.len() - 1).unwrap_or(line);
                escaped_break = true;
            } else {
                line = line.trim_end_matches([' ', '\t']);
            }
            if i > 0 && line.is_empty() && !escaped_break {
                breaks += 1;
                continue;
            }
        }
        if i > 0 && !joined {
            if breaks == 0 {
                out.push(' ');
            } else {
                out.push_str(&"\n".repeat(breaks));
            }
        }
        out.push_str(line);
        breaks = 0;
        joined = escaped_break;
    }
    out
}

/// Check the escapes of a double-quoted body and rewrite the YAML-only
/// `\N`, `\_`, `\L`, `\P` and `\<TAB>` forms into their JSON-style
/// equivalents.
///
/// Returns the offending escape as the error message.
pub(crate) fn normalize_escapes(text: &str) -> Result<String, String> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escape = chars.next().ok_or_else(|| "invalid escape '\\'".to_string())?;
        match escape {
            'N' => out.push_str("\\u0085"),
            '_' => out.push_str("\\u00A0"),
            'L' => out.push_str("\\u2028"),
            'P' => out.push_str("\\u2029"),
            '\t' => out.push_str("\\t"),
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.by_ref().take(width).collect();
                let valid = digits.len() == width
                    && u32::from_str_radix(&digits, 16)
                        .ok()
                        .and_then(char::from_u32)
                        .is_some();
                if !valid {
                    return Err(format!("invalid escape '\\{escape}{digits}'"));
                }
                out.push('\\');
                out.push(escape);
                out.push_str(&digits);
            }
            '0' | 'a' | 'b' | 't' | 'n' | 'v' | 'f' | 'r' | 'e' | ' ' | '"' | '/' | '\\' => {
                out.push('\\');
                out.push(escape);
            }
            other => return Err(format!("invalid escape '\\{other}'")),
        }
    }
    Ok(out)
}

/// Split the body of a folded scalar (trailing line breaks removed) into
/// the lines that fold back into it.
///
/// Returns `None` when a line starts with whitespace; such text cannot be
/// folded losslessly and must be written as a literal block.
pub(crate) fn unfold(body: &str) -> Option<Vec<String>> {
    let mut lines = Vec::new();
    let mut rest = body;
    // Leading line breaks map one-to-one onto blank lines.
    while let Some(stripped) = rest.strip_prefix('\n') {
        lines.push(String::new());
        rest = stripped;
    }
    let mut segments = rest.split('\n').peekable();
    while let Some(segment) = segments.next() {
        if segment.starts_with([' ', '\t']) {
            return None;
        }
        lines.push(segment.to_string());
        // A run of n line breaks between text is written as n blank lines.
        while segments.peek() == Some(&"") {
            segments.next();
            lines.push(String::new());
        }
        if segments.peek().is_some() {
            lines.push(String::new());
        }
    }
    Some(lines)
}
