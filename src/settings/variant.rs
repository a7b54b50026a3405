//! Parser for the GVariant text format printed by `gsettings get`.
//!
//! Only the shapes desktop settings keys use are understood: booleans,
//! integers, strings and string arrays. Anything else is kept verbatim.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Bool(bool),
    Int(i64),
    Double(f64),
    Str(String),
    StrArray(Vec<String>),
    Other(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot parse GVariant text {text:?}: {reason}")]
pub struct ParseError {
    pub text: String,
    pub reason: &'static str,
}

impl Variant {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str_array(&self) -> Option<&[String]> {
        match self {
            Variant::StrArray(items) => Some(items),
            _ => None,
        }
    }

    /// True for `@as []` and any other empty array form.
    pub fn is_empty_array(&self) -> bool {
        matches!(self, Variant::StrArray(items) if items.is_empty())
            || matches!(self, Variant::Other(text) if text.ends_with("[]"))
    }

    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let trimmed = text.trim();
        let fail = |reason| ParseError {
            text: trimmed.to_string(),
            reason,
        };

        if trimmed.is_empty() {
            return Err(fail("empty input"));
        }

        match trimmed {
            "true" => return Ok(Variant::Bool(true)),
            "false" => return Ok(Variant::Bool(false)),
            "@as []" | "[]" => return Ok(Variant::StrArray(Vec::new())),
            _ => {}
        }

        // Integers may carry a type annotation such as "uint32 5".
        let numeric = strip_type_annotation(trimmed);
        if let Ok(n) = numeric.parse::<i64>() {
            return Ok(Variant::Int(n));
        }
        if numeric.contains('.') {
            if let Ok(d) = numeric.parse::<f64>() {
                return Ok(Variant::Double(d));
            }
        }

        if trimmed.starts_with('\'') || trimmed.starts_with('"') {
            let mut chars = trimmed.chars().peekable();
            let s = parse_string(&mut chars).ok_or_else(|| fail("unterminated string"))?;
            if chars.next().is_some() {
                return Err(fail("trailing characters after string"));
            }
            return Ok(Variant::Str(s));
        }

        if let Some(body) = trimmed.strip_prefix('[') {
            if let Some(items) = parse_string_list(body) {
                return Ok(Variant::StrArray(items));
            }
        }

        Ok(Variant::Other(trimmed.to_string()))
    }
}

fn strip_type_annotation(text: &str) -> &str {
    const ANNOTATIONS: [&str; 8] = [
        "byte ", "int16 ", "uint16 ", "int32 ", "uint32 ", "int64 ", "uint64 ", "double ",
    ];
    ANNOTATIONS
        .iter()
        .find_map(|a| text.strip_prefix(a))
        .unwrap_or(text)
}

/// Parse the remainder of `['a', 'b']` after the opening bracket.
fn parse_string_list(body: &str) -> Option<Vec<String>> {
    let mut items = Vec::new();
    let mut chars = body.chars().peekable();

    loop {
        skip_whitespace(&mut chars);
        match chars.peek()? {
            ']' => {
                chars.next();
                break;
            }
            '\'' | '"' => items.push(parse_string(&mut chars)?),
            _ => return None,
        }
        skip_whitespace(&mut chars);
        match chars.next()? {
            ',' => continue,
            ']' => break,
            _ => return None,
        }
    }

    skip_whitespace(&mut chars);
    chars.next().is_none().then_some(items)
}

fn skip_whitespace(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}

/// Parse a single- or double-quoted string with backslash escapes.
fn parse_string(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> Option<String> {
    let quote = chars.next()?;
    let mut out = String::new();
    loop {
        match chars.next()? {
            '\\' => match chars.next()? {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            },
            c if c == quote => return Some(out),
            c => out.push(c),
        }
    }
}
