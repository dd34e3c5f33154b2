//! Scalar and list literal syntax shared by the Thunder encoder and decoder.

use super::errors::ParseErrorKind;
use crate::map::Value;

/// Parses a trimmed scalar literal into the narrowest matching [`Value`].
///
/// Quoted text becomes [`Value::Text`], `true`/`false` a [`Value::Bool`],
/// integer syntax an [`Value::Int`] and decimal or exponent syntax a
/// [`Value::Float`]. Anything else is rejected; bare words are not strings.
pub fn parse_scalar(literal: &str) -> Result<Value, ParseErrorKind> {
    if literal.starts_with('"') {
        let (text, consumed) = unquote(literal)?;
        if !literal[consumed..].trim().is_empty() {
            return Err(ParseErrorKind::TrailingText {
                text: literal[consumed..].trim().to_string(),
            });
        }
        return Ok(Value::Text(text));
    }

    match literal {
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        "inf" | "+inf" => return Ok(Value::Float(f64::INFINITY)),
        "-inf" => return Ok(Value::Float(f64::NEG_INFINITY)),
        "NaN" => return Ok(Value::Float(f64::NAN)),
        _ => {}
    }

    let invalid = || ParseErrorKind::InvalidLiteral {
        literal: literal.to_string(),
    };

    let digits = literal.strip_prefix(['-', '+']).unwrap_or(literal);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return Err(invalid());
    }

    if digits.bytes().all(|b| b.is_ascii_digit()) {
        return literal.parse::<i64>().map(Value::Int).map_err(|_| invalid());
    }

    let float_syntax = digits
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'-' | b'+'));
    let has_digit = digits.bytes().any(|b| b.is_ascii_digit());
    if float_syntax && has_digit {
        return literal.parse::<f64>().map(Value::Float).map_err(|_| invalid());
    }

    Err(invalid())
}

/// Reads a quoted string at the start of `input`.
///
/// Returns the unescaped text and the number of bytes consumed, closing quote
/// included.
pub fn unquote(input: &str) -> Result<(String, usize), ParseErrorKind> {
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, '"')) => {}
        _ => return Err(ParseErrorKind::UnterminatedString),
    }

    let mut out = String::new();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Ok((out, index + 1)),
            '\\' => match chars.next() {
                Some((_, '"')) => out.push('"'),
                Some((_, '\\')) => out.push('\\'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, 't')) => out.push('\t'),
                Some((_, 'r')) => out.push('\r'),
                Some((_, other)) => return Err(ParseErrorKind::InvalidEscape { escape: other }),
                None => return Err(ParseErrorKind::UnterminatedString),
            },
            other => out.push(other),
        }
    }
    Err(ParseErrorKind::UnterminatedString)
}

/// Writes `text` as a quoted string literal.
pub fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

/// Formats a scalar so that [`parse_scalar`] reads it back unchanged.
///
/// Floats use the `Debug` form, which always carries a `.` or an exponent.
/// Returns `None` for lists and maps.
pub fn format_scalar(value: &Value) -> Option<String> {
    match value {
        Value::Text(s) => Some(quote(s)),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(n) => Some(n.to_string()),
        Value::Float(n) => Some(format_float(*n)),
        Value::List(_) | Value::Map(_) => None,
    }
}

/// Formats a float so it reads back as a float: `1.0`, not `1`.
pub fn format_float(number: f64) -> String {
    format!("{number:?}")
}

/// Reads one list item. Quoted items are unescaped, bare items are trimmed.
pub fn parse_item(raw: &str) -> Result<String, ParseErrorKind> {
    let raw = raw.trim();
    if raw.starts_with('"') {
        let (text, consumed) = unquote(raw)?;
        if !raw[consumed..].trim().is_empty() {
            return Err(ParseErrorKind::TrailingText {
                text: raw[consumed..].trim().to_string(),
            });
        }
        Ok(text)
    } else {
        Ok(raw.to_string())
    }
}

/// Formats a list item, quoting it only when a bare item would not survive
/// a round trip.
pub fn format_item(item: &str) -> String {
    let needs_quotes = item.starts_with('"')
        || item.trim() != item
        || item.contains(['\n', '\r', ',', ']']);
    if needs_quotes {
        quote(item)
    } else {
        item.to_string()
    }
}

/// Splits the inside of an inline list (`a, "b, c", d`) into items.
pub fn split_inline_list(inner: &str) -> Result<Vec<String>, ParseErrorKind> {
    let mut items = Vec::new();
    if inner.trim().is_empty() {
        return Ok(items);
    }

    let mut rest = inner;
    loop {
        let trimmed = rest.trim_start();
        let (item, after) = if trimmed.starts_with('"') {
            let (text, consumed) = unquote(trimmed)?;
            (text, &trimmed[consumed..])
        } else {
            let end = trimmed.find(',').unwrap_or(trimmed.len());
            (trimmed[..end].trim_end().to_string(), &trimmed[end..])
        };
        items.push(item);

        let after = after.trim_start();
        match after.strip_prefix(',') {
            Some(next) => rest = next,
            None if after.is_empty() => break,
            None => {
                return Err(ParseErrorKind::TrailingText {
                    text: after.to_string(),
                });
            }
        }
    }
    Ok(items)
}
