//! Error types for decoding configuration text.
//!
//! Every failure carries the 1-based line and column where the decoder gave
//! up. Decoders build into fresh maps, so a [`ParseError`] never comes with a
//! partially decoded result.

use std::fmt;

use thiserror::Error;

/// What went wrong while decoding.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `}` line with no block open.
    UnexpectedClose,

    /// End of input inside a block.
    UnterminatedBlock { key: String },

    /// Something other than whitespace follows `{` or `}`.
    TrailingText { text: String },

    /// A key with neither `:` nor `{` after it.
    MissingSeparator { key: String },

    /// A `:` with nothing after it.
    MissingValue { key: String },

    /// An entry line that starts with a separator.
    EmptyKey,

    /// A key containing characters the format reserves.
    InvalidKey { key: String, reason: String },

    /// End of input, or a closing bracket missing, inside a list.
    UnterminatedList { key: String },

    /// A line inside a multiline list that is not an `- item`.
    InvalidListItem { line: String },

    /// A scalar that is not a string, boolean, integer or float.
    InvalidLiteral { literal: String },

    /// A quoted string without its closing quote.
    UnterminatedString,

    /// An unknown backslash escape inside a quoted string.
    InvalidEscape { escape: char },

    /// Input that is not UTF-8.
    InvalidUtf8,

    /// Syntax errors reported by the JSON parser.
    Json { message: String },

    /// A JSON value with no counterpart in an attribute map.
    UnsupportedValue { path: String, found: &'static str },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErrorKind::UnexpectedClose => write!(f, "'}}' without an open block"),
            ParseErrorKind::UnterminatedBlock { key } => {
                write!(f, "block '{key}' is never closed")
            }
            ParseErrorKind::TrailingText { text } => write!(f, "unexpected text '{text}'"),
            ParseErrorKind::MissingSeparator { key } => {
                write!(f, "expected ':' or '{{' after '{key}'")
            }
            ParseErrorKind::MissingValue { key } => write!(f, "missing value for '{key}'"),
            ParseErrorKind::EmptyKey => write!(f, "empty key"),
            ParseErrorKind::InvalidKey { key, reason } => {
                write!(f, "invalid key '{key}': {reason}")
            }
            ParseErrorKind::UnterminatedList { key } => {
                write!(f, "list '{key}' is never closed")
            }
            ParseErrorKind::InvalidListItem { line } => {
                write!(f, "expected '- item' or ']', found '{line}'")
            }
            ParseErrorKind::InvalidLiteral { literal } => {
                write!(f, "cannot parse value '{literal}'")
            }
            ParseErrorKind::UnterminatedString => write!(f, "unterminated string"),
            ParseErrorKind::InvalidEscape { escape } => {
                write!(f, "unknown escape '\\{}'", escape.escape_default())
            }
            ParseErrorKind::InvalidUtf8 => write!(f, "invalid UTF-8"),
            ParseErrorKind::Json { message } => write!(f, "{message}"),
            ParseErrorKind::UnsupportedValue { path, found } => {
                write!(f, "unsupported {found} at '{path}'")
            }
        }
    }
}

/// A decoding failure with its position.
///
/// Line and column are 1-based. A line of 0 means the position is unknown,
/// which only happens for structural JSON errors found after parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ParseError {
    line: usize,
    column: usize,
    kind: ParseErrorKind,
}

impl ParseError {
    pub fn new(line: usize, column: usize, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }

    pub(crate) fn unpositioned(kind: ParseErrorKind) -> Self {
        Self::new(0, 0, kind)
    }

    /// Builds the error for bytes that are not UTF-8, pointing at the first
    /// offending byte.
    pub fn invalid_utf8(bytes: &[u8], err: &std::str::Utf8Error) -> Self {
        let valid = &bytes[..err.valid_up_to()];
        // The prefix is valid by definition.
        let prefix = String::from_utf8_lossy(valid);
        let line = prefix.matches('\n').count() + 1;
        let column = prefix
            .rsplit('\n')
            .next()
            .map_or(0, |last| last.chars().count())
            + 1;
        Self::new(line, column, ParseErrorKind::InvalidUtf8)
    }

    /// 1-based line, or 0 if unknown.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column in characters, or 0 if unknown.
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Check if this error is about block or list structure rather than a
    /// single value.
    pub fn is_structure_error(&self) -> bool {
        matches!(
            self.kind,
            ParseErrorKind::UnexpectedClose
                | ParseErrorKind::UnterminatedBlock { .. }
                | ParseErrorKind::UnterminatedList { .. }
                | ParseErrorKind::TrailingText { .. }
        )
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "Parse error: {}", self.kind)
        } else {
            write!(
                f,
                "Parse error at line {}, column {}: {}",
                self.line, self.column, self.kind
            )
        }
    }
}

impl From<ParseError> for crate::Error {
    fn from(err: ParseError) -> Self {
        crate::Error::Parse(err)
    }
}
