//! The Thunder text format.
//!
//! ```text
//! # top header
//! name: "alice"
//! # nested config
//! server {
//!   port: 8080
//!   hosts: [
//!     - a.example
//!     - b.example
//!   ]
//! }
//! ```
//!
//! Decoding is line oriented and indentation is insignificant. Comment lines
//! (`#`) and blank lines are buffered until the next entry claims them as its
//! leading comment; the run before a level's first entry becomes that level's
//! header and the run left over at the end of a level becomes its footer.
//!
//! Encoding writes the canonical layout: two spaces per depth, blank lines
//! without indentation, `\n` after every line. Text in that layout decodes and
//! re-encodes to the same bytes.

use std::iter::{Enumerate, Peekable};
use std::str::Lines;

use tracing::trace;

use super::errors::{ParseError, ParseErrorKind};
use super::literal::{
    format_float, format_item, parse_item, parse_scalar, quote, split_inline_list,
};
use super::{Codec, CommentMode, check_keys};
use crate::Result;
use crate::map::path::validate_key;
use crate::map::{AttributeMap, Value};
use crate::provider::ContainerProvider;

const INDENT: &str = "  ";

/// Codec for the Thunder format.
#[derive(Debug, Clone, Copy, Default)]
pub struct Thunder;

impl Codec for Thunder {
    fn decode_with<P>(&self, text: &str, mode: CommentMode, provider: &P) -> Result<AttributeMap>
    where
        P: ContainerProvider + ?Sized,
    {
        let map = Decoder::new(text, mode, provider)?.run()?;
        trace!(entries = map.len(), ?mode, "decoded thunder text");
        Ok(map)
    }

    fn encode(&self, map: &AttributeMap) -> Result<String> {
        check_keys(map)?;
        let mut out = String::new();
        write_map(&mut out, map, 0);
        Ok(out)
    }
}

/// A block that has been opened but not yet closed.
struct Frame {
    key: String,
    comments: Vec<String>,
    map: AttributeMap,
    pending: Vec<String>,
    line: usize,
    column: usize,
}

struct Decoder<'t, 'p, P: ?Sized> {
    lines: Peekable<Enumerate<Lines<'t>>>,
    mode: CommentMode,
    provider: &'p P,
    root: AttributeMap,
    root_pending: Vec<String>,
    stack: Vec<Frame>,
}

/// 1-based character column of a byte offset in `line`.
fn column_of(line: &str, byte: usize) -> usize {
    line[..byte].chars().count() + 1
}

/// Byte offset of the first non-whitespace character.
fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

impl<'t, 'p, P> Decoder<'t, 'p, P>
where
    P: ContainerProvider + ?Sized,
{
    fn new(text: &'t str, mode: CommentMode, provider: &'p P) -> Result<Self> {
        Ok(Self {
            lines: text.lines().enumerate().peekable(),
            mode,
            provider,
            root: provider.new_map()?,
            root_pending: Vec::new(),
            stack: Vec::new(),
        })
    }

    fn current(&mut self) -> (&mut AttributeMap, &mut Vec<String>) {
        match self.stack.last_mut() {
            Some(frame) => (&mut frame.map, &mut frame.pending),
            None => (&mut self.root, &mut self.root_pending),
        }
    }

    /// Moves the buffered comment run to its owner: the header if the level
    /// has no entries yet, otherwise the next entry.
    fn take_pending(&mut self) -> Vec<String> {
        let (map, pending) = self.current();
        let run = std::mem::take(pending);
        if map.is_empty() {
            map.set_header(run);
            Vec::new()
        } else {
            run
        }
    }

    fn run(mut self) -> Result<AttributeMap> {
        while let Some((index, line)) = self.lines.next() {
            let number = index + 1;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                if self.mode == CommentMode::Preserve {
                    let stored = trimmed.to_string();
                    self.current().1.push(stored);
                }
            } else if let Some(rest) = trimmed.strip_prefix('}') {
                self.close_block(line, number, rest)?;
            } else {
                self.entry(line, number)?;
            }
        }

        if let Some(frame) = self.stack.pop() {
            return Err(ParseError::new(
                frame.line,
                frame.column,
                ParseErrorKind::UnterminatedBlock { key: frame.key },
            )
            .into());
        }

        let footer = std::mem::take(&mut self.root_pending);
        self.root.set_footer(footer);
        Ok(self.root)
    }

    fn close_block(&mut self, line: &str, number: usize, rest: &str) -> Result<()> {
        let brace = indent_of(line);
        if !rest.trim().is_empty() {
            return Err(ParseError::new(
                number,
                column_of(line, brace + 1 + (rest.len() - rest.trim_start().len())),
                ParseErrorKind::TrailingText {
                    text: rest.trim().to_string(),
                },
            )
            .into());
        }

        let Some(mut frame) = self.stack.pop() else {
            return Err(ParseError::new(
                number,
                column_of(line, brace),
                ParseErrorKind::UnexpectedClose,
            )
            .into());
        };

        frame.map.set_footer(std::mem::take(&mut frame.pending));
        let (parent, _) = self.current();
        parent.add_commented(frame.key, frame.map, frame.comments);
        Ok(())
    }

    fn entry(&mut self, line: &str, number: usize) -> Result<()> {
        let start = indent_of(line);
        let body = line.trim();
        let key_error = |kind| ParseError::new(number, column_of(line, start), kind);

        let separator = body.find([':', '{']);
        let raw_key = separator.map_or(body, |at| &body[..at]);
        let key = raw_key.trim();
        if key.is_empty() {
            return Err(key_error(ParseErrorKind::EmptyKey).into());
        }
        if let Err(err) = validate_key(key) {
            let reason = match err {
                crate::map::MapError::InvalidKey { reason, .. } => reason,
                other => other.to_string(),
            };
            return Err(key_error(ParseErrorKind::InvalidKey {
                key: key.to_string(),
                reason,
            })
            .into());
        }

        let Some(at) = separator else {
            // Brace on the following line.
            let brace_next = self
                .lines
                .peek()
                .is_some_and(|(_, next)| next.trim() == "{");
            if !brace_next {
                return Err(key_error(ParseErrorKind::MissingSeparator {
                    key: key.to_string(),
                })
                .into());
            }
            self.lines.next();
            return self.open_block(key, number, column_of(line, start));
        };

        let rest = &body[at + 1..];
        let rest_offset = start + at + 1 + (rest.len() - rest.trim_start().len());
        let rest = rest.trim();

        if body[at..].starts_with('{') {
            if !rest.is_empty() {
                return Err(ParseError::new(
                    number,
                    column_of(line, rest_offset),
                    ParseErrorKind::TrailingText {
                        text: rest.to_string(),
                    },
                )
                .into());
            }
            return self.open_block(key, number, column_of(line, start));
        }

        let value_error = |kind| ParseError::new(number, column_of(line, rest_offset), kind);
        if rest.is_empty() {
            return Err(value_error(ParseErrorKind::MissingValue {
                key: key.to_string(),
            })
            .into());
        }

        let value = if rest == "[" {
            Value::List(self.multiline_list(key, number, column_of(line, start))?)
        } else if let Some(inner) = rest.strip_prefix('[') {
            let Some(inner) = inner.strip_suffix(']') else {
                return Err(value_error(ParseErrorKind::UnterminatedList {
                    key: key.to_string(),
                })
                .into());
            };
            let mut list = self.provider.new_list()?;
            list.extend(split_inline_list(inner).map_err(value_error)?);
            Value::List(list)
        } else {
            parse_scalar(rest).map_err(value_error)?
        };

        let comments = self.take_pending();
        self.current().0.add_commented(key, value, comments);
        Ok(())
    }

    fn open_block(&mut self, key: &str, line: usize, column: usize) -> Result<()> {
        let comments = self.take_pending();
        let map = self.provider.new_map()?;
        self.stack.push(Frame {
            key: key.to_string(),
            comments,
            map,
            pending: Vec::new(),
            line,
            column,
        });
        Ok(())
    }

    fn multiline_list(&mut self, key: &str, line: usize, column: usize) -> Result<Vec<String>> {
        let mut list = self.provider.new_list()?;
        for (index, raw) in self.lines.by_ref() {
            let trimmed = raw.trim();
            if trimmed == "]" {
                return Ok(list);
            }
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some(item) = trimmed.strip_prefix('-') else {
                return Err(ParseError::new(
                    index + 1,
                    column_of(raw, indent_of(raw)),
                    ParseErrorKind::InvalidListItem {
                        line: trimmed.to_string(),
                    },
                )
                .into());
            };
            let item = parse_item(item).map_err(|kind| {
                ParseError::new(index + 1, column_of(raw, indent_of(raw) + 1), kind)
            })?;
            list.push(item);
        }
        Err(ParseError::new(
            line,
            column,
            ParseErrorKind::UnterminatedList {
                key: key.to_string(),
            },
        )
        .into())
    }
}

fn write_indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}

fn write_comments(out: &mut String, lines: &[String], depth: usize) {
    for line in lines {
        if !line.is_empty() {
            write_indent(out, depth);
            out.push_str(line);
        }
        out.push('\n');
    }
}

fn write_scalar(out: &mut String, literal: &str) {
    out.push_str(": ");
    out.push_str(literal);
    out.push('\n');
}

fn write_map(out: &mut String, map: &AttributeMap, depth: usize) {
    write_comments(out, map.header(), depth);
    for entry in map.entries() {
        write_comments(out, entry.comments(), depth);
        write_indent(out, depth);
        out.push_str(entry.key());
        match entry.value() {
            Value::Map(nested) => {
                out.push_str(" {\n");
                write_map(out, nested, depth + 1);
                write_indent(out, depth);
                out.push_str("}\n");
            }
            Value::List(items) if items.is_empty() => out.push_str(": []\n"),
            Value::List(items) => {
                out.push_str(": [\n");
                for item in items {
                    write_indent(out, depth + 1);
                    out.push('-');
                    if !item.is_empty() {
                        out.push(' ');
                        out.push_str(&format_item(item));
                    }
                    out.push('\n');
                }
                write_indent(out, depth);
                out.push_str("]\n");
            }
            Value::Text(text) => write_scalar(out, &quote(text)),
            Value::Bool(flag) => write_scalar(out, &flag.to_string()),
            Value::Int(number) => write_scalar(out, &number.to_string()),
            Value::Float(number) => write_scalar(out, &format_float(*number)),
        }
    }
    write_comments(out, map.footer(), depth);
}
