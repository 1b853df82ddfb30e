//! A small JSONPath evaluator over [`serde_json::Value`].
//!
//! Supported syntax:
//!
//! | Expression      | Meaning                                       |
//! |-----------------|-----------------------------------------------|
//! | `$`             | the document root (must come first)           |
//! | `.name`         | object member                                 |
//! | `['name']`      | object member, any characters allowed         |
//! | `[2]`, `[-1]`   | array element, negative counts from the end   |
//! | `[*]`, `.*`     | every array element or object value           |
//! | `[1:3]`, `[:-1]`| array slice                                   |
//!
//! Wildcards and slices select several nodes; the result is then an array of
//! those nodes.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

/// Errors produced while parsing or evaluating a path expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("invalid path {path:?} at offset {offset}: {reason}")]
    Syntax {
        path: String,
        offset: usize,
        reason: &'static str,
    },

    #[error("key {key:?} not found")]
    KeyNotFound { key: String },

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("cannot apply {segment} to {found}")]
    NotContainer { segment: String, found: &'static str },
}

/// One step of a parsed path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(i64),
    Wildcard,
    Slice { start: Option<i64>, end: Option<i64> },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(key) => write!(f, "[{:?}]", key),
            Segment::Index(index) => write!(f, "[{}]", index),
            Segment::Wildcard => write!(f, "[*]"),
            Segment::Slice { start, end } => {
                write!(f, "[")?;
                if let Some(start) = start {
                    write!(f, "{}", start)?;
                }
                write!(f, ":")?;
                if let Some(end) = end {
                    write!(f, "{}", end)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    /// Parse a path expression.
    pub fn parse(path: &str) -> Result<Self, PathError> {
        Parser::new(path).parse()
    }

    #[cfg(test)]
    fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Select the node(s) addressed by this path.
    pub fn lookup(&self, document: &Value) -> Result<Value, PathError> {
        select(document, &self.segments)
    }
}

impl FromStr for JsonPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Parse `path` and evaluate it against `document` in one step.
pub fn lookup(document: &Value, path: &str) -> Result<Value, PathError> {
    JsonPath::parse(path)?.lookup(document)
}

fn select(value: &Value, segments: &[Segment]) -> Result<Value, PathError> {
    let Some((segment, rest)) = segments.split_first() else {
        return Ok(value.clone());
    };

    match (segment, value) {
        (Segment::Key(key), Value::Object(map)) => match map.get(key) {
            Some(child) => select(child, rest),
            None => Err(PathError::KeyNotFound { key: key.clone() }),
        },
        (Segment::Index(index), Value::Array(items)) => {
            let position = resolve_index(*index, items.len()).ok_or(
                PathError::IndexOutOfRange {
                    index: *index,
                    len: items.len(),
                },
            )?;
            select(&items[position], rest)
        }
        (Segment::Wildcard, Value::Array(items)) => select_each(items.iter(), rest),
        (Segment::Wildcard, Value::Object(map)) => select_each(map.values(), rest),
        (Segment::Slice { start, end }, Value::Array(items)) => {
            let len = items.len();
            let from = clamp_bound(*start, len, 0);
            let to = clamp_bound(*end, len, len);
            let selected: &[Value] = if from < to { &items[from..to] } else { &[] };
            select_each(selected.iter(), rest)
        }
        (segment, other) => Err(PathError::NotContainer {
            segment: segment.to_string(),
            found: type_name(other),
        }),
    }
}

fn select_each<'a>(
    values: impl Iterator<Item = &'a Value>,
    rest: &[Segment],
) -> Result<Value, PathError> {
    values
        .map(|value| select(value, rest))
        .collect::<Result<Vec<_>, _>>()
        .map(Value::Array)
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = i64::try_from(len).ok()?;
    let position = if index < 0 { len + index } else { index };
    if (0..len).contains(&position) {
        usize::try_from(position).ok()
    } else {
        None
    }
}

fn clamp_bound(bound: Option<i64>, len: usize, default: usize) -> usize {
    let Some(bound) = bound else {
        return default;
    };
    let signed_len = i64::try_from(len).unwrap_or(i64::MAX);
    let position = if bound < 0 { signed_len + bound } else { bound };
    usize::try_from(position.clamp(0, signed_len)).unwrap_or(len)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

struct Parser<'a> {
    path: &'a str,
    offset: usize,
}

impl<'a> Parser<'a> {
    fn new(path: &'a str) -> Self {
        Self { path, offset: 0 }
    }

    fn parse(mut self) -> Result<JsonPath, PathError> {
        if !self.eat('$') {
            return Err(self.error("path must start with '$'"));
        }

        let mut segments = Vec::new();
        while let Some(c) = self.peek() {
            let segment = match c {
                '.' => {
                    self.bump();
                    self.parse_dotted()?
                }
                '[' => {
                    self.bump();
                    self.parse_bracketed()?
                }
                _ => return Err(self.error("expected '.' or '['")),
            };
            segments.push(segment);
        }

        Ok(JsonPath { segments })
    }

    fn parse_dotted(&mut self) -> Result<Segment, PathError> {
        if self.eat('*') {
            return Ok(Segment::Wildcard);
        }

        let start = self.offset;
        while let Some(c) = self.peek() {
            if c == '.' || c == '[' {
                break;
            }
            self.bump();
        }

        if start == self.offset {
            return Err(self.error("empty member name"));
        }
        Ok(Segment::Key(self.path[start..self.offset].to_string()))
    }

    fn parse_bracketed(&mut self) -> Result<Segment, PathError> {
        let segment = match self.peek() {
            Some('*') => {
                self.bump();
                Segment::Wildcard
            }
            Some(quote @ ('\'' | '"')) => {
                self.bump();
                let start = self.offset;
                while let Some(c) = self.peek() {
                    if c == quote {
                        break;
                    }
                    self.bump();
                }
                let key = self.path[start..self.offset].to_string();
                if !self.eat(quote) {
                    return Err(self.error("unterminated quoted name"));
                }
                Segment::Key(key)
            }
            _ => {
                let start = self.offset;
                while let Some(c) = self.peek() {
                    if c == ']' {
                        break;
                    }
                    self.bump();
                }
                let inner = self.path[start..self.offset].trim();
                self.parse_index_or_slice(inner)?
            }
        };

        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }
        Ok(segment)
    }

    fn parse_index_or_slice(&self, inner: &str) -> Result<Segment, PathError> {
        if let Some((start, end)) = inner.split_once(':') {
            return Ok(Segment::Slice {
                start: self.parse_bound(start)?,
                end: self.parse_bound(end)?,
            });
        }

        inner
            .parse()
            .map(Segment::Index)
            .map_err(|_| self.error("expected an integer index"))
    }

    fn parse_bound(&self, bound: &str) -> Result<Option<i64>, PathError> {
        let bound = bound.trim();
        if bound.is_empty() {
            return Ok(None);
        }
        bound
            .parse()
            .map(Some)
            .map_err(|_| self.error("expected an integer slice bound"))
    }

    fn peek(&self) -> Option<char> {
        self.path[self.offset..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.offset += c.len_utf8();
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn error(&self, reason: &'static str) -> PathError {
        PathError::Syntax {
            path: self.path.to_string(),
            offset: self.offset,
            reason,
        }
    }
}
