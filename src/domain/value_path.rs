use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Segment of a dotted path (`meta.pagination.total`, `photos.*.id`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PathSegment {
    /// Mapping key, or a sequence index when the container is a sequence.
    Key(String),
    /// `*`: every element of a sequence or mapping.
    Wildcard,
}

/// Parsed dotted path addressing a value inside decoded JSON.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DottedPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl DottedPath {
    pub fn parse(input: &str) -> Result<Self, ValuePathError> {
        if input.is_empty() {
            return Err(ValuePathError::new(input, "path must not be empty"));
        }

        let mut segments = Vec::new();
        for (position, segment) in input.split('.').enumerate() {
            if segment.is_empty() {
                return Err(ValuePathError::new(
                    input,
                    &format!("segment {position} is empty"),
                ));
            }
            if segment == "*" {
                segments.push(PathSegment::Wildcard);
            } else {
                segments.push(PathSegment::Key(segment.to_string()));
            }
        }

        Ok(Self {
            raw: input.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn has_wildcard(&self) -> bool {
        self.segments
            .iter()
            .any(|segment| matches!(segment, PathSegment::Wildcard))
    }
}

impl fmt::Display for DottedPath {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.raw)
    }
}

/// Resolves `path` against `root`.
///
/// A literal key equal to the whole path wins over segment traversal, so
/// `{"a.b": 1}` resolves `a.b` to `1`. A wildcard segment only matches a
/// literal `*` key here; use [`expand`] to enumerate wildcard matches.
pub fn resolve<'a>(root: &'a Value, path: &DottedPath) -> Option<&'a Value> {
    if let Value::Object(map) = root {
        if let Some(flat) = map.get(path.as_str()) {
            return Some(flat);
        }
    }

    let mut current = root;
    for segment in &path.segments {
        let key = match segment {
            PathSegment::Key(key) => key.as_str(),
            PathSegment::Wildcard => "*",
        };
        current = child(current, key)?;
    }
    Some(current)
}

/// Resolves a raw dotted path without requiring it to parse.
///
/// The flat key is tried first, so `{"a..b": 1}` resolves `a..b`. A path with
/// empty segments that is not a flat key addresses nothing.
pub fn resolve_str<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    if let Value::Object(map) = root {
        if let Some(flat) = map.get(path) {
            return Some(flat);
        }
    }
    let parsed = DottedPath::parse(path).ok()?;
    resolve(root, &parsed)
}

/// Returns true when `path` addresses a value, including an explicit `null`.
pub fn has_path(root: &Value, path: &DottedPath) -> bool {
    resolve(root, path).is_some()
}

/// Expands every `*` segment of `path` into the concrete paths present in
/// `root`. Paths without wildcards are returned unchanged even when absent.
pub fn expand(root: &Value, path: &DottedPath) -> Vec<DottedPath> {
    if !path.has_wildcard() {
        return vec![path.clone()];
    }

    let mut expanded = Vec::new();
    let mut prefix = Vec::new();
    expand_into(Some(root), &path.segments, &mut prefix, &mut expanded);
    expanded
}

fn expand_into(
    current: Option<&Value>,
    remaining: &[PathSegment],
    prefix: &mut Vec<String>,
    out: &mut Vec<DottedPath>,
) {
    let Some((segment, rest)) = remaining.split_first() else {
        out.push(concrete_path(prefix));
        return;
    };

    match segment {
        PathSegment::Key(key) => {
            prefix.push(key.clone());
            expand_into(current.and_then(|value| child(value, key)), rest, prefix, out);
            prefix.pop();
        }
        PathSegment::Wildcard => match current {
            Some(Value::Array(items)) => {
                for (index, item) in items.iter().enumerate() {
                    prefix.push(index.to_string());
                    expand_into(Some(item), rest, prefix, out);
                    prefix.pop();
                }
            }
            Some(Value::Object(map)) => {
                for (key, item) in map {
                    prefix.push(key.clone());
                    expand_into(Some(item), rest, prefix, out);
                    prefix.pop();
                }
            }
            _ => {}
        },
    }
}

fn concrete_path(segments: &[String]) -> DottedPath {
    DottedPath {
        raw: segments.join("."),
        segments: segments
            .iter()
            .map(|segment| PathSegment::Key(segment.clone()))
            .collect(),
    }
}

fn child<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(key),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get(index)),
        _ => None,
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid dotted path `{input}`: {reason}")]
pub struct ValuePathError {
    input: String,
    reason: String,
}

impl ValuePathError {
    fn new(input: &str, reason: &str) -> Self {
        Self {
            input: input.to_string(),
            reason: reason.to_string(),
        }
    }
}
