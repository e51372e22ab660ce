//! Typed field paths and wildcard resolution.
//!
//! Paths are explicit segment sequences rather than dotted strings, so
//! lookups and writes over a document tree stay unambiguous. A `*`
//! segment means "every key or index present at this level" and is
//! expanded against a concrete document by [`resolve`] before any
//! transform runs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::fmt;

/// One segment of a field path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named field; numeric names index into arrays.
    Field(String),
    /// Every key or index present at this level.
    Wildcard,
}

/// A field path, possibly containing wildcard segments.
///
/// Parsed from dotted strings (`items.*.ssn`); concrete paths (no
/// wildcards) address exactly one position in a document.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses a dotted path; `*` segments become wildcards.
    pub fn parse(path: &str) -> Self {
        let segments = path
            .split('.')
            .map(|part| {
                if part == "*" {
                    Segment::Wildcard
                } else {
                    Segment::Field(part.to_string())
                }
            })
            .collect();
        Self { segments }
    }

    /// The empty path, addressing the document root.
    pub fn root() -> Self {
        Self::default()
    }

    /// A single-segment path for a top-level field. The name is taken
    /// literally (no dot splitting).
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![Segment::Field(name.into())],
        }
    }

    /// Returns the path segments.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns the first segment, if any.
    pub fn first(&self) -> Option<&Segment> {
        self.segments.first()
    }

    /// True for the empty (root) path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when any segment is a wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.segments.contains(&Segment::Wildcard)
    }

    /// Returns this path extended by one field segment.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.into()));
        Self { segments }
    }

    /// Returns this path with another appended.
    pub fn join(&self, suffix: &FieldPath) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(suffix.segments.iter().cloned());
        Self { segments }
    }

    /// Returns this path prefixed by one field segment.
    pub fn prefixed_with(&self, name: impl Into<String>) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(Segment::Field(name.into()));
        segments.extend(self.segments.iter().cloned());
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            match segment {
                Segment::Field(name) => write!(f, "{name}")?,
                Segment::Wildcard => write!(f, "*")?,
            }
        }
        Ok(())
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(FieldPath::parse(&s))
    }
}

/// Looks up the value at a concrete path. Numeric segments index into
/// arrays; wildcard segments never match.
pub fn get_path<'a>(root: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    let mut current = root;
    for segment in path.segments() {
        let Segment::Field(name) = segment else {
            return None;
        };
        current = child_of(current, name)?;
    }
    Some(current)
}

/// True when the concrete path addresses a present position (a present
/// null counts).
pub fn has_path(root: &Value, path: &FieldPath) -> bool {
    get_path(root, path).is_some()
}

/// Writes `value` at a concrete path, creating missing intermediate
/// containers: arrays for numeric segments (padded with null), objects
/// otherwise. A scalar in the way is replaced by a fresh container.
pub fn set_path(root: &mut Value, path: &FieldPath, value: Value) {
    set_segments(root, path.segments(), value);
}

fn set_segments(node: &mut Value, segments: &[Segment], value: Value) {
    let Some((segment, rest)) = segments.split_first() else {
        *node = value;
        return;
    };
    let Segment::Field(name) = segment else {
        return;
    };
    let index = name.parse::<usize>().ok();

    match (&mut *node, index) {
        (Value::Array(items), Some(i)) => {
            if items.len() <= i {
                items.resize(i + 1, Value::Null);
            }
            set_segments(&mut items[i], rest, value);
        }
        (Value::Object(map), _) => {
            let child = map.entry(name.clone()).or_insert(Value::Null);
            set_segments(child, rest, value);
        }
        _ => {
            *node = match index {
                Some(_) => Value::Array(Vec::new()),
                None => Value::Object(Map::new()),
            };
            set_segments(node, segments, value);
        }
    }
}

/// Expands a possibly-wildcarded path against a document into the
/// ordered set of concrete paths it matches.
///
/// Every emitted path addresses a present value in the same document
/// snapshot. A wildcard branch whose remaining suffix resolves to
/// nothing, but which itself existed, still records the path walked so
/// far (best-effort partial match — a deliberate, tested policy). Zero
/// matches is a normal outcome.
pub fn resolve(document: &Value, path: &FieldPath) -> Vec<FieldPath> {
    let mut matches = Vec::new();
    resolve_into(document, path.segments(), FieldPath::root(), &mut matches);
    matches
}

fn resolve_into(
    node: &Value,
    segments: &[Segment],
    prefix: FieldPath,
    matches: &mut Vec<FieldPath>,
) {
    if !node.is_object() && !node.is_array() {
        // Scalar reached with path left over: keep the partial match.
        if !prefix.is_root() {
            matches.push(prefix);
        }
        return;
    }
    let Some((segment, rest)) = segments.split_first() else {
        if !prefix.is_root() {
            matches.push(prefix);
        }
        return;
    };

    match segment {
        Segment::Wildcard => {
            for (key, child) in children(node) {
                if child.is_null() {
                    if !prefix.is_root() {
                        matches.push(prefix.clone());
                    }
                } else {
                    resolve_into(child, rest, prefix.child(key), matches);
                }
            }
        }
        Segment::Field(name) => match child_of(node, name) {
            None | Some(Value::Null) => {}
            Some(child) => {
                if rest.is_empty() {
                    matches.push(prefix.child(name.clone()));
                } else {
                    resolve_into(child, rest, prefix.child(name.clone()), matches);
                }
            }
        },
    }
}

fn child_of<'a>(node: &'a Value, name: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(name),
        Value::Array(items) => items.get(name.parse::<usize>().ok()?),
        _ => None,
    }
}

fn children(node: &Value) -> Vec<(String, &Value)> {
    match node {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}
