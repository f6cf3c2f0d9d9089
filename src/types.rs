use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Namespace every flat key starts with
pub const NAMESPACE: &str = "mrd:mrdScanData";

/// One step of a navigation route: a field name or a sequence index
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(usize),
    Field(String),
}

impl Segment {
    pub fn as_field(&self) -> Option<&str> {
        match self {
            Segment::Field(name) => Some(name),
            Segment::Index(_) => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(idx) => Some(*idx),
            Segment::Field(_) => None,
        }
    }
}

impl From<&str> for Segment {
    fn from(name: &str) -> Self {
        Segment::Field(name.to_string())
    }
}

impl From<usize> for Segment {
    fn from(idx: usize) -> Self {
        Segment::Index(idx)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Index(idx) => write!(f, "{}", idx),
        }
    }
}

/// Route from the document root to a single node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyPath(pub Vec<Segment>);

impl KeyPath {
    pub fn root(field: impl Into<String>) -> Self {
        KeyPath(vec![Segment::Field(field.into())])
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// New path with a field appended
    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Field(field.to_string()));
        KeyPath(segments)
    }

    /// New path with a sequence index appended
    pub fn element(&self, idx: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(Segment::Index(idx));
        KeyPath(segments)
    }

    /// Walk the document along this path.
    ///
    /// Returns `None` when a segment does not exist or addresses the wrong
    /// container kind. An empty path resolves to nothing.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        if self.0.is_empty() {
            return None;
        }

        self.0.iter().try_fold(document, |node, segment| match (segment, node) {
            (Segment::Field(name), Value::Object(map)) => map.get(name),
            (Segment::Index(idx), Value::Array(items)) => items.get(*idx),
            _ => None,
        })
    }
}

impl<S: Into<Segment>> FromIterator<S> for KeyPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        KeyPath(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Working list of key-paths, in discovery order
pub type PathList = Vec<KeyPath>;

/// Flat namespaced record handed to the record store.
///
/// Backed by an insertion-ordered map: re-inserting an existing key replaces
/// the value in place, so the last write wins without reordering.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord(Map<String, Value>);

impl FlatRecord {
    pub fn new() -> Self {
        FlatRecord(Map::new())
    }

    /// Insert a value, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Opaque reference to a record accepted by a record sink
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordHandle(pub String);

impl RecordHandle {
    pub fn new(id: impl Into<String>) -> Self {
        RecordHandle(id.into())
    }
}

/// What the materializer does when two paths produce the same flat key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Keep the value of the path processed last
    #[default]
    LastWriteWins,
    /// Fail the projection
    Reject,
}

/// Configuration for the projection
#[derive(Debug, Clone)]
pub struct ProjectionConfig {
    /// Upper bound on enumeration rounds before giving up
    pub max_rounds: usize,

    /// Key collision handling during materialization
    pub collisions: CollisionPolicy,

    /// Value written over `coilLabelList` once materialization is done.
    /// `None` keeps the aggregated coil names.
    pub coil_label_placeholder: Option<String>,

    /// Seed the record with `scans = mrd:mrdScanData`
    pub datatype_marker: bool,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        ProjectionConfig {
            max_rounds: 64,
            collisions: CollisionPolicy::LastWriteWins,
            coil_label_placeholder: Some(String::from("TEMP")),
            datatype_marker: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_mixed_segments() {
        let doc = json!({"encoding": [{"trajectory": "cartesian"}]});
        let path: KeyPath = vec![
            Segment::from("encoding"),
            Segment::Index(0),
            Segment::from("trajectory"),
        ]
        .into_iter()
        .collect();

        assert_eq!(path.resolve(&doc).unwrap(), "cartesian");
        assert_eq!(path.to_string(), "encoding/0/trajectory");
    }

    #[test]
    fn test_resolve_wrong_container() {
        let doc = json!({"encoding": {"trajectory": "radial"}});
        let path = KeyPath::root("encoding").element(0);

        assert!(path.resolve(&doc).is_none());
        assert!(KeyPath::default().resolve(&doc).is_none());
    }

    #[test]
    fn test_record_last_write_keeps_position() {
        let mut record = FlatRecord::new();
        record.insert("a", json!(1));
        record.insert("b", json!(2));
        let replaced = record.insert("a", json!(3));

        assert_eq!(replaced, Some(json!(1)));
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(record.get("a").unwrap(), 3);
    }

    #[test]
    fn test_segment_serializes_untagged() {
        let path = KeyPath::root("sequenceParameters").child("TR").element(0);
        assert_eq!(
            serde_json::to_value(&path).unwrap(),
            json!(["sequenceParameters", "TR", 0])
        );
    }
}
