use std::fmt;
use std::fs;
use std::path::Path;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::error::IsaError;

pub const STUDIES_FIELD: &str = "studies";
pub const ASSAYS_FIELD: &str = "assays";
pub const DATA_FILES_FIELD: &str = "dataFiles";

/// A leaf value of the metadata tree.
///
/// Integers and floats compare numerically with each other, so a filter
/// value of `25` matches a stored `25.0`. Strings never equal numbers.
#[derive(Debug, Clone)]
pub enum Scalar {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::String(a), Scalar::String(b)) => a == b,
            (Scalar::Integer(a), Scalar::Integer(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Integer(a), Scalar::Float(b)) | (Scalar::Float(b), Scalar::Integer(a)) => {
                *a as f64 == *b
            }
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Null, Scalar::Null) => true,
            _ => false,
        }
    }
}

impl Scalar {
    /// Interpret free text the way a user would type it on the command line:
    /// integer, float, bool, otherwise a string. Surrounding double quotes
    /// force a string. Words such as `inf` or `NaN` stay strings.
    pub fn guess(text: &str) -> Self {
        if let Some(inner) = text
            .strip_prefix('"')
            .and_then(|rest| rest.strip_suffix('"'))
        {
            return Scalar::String(inner.to_string());
        }
        if let Ok(i) = text.parse::<i64>() {
            return Scalar::Integer(i);
        }
        if looks_numeric(text)
            && let Ok(f) = text.parse::<f64>()
            && f.is_finite()
        {
            return Scalar::Float(f);
        }
        match text {
            "true" => Scalar::Bool(true),
            "false" => Scalar::Bool(false),
            _ => Scalar::String(text.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Integer(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(s) => Some(s),
            _ => None,
        }
    }
}

fn looks_numeric(text: &str) -> bool {
    text.bytes().any(|b| b.is_ascii_digit())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'+' | b'-' | b'.' | b'e' | b'E'))
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::String(s) => write!(f, "{s}"),
            Scalar::Integer(i) => write!(f, "{i}"),
            Scalar::Float(v) => write!(f, "{v}"),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Null => write!(f, "null"),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::String(s) => serializer.serialize_str(s),
            Scalar::Integer(i) => serializer.serialize_i64(*i),
            Scalar::Float(f) => serializer.serialize_f64(*f),
            Scalar::Bool(b) => serializer.serialize_bool(*b),
            Scalar::Null => serializer.serialize_unit(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Integer(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// One node of an ISA metadata tree. Records keep their fields in the
/// order they appear in the source document.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataNode {
    Record(Vec<(String, MetadataNode)>),
    Sequence(Vec<MetadataNode>),
    Scalar(Scalar),
}

impl MetadataNode {
    pub fn get(&self, field: &str) -> Option<&MetadataNode> {
        match self {
            MetadataNode::Record(fields) => fields
                .iter()
                .find(|(key, _)| key == field)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            MetadataNode::Scalar(scalar) => Some(scalar),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_scalar().and_then(Scalar::as_str)
    }

    pub fn as_sequence(&self) -> Option<&[MetadataNode]> {
        match self {
            MetadataNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_record(&self) -> bool {
        matches!(self, MetadataNode::Record(_))
    }
}

impl From<Value> for MetadataNode {
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => MetadataNode::Record(
                map.into_iter()
                    .map(|(key, value)| (key, MetadataNode::from(value)))
                    .collect(),
            ),
            Value::Array(items) => {
                MetadataNode::Sequence(items.into_iter().map(MetadataNode::from).collect())
            }
            Value::String(s) => MetadataNode::Scalar(Scalar::String(s)),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    MetadataNode::Scalar(Scalar::Integer(i))
                } else if let Some(f) = n.as_f64() {
                    MetadataNode::Scalar(Scalar::Float(f))
                } else {
                    MetadataNode::Scalar(Scalar::String(n.to_string()))
                }
            }
            Value::Bool(b) => MetadataNode::Scalar(Scalar::Bool(b)),
            Value::Null => MetadataNode::Scalar(Scalar::Null),
        }
    }
}

impl From<Scalar> for MetadataNode {
    fn from(value: Scalar) -> Self {
        MetadataNode::Scalar(value)
    }
}

impl Serialize for MetadataNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MetadataNode::Record(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (key, value) in fields {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            MetadataNode::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            MetadataNode::Scalar(scalar) => scalar.serialize(serializer),
        }
    }
}

/// A loaded ISA document. Construction checks that the root is a record
/// with a `studies` list; everything deeper is checked lazily.
#[derive(Debug, Clone)]
pub struct IsaDocument {
    root: MetadataNode,
}

impl IsaDocument {
    pub fn load(path: &Path) -> Result<Self, IsaError> {
        let content =
            fs::read_to_string(path).map_err(|err| IsaError::DocumentRead {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let document = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded metadata document");
        Ok(document)
    }

    pub fn from_json_str(content: &str) -> Result<Self, IsaError> {
        let value: Value =
            serde_json::from_str(content).map_err(|err| IsaError::DocumentParse(err.to_string()))?;
        Self::from_node(MetadataNode::from(value))
    }

    /// Validate a prebuilt tree. The collector walks any depth, but `Drop`,
    /// `Clone`, `PartialEq`, `Debug` and `Serialize` on `MetadataNode` recurse.
    /// Documents from `load`/`from_json_str` stay within serde_json's nesting
    /// limit of 128. Hand-built trees must stay shallow enough for the stack.
    pub fn from_node(root: MetadataNode) -> Result<Self, IsaError> {
        if !root.is_record() {
            return Err(IsaError::MalformedDocument(
                "document root is not a record".to_string(),
            ));
        }
        match root.get(STUDIES_FIELD) {
            Some(MetadataNode::Sequence(_)) => Ok(Self { root }),
            Some(_) => Err(IsaError::MalformedDocument(format!(
                "`{STUDIES_FIELD}` is not a list"
            ))),
            None => Err(IsaError::MalformedDocument(format!(
                "missing `{STUDIES_FIELD}` at document root"
            ))),
        }
    }

    pub fn root(&self) -> &MetadataNode {
        &self.root
    }

    pub fn studies(&self) -> Result<Vec<StudyView<'_>>, IsaError> {
        let studies = self
            .root
            .get(STUDIES_FIELD)
            .and_then(MetadataNode::as_sequence)
            .unwrap_or_default();
        studies
            .iter()
            .enumerate()
            .map(|(index, node)| {
                if node.is_record() {
                    Ok(StudyView { node })
                } else {
                    Err(IsaError::MalformedDocument(format!(
                        "study #{index} is not a record"
                    )))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StudyView<'a> {
    node: &'a MetadataNode,
}

impl<'a> StudyView<'a> {
    pub fn node(&self) -> &'a MetadataNode {
        self.node
    }

    pub fn identifier(&self) -> Option<&'a str> {
        self.node.get("identifier").and_then(MetadataNode::as_str)
    }

    /// Assays of this study. A study without an `assays` field has none.
    pub fn assays(&self) -> Result<Vec<AssayView<'a>>, IsaError> {
        let label = self.identifier().unwrap_or("<unnamed>");
        let items = match self.node.get(ASSAYS_FIELD) {
            None => return Ok(Vec::new()),
            Some(node) => node.as_sequence().ok_or_else(|| {
                IsaError::MalformedDocument(format!(
                    "`{ASSAYS_FIELD}` of study {label} is not a list"
                ))
            })?,
        };
        items
            .iter()
            .enumerate()
            .map(|(index, node)| {
                if node.is_record() {
                    Ok(AssayView { node })
                } else {
                    Err(IsaError::MalformedDocument(format!(
                        "assay #{index} of study {label} is not a record"
                    )))
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssayView<'a> {
    node: &'a MetadataNode,
}

impl<'a> AssayView<'a> {
    pub fn node(&self) -> &'a MetadataNode {
        self.node
    }

    pub fn data_files(&self) -> Result<Vec<DataFileRef>, IsaError> {
        let items = match self.node.get(DATA_FILES_FIELD) {
            None => return Ok(Vec::new()),
            Some(node) => node.as_sequence().ok_or_else(|| {
                IsaError::MalformedDocument(format!("`{DATA_FILES_FIELD}` is not a list"))
            })?,
        };
        items.iter().map(DataFileRef::from_node).collect()
    }
}

/// Pointer from an assay to one of its backing data files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataFileRef {
    #[serde(rename = "type")]
    pub file_type: String,
    pub name: String,
}

impl DataFileRef {
    pub fn new(file_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            file_type: file_type.into(),
            name: name.into(),
        }
    }

    pub fn from_node(node: &MetadataNode) -> Result<Self, IsaError> {
        let field = |key: &str| {
            node.get(key)
                .and_then(MetadataNode::as_str)
                .map(|v| v.to_string())
                .ok_or_else(|| {
                    IsaError::MalformedDocument(format!("data file entry without string `{key}`"))
                })
        };
        Ok(Self {
            file_type: field("type")?,
            name: field("name")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guess_scalar_types() {
        assert_eq!(Scalar::guess("25"), Scalar::Integer(25));
        assert_eq!(Scalar::guess("0.5"), Scalar::Float(0.5));
        assert_eq!(Scalar::guess("true"), Scalar::Bool(true));
        assert_eq!(Scalar::guess("\"25\""), Scalar::String("25".to_string()));
        assert_eq!(
            Scalar::guess("Simulated RDF"),
            Scalar::String("Simulated RDF".to_string())
        );
        assert_eq!(Scalar::guess("inf"), Scalar::String("inf".to_string()));
        assert_eq!(Scalar::guess("NaN"), Scalar::String("NaN".to_string()));
        assert_eq!(Scalar::guess("1e400"), Scalar::String("1e400".to_string()));
        assert_eq!(Scalar::guess("-2.5e-3"), Scalar::Float(-0.0025));
    }

    #[test]
    fn numeric_scalars_compare_across_kinds() {
        assert_eq!(Scalar::Integer(25), Scalar::Float(25.0));
        assert_ne!(Scalar::Integer(25), Scalar::String("25".to_string()));
    }

    #[test]
    fn record_keeps_document_order() {
        let value: Value = serde_json::from_str(r#"{"b": 1, "a": 2}"#).unwrap();
        let node = MetadataNode::from(value);
        let MetadataNode::Record(fields) = node else {
            panic!("expected record");
        };
        let keys: Vec<_> = fields.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["b", "a"]);
    }
}
