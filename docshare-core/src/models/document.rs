//! Generic store documents and their back-references.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `(type, id)` pair recorded on a document, pointing to another document
/// that references it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocReference {
    #[serde(rename = "type")]
    pub doc_type: String,
    pub id: String,
}

impl DocReference {
    pub fn new(doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            doc_type: doc_type.into(),
            id: id.into(),
        }
    }

    /// Returns the composite `type/id` key used by `referenced_by` rules.
    pub fn key(&self) -> String {
        format!("{}/{}", self.doc_type, self.id)
    }
}

/// A document as held by the document store.
///
/// Arbitrary attributes are kept in `attrs`; the identity fields and the
/// back-reference list are lifted out because the sharing engine reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(rename = "_type")]
    pub doc_type: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub referenced_by: Vec<DocReference>,
    #[serde(flatten)]
    pub attrs: Map<String, Value>,
}

impl Document {
    /// Creates an empty document of the given type.
    pub fn new(doc_type: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            doc_type: doc_type.into(),
            rev: None,
            referenced_by: Vec::new(),
            attrs: Map::new(),
        }
    }

    /// Builder-style helper to set the document id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Builder-style helper to set an attribute.
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Builder-style helper to add a back-reference.
    pub fn referenced_by(mut self, doc_type: impl Into<String>, id: impl Into<String>) -> Self {
        self.referenced_by.push(DocReference::new(doc_type, id));
        self
    }

    /// Returns a string attribute, if present.
    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(Value::as_str)
    }
}
