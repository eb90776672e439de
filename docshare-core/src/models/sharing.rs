//! Sharing agreements and their types.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Document, Recipient, Rule};
use crate::error::SharingError;

/// Document type under which sharings are stored.
pub const SHARINGS_DOCTYPE: &str = "io.cozy.sharings";

/// The closed set of sharing types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharingType {
    OneShot,
    MasterSlave,
    MasterMaster,
}

impl SharingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SharingType::OneShot => "one-shot",
            SharingType::MasterSlave => "master-slave",
            SharingType::MasterMaster => "master-master",
        }
    }
}

impl fmt::Display for SharingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SharingType {
    type Err = SharingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-shot" => Ok(SharingType::OneShot),
            "master-slave" => Ok(SharingType::MasterSlave),
            "master-master" => Ok(SharingType::MasterMaster),
            other => Err(SharingError::BadSharingType(other.to_string())),
        }
    }
}

/// An agreement between one owner and N recipients to keep a set of
/// documents synchronized.
///
/// `sharing_type` is kept as the raw stored string so that a document with
/// an illegitimate type can still be loaded and rejected by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sharing {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub doc_id: String,
    #[serde(default)]
    pub sharing_id: String,
    #[serde(rename = "type", default)]
    pub sharing_type: String,
    #[serde(default)]
    pub owner: bool,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub permissions: Vec<Rule>,
    #[serde(default)]
    pub recipients: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Sharing {
    pub fn new(sharing_type: SharingType, desc: impl Into<String>) -> Self {
        Self {
            sharing_type: sharing_type.as_str().to_string(),
            desc: desc.into(),
            ..Default::default()
        }
    }

    /// Parses the stored sharing type against the closed enumeration.
    pub fn parsed_type(&self) -> Result<SharingType, SharingError> {
        self.sharing_type.parse()
    }

    /// Permission rules that apply to documents of `doc_type`, in order.
    pub fn rules_for<'a>(&'a self, doc_type: &'a str) -> impl Iterator<Item = &'a Rule> + 'a {
        self.permissions.iter().filter(move |r| r.doc_type == doc_type)
    }

    /// Loads a sharing from a store document.
    pub fn from_document(doc: &Document) -> Result<Self, SharingError> {
        let mut value = serde_json::Value::Object(doc.attrs.clone());
        value["_id"] = serde_json::Value::String(doc.id.clone());
        serde_json::from_value(value).map_err(|e| SharingError::DocumentNotLegitimate {
            sharing_id: doc.str_attr("sharing_id").unwrap_or_default().to_string(),
            sharing_type: format!("unreadable sharing document {}: {}", doc.id, e),
        })
    }

    /// Converts the sharing into a store document.
    pub fn to_document(&self) -> Result<Document, SharingError> {
        let value = serde_json::to_value(self)
            .map_err(|e| SharingError::StoreUnavailable(format!("encode sharing: {}", e)))?;
        let attrs = match value {
            serde_json::Value::Object(mut map) => {
                map.remove("_id");
                map
            }
            _ => serde_json::Map::new(),
        };
        Ok(Document {
            id: self.doc_id.clone(),
            doc_type: SHARINGS_DOCTYPE.to_string(),
            rev: None,
            referenced_by: Vec::new(),
            attrs,
        })
    }
}
