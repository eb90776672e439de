//! Change notifications consumed by the update dispatcher.

use serde::{Deserialize, Serialize};

use super::{Document, Rule, Verb};
use crate::error::SharingError;

/// Kind of change that happened to a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventType {
    Created,
    Updated,
    Deleted,
}

impl EventType {
    /// The permission verb a recipient needs to receive this change.
    pub fn verb(&self) -> Verb {
        match self {
            EventType::Created => Verb::Create,
            EventType::Updated => Verb::Update,
            EventType::Deleted => Verb::Delete,
        }
    }
}

/// The changed document along with the kind of change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDoc {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub doc: Document,
}

/// Routing information attached to the trigger when it was registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharingMessage {
    pub sharing_id: String,
    pub rule: Rule,
}

/// An inbound notification that a shared document changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerEvent {
    pub event: EventDoc,
    pub message: SharingMessage,
}

impl TriggerEvent {
    pub fn new(event_type: EventType, doc: Document, sharing_id: impl Into<String>, rule: Rule) -> Self {
        Self {
            event: EventDoc { event_type, doc },
            message: SharingMessage {
                sharing_id: sharing_id.into(),
                rule,
            },
        }
    }

    /// Decodes a job payload.
    pub fn from_json(payload: &[u8]) -> Result<Self, SharingError> {
        serde_json::from_slice(payload).map_err(|e| SharingError::MalformedMessage(e.to_string()))
    }

    pub fn event_type(&self) -> EventType {
        self.event.event_type
    }

    pub fn doc(&self) -> &Document {
        &self.event.doc
    }

    pub fn sharing_id(&self) -> &str {
        &self.message.sharing_id
    }
}
