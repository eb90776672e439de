//! Data model shared by the sharing engine and the application.

mod document;
mod event;
mod recipient;
mod rule;
mod sharing;

pub use document::{DocReference, Document};
pub use event::{EventDoc, EventType, SharingMessage, TriggerEvent};
pub use recipient::{Client, Recipient, RecipientStatus};
pub use rule::{Rule, Selector, Verb, SELECTOR_REFERENCED_BY};
pub use sharing::{Sharing, SharingType, SHARINGS_DOCTYPE};
