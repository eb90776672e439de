//! Propagation of document changes to remote recipients.

mod http;

pub use http::HttpPropagator;

use std::future::Future;

use serde::Serialize;

use crate::error::PropagationError;
use crate::models::{Document, EventType, Recipient};

/// A change to deliver to one recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SharingUpdate {
    pub sharing_id: String,
    pub event_type: EventType,
    pub doc: Document,
}

/// Delivers sharing updates to a recipient.
///
/// Each call is an independent network operation; implementations hold no
/// state shared between recipients.
pub trait Propagator: Send + Sync {
    fn propagate(
        &self,
        recipient: &Recipient,
        update: &SharingUpdate,
    ) -> impl Future<Output = Result<(), PropagationError>> + Send;
}
