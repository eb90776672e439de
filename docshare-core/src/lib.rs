//! docshare core library
//!
//! Sharing agreements between an owner instance and remote recipients, and
//! the engine that decides whether a document change must be propagated:
//!
//! - [`registry`]: looks sharings up by identifier
//! - [`validator`]: existence, uniqueness and type legitimacy
//! - [`selector`]: does a document still fall within a rule?
//! - [`recipients`]: who may receive a given kind of change
//! - [`dispatcher`]: drives the above for one change event and fans out

pub mod creation;
pub mod dispatcher;
pub mod error;
pub mod mail;
pub mod models;
pub mod propagation;
pub mod recipients;
pub mod registry;
pub mod selector;
pub mod store;
pub mod validator;

pub use creation::{check_sharing_creation, create_sharing};
pub use dispatcher::{DispatchOutcome, DispatchState, FailureKind, JobContext, UpdateDispatcher};
pub use error::{PropagationError, PropagationFailures, SharingError, SharingResult};
pub use mail::{generate_oauth_query_string, send_sharing_mails, MailMessage, Mailer};
pub use models::{
    Client, DocReference, Document, EventType, Recipient, RecipientStatus, Rule, Selector, Sharing,
    SharingType, TriggerEvent, Verb, SHARINGS_DOCTYPE,
};
pub use propagation::{HttpPropagator, Propagator, SharingUpdate};
pub use recipients::resolve_recipients;
pub use registry::SharingRegistry;
pub use selector::is_document_still_shared;
pub use store::{DocumentStore, MemoryStore, StoreError};
pub use validator::{validate_sharing, validate_sharing_documents, ValidatedSharing};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
