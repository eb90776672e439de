//! Document store interface.
//!
//! The sharing engine only needs keyed reads and writes plus a field lookup.
//! Both the in-memory store below and the application's sqlite store
//! implement them.

mod memory;

pub use memory::MemoryStore;

use std::future::Future;

use thiserror::Error;

use crate::error::SharingError;
use crate::models::Document;

/// Errors reported by a document store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The backend could not be reached or failed mid-operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The targeted document does not exist.
    #[error("document not found: {doc_type}/{id}")]
    NotFound { doc_type: String, id: String },

    /// A document with the same id already exists.
    #[error("document already exists: {doc_type}/{id}")]
    Conflict { doc_type: String, id: String },

    /// A field name that cannot be used for lookups.
    #[error("invalid field name: {0:?}")]
    InvalidField(String),
}

impl From<StoreError> for SharingError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Unavailable(_) => SharingError::StoreUnavailable(e.to_string()),
            StoreError::NotFound { .. } | StoreError::Conflict { .. } | StoreError::InvalidField(_) => {
                SharingError::StoreRejected(e.to_string())
            }
        }
    }
}

/// Storage for typed documents with arbitrary attributes.
///
/// Implementations must be safe to share across worker tasks; each single
/// document read or write is atomic.
pub trait DocumentStore: Send + Sync {
    /// Fetches one document by type and id.
    fn get(
        &self,
        doc_type: &str,
        id: &str,
    ) -> impl Future<Output = Result<Option<Document>, StoreError>> + Send;

    /// Persists a new document, assigning an id if it has none, and returns
    /// the stored copy.
    fn create(&self, doc: Document) -> impl Future<Output = Result<Document, StoreError>> + Send;

    /// Replaces an existing document, or creates it if missing.
    fn put(&self, doc: Document) -> impl Future<Output = Result<Document, StoreError>> + Send;

    /// Deletes a document.
    fn delete(&self, doc_type: &str, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Returns every document of `doc_type` whose top-level string attribute
    /// `field` equals `value`.
    fn find_by_field(
        &self,
        doc_type: &str,
        field: &str,
        value: &str,
    ) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;

    /// Returns every document of `doc_type`.
    fn list(&self, doc_type: &str) -> impl Future<Output = Result<Vec<Document>, StoreError>> + Send;
}

/// Rejects field names that are not plain identifiers.
pub fn validate_field(field: &str) -> Result<(), StoreError> {
    if field.is_empty()
        || !field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(StoreError::InvalidField(field.to_string()));
    }
    Ok(())
}
