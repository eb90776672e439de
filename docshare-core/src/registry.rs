//! Sharing registry accessor.
//!
//! Looks up sharing agreements by their identifier in the document store.
//! Pure read: nothing is cached here.

use crate::error::SharingResult;
use crate::models::{Document, Sharing, SHARINGS_DOCTYPE};
use crate::store::DocumentStore;

/// Read access to the sharings held by one instance's store.
#[derive(Debug)]
pub struct SharingRegistry<'a, S> {
    store: &'a S,
}

impl<'a, S: DocumentStore> SharingRegistry<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Returns every sharing whose `sharing_id` equals `id`.
    ///
    /// An empty result is not an error; an unreachable store is
    /// `StoreUnavailable`.
    pub async fn find_sharings_by_id(&self, id: &str) -> SharingResult<Vec<Sharing>> {
        let docs = self.find_sharing_documents(id).await?;
        docs.iter().map(Sharing::from_document).collect()
    }

    /// Returns the stored documents whose `sharing_id` equals `id`, without
    /// decoding them.
    ///
    /// Lets callers count matches even when one of them is unreadable.
    pub async fn find_sharing_documents(&self, id: &str) -> SharingResult<Vec<Document>> {
        Ok(self
            .store
            .find_by_field(SHARINGS_DOCTYPE, "sharing_id", id)
            .await?)
    }

    /// Fetches a sharing by its document id.
    pub async fn get_by_doc_id(&self, doc_id: &str) -> SharingResult<Option<Sharing>> {
        match self.store.get(SHARINGS_DOCTYPE, doc_id).await? {
            Some(doc) => Sharing::from_document(&doc).map(Some),
            None => Ok(None),
        }
    }

    /// Returns every sharing in the store.
    pub async fn list(&self) -> SharingResult<Vec<Sharing>> {
        let docs = self.store.list(SHARINGS_DOCTYPE).await?;
        docs.iter().map(Sharing::from_document).collect()
    }
}
