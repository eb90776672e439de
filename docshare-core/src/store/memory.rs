//! In-memory document store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use uuid::Uuid;

use super::{validate_field, DocumentStore, StoreError};
use crate::models::Document;

/// Document store backed by a `HashMap`.
///
/// Thread-safe via internal RwLock. Can be switched offline to exercise
/// the `StoreUnavailable` paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Documents indexed by `(doc_type, id)`.
    docs: RwLock<HashMap<(String, String), Document>>,
    offline: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent operation fail with `Unavailable` until turned
    /// back on.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents stored.
    pub fn len(&self) -> usize {
        self.docs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".to_string()));
        }
        Ok(())
    }

    fn next_rev(current: Option<&str>) -> String {
        let n = current
            .and_then(|r| r.split('-').next())
            .and_then(|n| n.parse::<u64>().ok())
            .unwrap_or(0);
        format!("{}-{}", n + 1, Uuid::new_v4().simple())
    }

    fn write(&self, mut doc: Document, must_be_new: bool) -> Result<Document, StoreError> {
        self.check_online()?;
        if doc.id.is_empty() {
            doc.id = Uuid::new_v4().simple().to_string();
        }

        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        let key = (doc.doc_type.clone(), doc.id.clone());
        let previous = docs.get(&key).and_then(|d| d.rev.clone());
        if must_be_new && docs.contains_key(&key) {
            return Err(StoreError::Conflict {
                doc_type: key.0,
                id: key.1,
            });
        }

        doc.rev = Some(Self::next_rev(previous.as_deref()));
        docs.insert(key, doc.clone());
        Ok(doc)
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, doc_type: &str, id: &str) -> Result<Option<Document>, StoreError> {
        self.check_online()?;
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        Ok(docs.get(&(doc_type.to_string(), id.to_string())).cloned())
    }

    async fn create(&self, doc: Document) -> Result<Document, StoreError> {
        self.write(doc, true)
    }

    async fn put(&self, doc: Document) -> Result<Document, StoreError> {
        self.write(doc, false)
    }

    async fn delete(&self, doc_type: &str, id: &str) -> Result<(), StoreError> {
        self.check_online()?;
        let mut docs = self.docs.write().unwrap_or_else(PoisonError::into_inner);
        docs.remove(&(doc_type.to_string(), id.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound {
                doc_type: doc_type.to_string(),
                id: id.to_string(),
            })
    }

    async fn find_by_field(
        &self,
        doc_type: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError> {
        self.check_online()?;
        validate_field(field)?;
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Document> = docs
            .values()
            .filter(|d| d.doc_type == doc_type && d.str_attr(field) == Some(value))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }

    async fn list(&self, doc_type: &str) -> Result<Vec<Document>, StoreError> {
        self.check_online()?;
        let docs = self.docs.read().unwrap_or_else(PoisonError::into_inner);
        let mut found: Vec<Document> = docs
            .values()
            .filter(|d| d.doc_type == doc_type)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(found)
    }
}
