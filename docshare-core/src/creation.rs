//! Sharing creation.

use chrono::Utc;
use uuid::Uuid;

use crate::error::{SharingError, SharingResult};
use crate::models::{RecipientStatus, Sharing};
use crate::registry::SharingRegistry;
use crate::store::DocumentStore;

/// Checks that a sharing can be created: its type belongs to the
/// enumeration and it names at least one reachable recipient.
pub fn check_sharing_creation(sharing: &Sharing) -> SharingResult<()> {
    sharing.parsed_type()?;

    if sharing.recipients.is_empty() {
        return Err(SharingError::RecipientDoesNotExist(
            "sharing has no recipient".to_string(),
        ));
    }
    if let Some(pos) = sharing.recipients.iter().position(|r| r.email.trim().is_empty()) {
        return Err(SharingError::RecipientDoesNotExist(format!(
            "recipient #{} has no email",
            pos
        )));
    }
    Ok(())
}

/// Persists a new sharing owned by this instance.
///
/// A fresh `sharing_id` is generated when none is given and every recipient
/// starts as pending. A given `sharing_id` already held by a stored sharing,
/// readable or not, is `SharingIdTaken`.
pub async fn create_sharing<S: DocumentStore>(store: &S, mut sharing: Sharing) -> SharingResult<Sharing> {
    check_sharing_creation(&sharing)?;

    if sharing.sharing_id.is_empty() {
        sharing.sharing_id = Uuid::new_v4().to_string();
    } else {
        let existing = SharingRegistry::new(store)
            .find_sharing_documents(&sharing.sharing_id)
            .await?;
        if !existing.is_empty() {
            return Err(SharingError::SharingIdTaken {
                sharing_id: sharing.sharing_id,
            });
        }
    }
    sharing.owner = true;
    sharing.doc_id.clear();
    sharing.created_at = Some(Utc::now());
    for recipient in &mut sharing.recipients {
        recipient.status = RecipientStatus::Pending;
        recipient.access_token = None;
    }

    let doc = store.create(sharing.to_document()?).await?;
    sharing.doc_id = doc.id;

    tracing::info!(
        sharing_id = %sharing.sharing_id,
        doc_id = %sharing.doc_id,
        recipients = sharing.recipients.len(),
        "sharing created"
    );
    Ok(sharing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Recipient, SharingType};
    use crate::registry::SharingRegistry;
    use crate::store::MemoryStore;

    fn valid() -> Sharing {
        let mut s = Sharing::new(SharingType::OneShot, "holiday photos");
        s.recipients.push(Recipient::new("bob@example.com"));
        s
    }

    #[test]
    fn test_check_bad_type() {
        let mut s = valid();
        s.sharing_type = "sometimes".to_string();
        assert!(matches!(
            check_sharing_creation(&s),
            Err(SharingError::BadSharingType(t)) if t == "sometimes"
        ));
    }

    #[test]
    fn test_check_recipients() {
        let mut s = valid();
        s.recipients.clear();
        assert!(matches!(
            check_sharing_creation(&s),
            Err(SharingError::RecipientDoesNotExist(_))
        ));

        let mut s = valid();
        s.recipients.push(Recipient::new("  "));
        let err = check_sharing_creation(&s).unwrap_err();
        assert!(err.to_string().contains("#1"));

        assert!(check_sharing_creation(&valid()).is_ok());
    }

    #[tokio::test]
    async fn test_create_assigns_ids() {
        let store = MemoryStore::new();
        let mut input = valid();
        input.recipients[0] = Recipient::new("bob@example.com").accepted("stale");

        let created = create_sharing(&store, input).await.unwrap();
        assert!(created.owner);
        assert!(!created.sharing_id.is_empty());
        assert!(!created.doc_id.is_empty());
        assert!(created.created_at.is_some());
        assert_eq!(created.recipients[0].status, RecipientStatus::Pending);
        assert!(created.recipients[0].access_token.is_none());

        let registry = SharingRegistry::new(&store);
        let found = registry.find_sharings_by_id(&created.sharing_id).await.unwrap();
        assert_eq!(found, vec![created]);
    }

    #[tokio::test]
    async fn test_create_keeps_given_sharing_id() {
        let store = MemoryStore::new();
        let mut input = valid();
        input.sharing_id = "mysharona".to_string();

        let created = create_sharing(&store, input).await.unwrap();
        assert_eq!(created.sharing_id, "mysharona");
    }

    #[tokio::test]
    async fn test_create_rejects_taken_sharing_id() {
        let store = MemoryStore::new();
        let mut input = valid();
        input.sharing_id = "dup".to_string();

        create_sharing(&store, input.clone()).await.unwrap();
        let err = create_sharing(&store, input).await.unwrap_err();
        assert!(matches!(
            &err,
            SharingError::SharingIdTaken { sharing_id } if sharing_id == "dup"
        ));
        assert!(!err.is_retryable());

        let registry = SharingRegistry::new(&store);
        assert_eq!(registry.find_sharings_by_id("dup").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_generated_ids_never_collide() {
        let store = MemoryStore::new();
        let a = create_sharing(&store, valid()).await.unwrap();
        let b = create_sharing(&store, valid()).await.unwrap();
        assert_ne!(a.sharing_id, b.sharing_id);
    }
}
