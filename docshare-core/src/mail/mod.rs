//! Sharing request mails.
//!
//! Renders one message per recipient and hands it to a [`Mailer`]. SMTP
//! details live in the application.

mod oauth;
mod templates;

pub use oauth::{generate_oauth_query_string, scope_string};
pub use templates::{render_template, MailTemplateValues, MAIL_TEMPLATE_EN, MAIL_TEMPLATE_FR};

use std::future::Future;

use serde::Serialize;

use crate::error::{PropagationError, PropagationFailures, SharingResult};
use crate::models::{Recipient, RecipientStatus, Sharing};
use crate::store::DocumentStore;

/// Document type of the instance settings.
pub const SETTINGS_DOCTYPE: &str = "io.cozy.settings";
/// Id of the settings document holding the public name.
pub const INSTANCE_SETTINGS_ID: &str = "io.cozy.settings.instance";

pub const SHARING_MAIL_SUBJECT: &str = "New sharing request / Nouvelle demande de partage";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailAddress {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailPart {
    pub content_type: String,
    pub body: String,
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailMessage {
    pub to: Vec<MailAddress>,
    pub subject: String,
    pub parts: Vec<MailPart>,
}

/// Delivers rendered mails.
pub trait Mailer: Send + Sync {
    fn send(&self, message: &MailMessage) -> impl Future<Output = Result<(), PropagationError>> + Send;
}

/// Renders the sharing request for `recipient`, one HTML part per language.
pub fn generate_mail_message(recipient: &Recipient, values: &MailTemplateValues) -> MailMessage {
    let parts = [MAIL_TEMPLATE_EN, MAIL_TEMPLATE_FR]
        .iter()
        .map(|t| MailPart {
            content_type: "text/html".to_string(),
            body: render_template(t, values),
        })
        .collect();

    MailMessage {
        to: vec![MailAddress {
            name: recipient.email.clone(),
            email: recipient.email.clone(),
        }],
        subject: SHARING_MAIL_SUBJECT.to_string(),
        parts,
    }
}

/// Reads the sharer's public name from the instance settings.
async fn sharer_public_name<S: DocumentStore>(store: &S) -> SharingResult<String> {
    let settings = store.get(SETTINGS_DOCTYPE, INSTANCE_SETTINGS_ID).await?;
    match settings {
        Some(doc) => Ok(doc.str_attr("public_name").unwrap_or_default().to_string()),
        None => {
            tracing::warn!("instance settings missing, sending mails without a public name");
            Ok(String::new())
        }
    }
}

/// Sends the sharing request mail to every recipient of `sharing`.
///
/// Every recipient is attempted even if some fail; delivered ones are marked
/// `Mailed` and the sharing is saved before the aggregate failure, if any,
/// is returned.
pub async fn send_sharing_mails<S: DocumentStore, M: Mailer>(
    store: &S,
    mailer: &M,
    sharing: &mut Sharing,
) -> SharingResult<()> {
    let base = MailTemplateValues {
        description: sharing.desc.clone(),
        sharer_public_name: sharer_public_name(store).await?,
        ..Default::default()
    };

    let mut failures = PropagationFailures {
        attempted: sharing.recipients.len(),
        ..Default::default()
    };
    let mut mailed = Vec::new();

    for (i, recipient) in sharing.recipients.iter().enumerate() {
        let oauth_query_string = match generate_oauth_query_string(recipient, sharing) {
            Ok(q) => q,
            Err(e) => {
                failures.push(recipient.label(), PropagationError::permanent(e.to_string()));
                continue;
            }
        };
        let values = MailTemplateValues {
            recipient_name: recipient.email.clone(),
            oauth_query_string,
            ..base.clone()
        };
        let message = generate_mail_message(recipient, &values);

        match mailer.send(&message).await {
            Ok(()) => mailed.push(i),
            Err(e) => {
                tracing::warn!(recipient = recipient.label(), error = %e, "sharing mail not sent");
                failures.push(recipient.label(), e);
            }
        }
    }

    if !mailed.is_empty() {
        for i in &mailed {
            if sharing.recipients[*i].status == RecipientStatus::Pending {
                sharing.recipients[*i].status = RecipientStatus::Mailed;
            }
        }
        let doc = store.put(sharing.to_document()?).await?;
        sharing.doc_id = doc.id;
    }

    tracing::info!(
        sharing_id = %sharing.sharing_id,
        mailed = mailed.len(),
        failed = failures.len(),
        "sharing mails sent"
    );
    failures.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SharingError;
    use crate::models::{Document, SharingType};
    use crate::registry::SharingRegistry;
    use crate::store::MemoryStore;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
        reject: Option<String>,
    }

    impl Mailer for RecordingMailer {
        async fn send(&self, message: &MailMessage) -> Result<(), PropagationError> {
            if self.reject.as_deref() == Some(message.to[0].email.as_str()) {
                return Err(PropagationError::transient("mailbox unavailable"));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    fn recipient(email: &str) -> Recipient {
        Recipient::new(email)
            .with_url(format!("https://{}.example.net", email.split('@').next().unwrap_or("x")))
            .with_client("client", "https://alice.example.net/sharings/answer")
    }

    async fn setup(recipients: Vec<Recipient>) -> (MemoryStore, Sharing) {
        let store = MemoryStore::new();
        store
            .create(
                Document::new(SETTINGS_DOCTYPE)
                    .with_id(INSTANCE_SETTINGS_ID)
                    .with_attr("public_name", "Alice"),
            )
            .await
            .unwrap();
        let mut sharing = Sharing::new(SharingType::OneShot, "holiday photos");
        sharing.sharing_id = "sh-1".to_string();
        sharing.recipients = recipients;
        let doc = store.create(sharing.to_document().unwrap()).await.unwrap();
        sharing.doc_id = doc.id;
        (store, sharing)
    }

    #[test]
    fn test_generate_mail_message() {
        let values = MailTemplateValues {
            recipient_name: "bob@example.com".to_string(),
            sharer_public_name: "Alice".to_string(),
            description: "photos".to_string(),
            oauth_query_string: "https://x".to_string(),
        };
        let msg = generate_mail_message(&Recipient::new("bob@example.com"), &values);

        assert_eq!(msg.subject, SHARING_MAIL_SUBJECT);
        assert_eq!(msg.to[0].email, "bob@example.com");
        assert_eq!(msg.parts.len(), 2);
        assert!(msg.parts.iter().all(|p| p.content_type == "text/html"));
        assert!(msg.parts[1].body.contains("Bonjour"));
    }

    #[tokio::test]
    async fn test_send_to_all_recipients() {
        let (store, mut sharing) = setup(vec![recipient("bob@example.com"), recipient("carol@example.com")]).await;
        let mailer = RecordingMailer::default();

        send_sharing_mails(&store, &mailer, &mut sharing).await.unwrap();

        let sent = mailer.sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].parts[0].body.contains("Alice wants to share holiday photos"));
        assert!(sent[1].parts[0].body.contains("https://carol.example.net/sharings/request?"));

        let stored = SharingRegistry::new(&store)
            .get_by_doc_id(&sharing.doc_id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored
            .recipients
            .iter()
            .all(|r| r.status == RecipientStatus::Mailed));
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let (store, mut sharing) = setup(vec![
            Recipient::new("noclient@example.com"),
            recipient("bob@example.com"),
            recipient("carol@example.com"),
        ])
        .await;
        let mailer = RecordingMailer {
            reject: Some("bob@example.com".to_string()),
            ..Default::default()
        };

        let err = send_sharing_mails(&store, &mailer, &mut sharing).await.unwrap_err();
        match &err {
            SharingError::Propagation(failures) => {
                assert_eq!(failures.attempted, 3);
                let who: Vec<&str> = failures.failures.iter().map(|(r, _)| r.as_str()).collect();
                assert_eq!(who, vec!["noclient@example.com", "bob@example.com"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(err.is_retryable());

        assert_eq!(mailer.sent.lock().unwrap().len(), 1);
        assert_eq!(sharing.recipients[0].status, RecipientStatus::Pending);
        assert_eq!(sharing.recipients[1].status, RecipientStatus::Pending);
        assert_eq!(sharing.recipients[2].status, RecipientStatus::Mailed);
    }

    #[tokio::test]
    async fn test_missing_settings_uses_empty_name() {
        let store = MemoryStore::new();
        assert_eq!(sharer_public_name(&store).await.unwrap(), "");
    }
}
