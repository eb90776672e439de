//! Remote parties of a sharing.

use serde::{Deserialize, Serialize};

/// OAuth client registered on the recipient's side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// Where a recipient stands in the sharing handshake.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipientStatus {
    #[default]
    Pending,
    Mailed,
    Accepted,
    Refused,
    Revoked,
}

/// A remote party entitled to receive propagated changes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    #[serde(default)]
    pub status: RecipientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
}

impl Recipient {
    /// Creates a pending recipient known only by email.
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Default::default()
        }
    }

    /// Builder-style helper to set the instance URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Builder-style helper to set the OAuth client.
    pub fn with_client(mut self, client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        self.client = Some(Client {
            client_id: client_id.into(),
            redirect_uris: vec![redirect_uri.into()],
        });
        self
    }

    /// Marks the recipient as accepted with the given access token.
    pub fn accepted(mut self, access_token: impl Into<String>) -> Self {
        self.status = RecipientStatus::Accepted;
        self.access_token = Some(access_token.into());
        self
    }

    /// Label used in logs and aggregate errors.
    pub fn label(&self) -> &str {
        if !self.email.is_empty() {
            &self.email
        } else {
            self.url.as_deref().unwrap_or("<unknown>")
        }
    }
}
