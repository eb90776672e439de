//! HTTP propagation to a recipient's instance.

use std::time::Duration;

use reqwest::{Method, StatusCode};

use super::{Propagator, SharingUpdate};
use crate::error::PropagationError;
use crate::models::{EventType, Recipient};

/// Sends updates to `<recipient-url>/sharings/doc/<doctype>/<id>`.
///
/// `CREATED` is a POST, `UPDATED` a PUT and `DELETED` a DELETE, each
/// authenticated with the recipient's access token.
#[derive(Debug, Clone)]
pub struct HttpPropagator {
    client: reqwest::Client,
}

impl HttpPropagator {
    pub fn new(timeout: Duration) -> Result<Self, PropagationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PropagationError::permanent(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Builds the target URL for an update.
    pub fn endpoint(base_url: &str, update: &SharingUpdate) -> String {
        format!(
            "{}/sharings/doc/{}/{}?sharing_id={}",
            base_url.trim_end_matches('/'),
            urlencoding::encode(&update.doc.doc_type),
            urlencoding::encode(&update.doc.id),
            urlencoding::encode(&update.sharing_id)
        )
    }

    fn method(event_type: EventType) -> Method {
        match event_type {
            EventType::Created => Method::POST,
            EventType::Updated => Method::PUT,
            EventType::Deleted => Method::DELETE,
        }
    }

    /// Server errors and throttling may clear up; other statuses will not.
    fn classify(status: StatusCode) -> PropagationError {
        let message = format!("recipient returned status {}", status);
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            PropagationError::transient(message)
        } else {
            PropagationError::permanent(message)
        }
    }
}

impl Propagator for HttpPropagator {
    async fn propagate(
        &self,
        recipient: &Recipient,
        update: &SharingUpdate,
    ) -> Result<(), PropagationError> {
        let base_url = recipient
            .url
            .as_deref()
            .ok_or_else(|| PropagationError::permanent("recipient has no URL"))?;
        let token = recipient
            .access_token
            .as_deref()
            .ok_or_else(|| PropagationError::permanent("recipient has no access token"))?;

        let url = Self::endpoint(base_url, update);
        let mut request = self
            .client
            .request(Self::method(update.event_type), &url)
            .header("Authorization", format!("Bearer {}", token));
        if update.event_type != EventType::Deleted {
            request = request.json(&update.doc);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_builder() {
                PropagationError::permanent(e.to_string())
            } else {
                PropagationError::transient(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(Self::classify(response.status()));
        }

        tracing::debug!(recipient = recipient.label(), %url, "update propagated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Document;

    fn update() -> SharingUpdate {
        SharingUpdate {
            sharing_id: "s 1".to_string(),
            event_type: EventType::Updated,
            doc: Document::new("io.cozy.files").with_id("f1"),
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            HttpPropagator::endpoint("https://bob.example.net/", &update()),
            "https://bob.example.net/sharings/doc/io.cozy.files/f1?sharing_id=s%201"
        );
    }

    #[test]
    fn test_methods() {
        assert_eq!(HttpPropagator::method(EventType::Created), Method::POST);
        assert_eq!(HttpPropagator::method(EventType::Updated), Method::PUT);
        assert_eq!(HttpPropagator::method(EventType::Deleted), Method::DELETE);
    }

    #[test]
    fn test_classify() {
        assert!(HttpPropagator::classify(StatusCode::BAD_GATEWAY).transient);
        assert!(HttpPropagator::classify(StatusCode::TOO_MANY_REQUESTS).transient);
        assert!(!HttpPropagator::classify(StatusCode::FORBIDDEN).transient);
        assert!(!HttpPropagator::classify(StatusCode::NOT_FOUND).transient);
    }

    #[tokio::test]
    async fn test_missing_url_or_token_is_permanent() {
        let propagator = HttpPropagator::new(Duration::from_secs(1)).unwrap();

        let err = propagator
            .propagate(&Recipient::new("a@example.com"), &update())
            .await
            .unwrap_err();
        assert!(!err.transient);

        let no_token = Recipient::new("a@example.com").with_url("https://a.example.net");
        let err = propagator.propagate(&no_token, &update()).await.unwrap_err();
        assert_eq!(err.message, "recipient has no access token");
    }
}
