//! OAuth authorization request URL for a sharing recipient.

use crate::error::{SharingError, SharingResult};
use crate::models::{Recipient, Sharing};

/// Marshals the sharing's permission set as a space-separated scope.
pub fn scope_string(sharing: &Sharing) -> String {
    sharing
        .permissions
        .iter()
        .map(|r| r.scope_token())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Builds `<recipient-url>/sharings/request?...` for the recipient to accept
/// the sharing. Parameters are sorted by key and form-encoded.
pub fn generate_oauth_query_string(recipient: &Recipient, sharing: &Sharing) -> SharingResult<String> {
    let url = recipient.url.as_deref().ok_or_else(|| {
        SharingError::RecipientDoesNotExist(format!("{} has no instance URL", recipient.label()))
    })?;
    let client = recipient.client.as_ref().ok_or_else(|| {
        SharingError::RecipientDoesNotExist(format!("{} has no OAuth client", recipient.label()))
    })?;
    let redirect_uri = client.redirect_uris.first().ok_or_else(|| {
        SharingError::RecipientDoesNotExist(format!("{} has no redirect URI", recipient.label()))
    })?;

    let scope = scope_string(sharing);
    let params = [
        ("client_id", client.client_id.as_str()),
        ("redirect_uri", redirect_uri.as_str()),
        ("response_type", "code"),
        ("scope", scope.as_str()),
        ("sharing_type", sharing.sharing_type.as_str()),
        ("state", sharing.sharing_id.as_str()),
    ];
    let query = params
        .iter()
        .map(|(k, v)| format!("{}={}", k, form_encode(v)))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!("{}/sharings/request?{}", url.trim_end_matches('/'), query))
}

fn form_encode(value: &str) -> String {
    urlencoding::encode(value).replace("%20", "+")
}
