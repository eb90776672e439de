//! Recipient resolution for a validated sharing.

use crate::models::{EventType, Recipient, RecipientStatus, Rule, Sharing};

/// Returns the recipients entitled to receive an `event_type` change under
/// `rule`.
///
/// If the rule does not grant the event's verb nobody is eligible. Among the
/// rest, only recipients that accepted the sharing and have an instance URL
/// qualify. An empty result is a normal outcome.
pub fn resolve_recipients<'a>(sharing: &'a Sharing, rule: &Rule, event_type: EventType) -> Vec<&'a Recipient> {
    let verb = event_type.verb();
    if !rule.permits(verb) {
        tracing::debug!(
            sharing_id = %sharing.sharing_id,
            verb = verb.as_str(),
            "rule does not permit verb, no recipient eligible"
        );
        return Vec::new();
    }

    sharing
        .recipients
        .iter()
        .filter(|r| {
            let eligible = r.status == RecipientStatus::Accepted && r.url.is_some();
            if !eligible {
                tracing::debug!(
                    sharing_id = %sharing.sharing_id,
                    recipient = r.label(),
                    status = ?r.status,
                    "skipping recipient"
                );
            }
            eligible
        })
        .collect()
}
