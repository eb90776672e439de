//! Selector matching: does a document still belong to a rule?
//!
//! Membership is re-evaluated against the document's current state on every
//! event. Back-references may have changed since the rule was written, so
//! membership recorded at that time is never trusted.

use std::collections::HashSet;

use crate::models::{DocReference, Rule, Selector};

/// Returns true if a document with id `doc_id` and back-references
/// `references` falls within `rule`.
///
/// A rule with no values never matches.
pub fn is_document_still_shared(rule: &Rule, doc_id: &str, references: &[DocReference]) -> bool {
    match &rule.selector {
        Selector::ReferencedBy { values } => {
            if values.is_empty() {
                return false;
            }
            let keys: HashSet<String> = references.iter().map(DocReference::key).collect();
            values.iter().any(|v| keys.contains(v))
        }
        Selector::DirectMatch { values, .. } => {
            !doc_id.is_empty() && values.iter().any(|v| v == doc_id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Verb;

    fn events(id: &str) -> Vec<DocReference> {
        vec![DocReference::new("io.cozy.events", id)]
    }

    fn referenced_by(values: &[&str]) -> Rule {
        Rule::referenced_by(
            "io.cozy.files",
            values.iter().map(|v| v.to_string()).collect(),
            vec![Verb::All],
        )
    }

    #[test]
    fn test_referenced_by_match() {
        let rule = referenced_by(&["io.cozy.events/random"]);
        assert!(is_document_still_shared(&rule, "d", &events("random")));
        assert!(!is_document_still_shared(&rule, "d", &events("static")));
    }

    #[test]
    fn test_referenced_by_any_of_many() {
        let rule = referenced_by(&["io.cozy.albums/a", "io.cozy.events/random"]);
        let refs = vec![
            DocReference::new("io.cozy.albums", "b"),
            DocReference::new("io.cozy.events", "random"),
        ];
        assert!(is_document_still_shared(&rule, "d", &refs));
    }

    #[test]
    fn test_referenced_by_requires_type_and_id() {
        let rule = referenced_by(&["io.cozy.events/random"]);
        let wrong_type = vec![DocReference::new("io.cozy.albums", "random")];
        assert!(!is_document_still_shared(&rule, "d", &wrong_type));
        assert!(!is_document_still_shared(&rule, "d", &[]));
    }

    #[test]
    fn test_direct_match() {
        let rule = Rule::ids("io.cozy.files", vec!["123".to_string()], vec![]);
        assert!(!is_document_still_shared(&rule, "456", &events("random")));
        assert!(is_document_still_shared(&rule, "123", &[]));
        assert!(!is_document_still_shared(&rule, "", &[]));
    }

    #[test]
    fn test_empty_values_never_match() {
        let rule = referenced_by(&[]);
        assert!(!is_document_still_shared(&rule, "d", &events("random")));

        let rule = Rule::ids("io.cozy.files", vec![], vec![]);
        assert!(!is_document_still_shared(&rule, "d", &[]));
    }

    #[test]
    fn test_is_pure() {
        let rule = referenced_by(&["io.cozy.events/random"]);
        let refs = events("random");
        let first = is_document_still_shared(&rule, "d", &refs);
        for _ in 0..10 {
            assert_eq!(is_document_still_shared(&rule, "d", &refs), first);
        }
    }
}
