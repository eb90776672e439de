//! Permission rules: the selection criteria of a sharing.

use serde::{Deserialize, Serialize};

/// Selector string that switches a rule to back-reference matching.
pub const SELECTOR_REFERENCED_BY: &str = "referenced_by";

/// Operation a rule permits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    #[serde(alias = "POST")]
    Create,
    #[serde(alias = "PUT", alias = "PATCH")]
    Update,
    Delete,
    All,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Create => "CREATE",
            Verb::Update => "UPDATE",
            Verb::Delete => "DELETE",
            Verb::All => "ALL",
        }
    }
}

/// How a document is tested for membership in a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Match through the document's back-reference list; values are
    /// composite `type/id` keys.
    ReferencedBy { values: Vec<String> },
    /// Match the document's own identifier against a list of ids. `field`
    /// keeps the selector name the rule was written with, if any.
    DirectMatch {
        field: Option<String>,
        values: Vec<String>,
    },
}

impl Selector {
    pub fn values(&self) -> &[String] {
        match self {
            Selector::ReferencedBy { values } | Selector::DirectMatch { values, .. } => values,
        }
    }

    /// Wire name of the selector, empty for a plain id list.
    pub fn name(&self) -> &str {
        match self {
            Selector::ReferencedBy { .. } => SELECTOR_REFERENCED_BY,
            Selector::DirectMatch { field, .. } => field.as_deref().unwrap_or(""),
        }
    }
}

/// One selection criterion inside a sharing's permission set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawRule", into = "RawRule")]
pub struct Rule {
    pub description: String,
    pub doc_type: String,
    pub selector: Selector,
    pub verbs: Vec<Verb>,
}

impl Rule {
    /// Creates a rule matching documents referenced by any of `values`.
    pub fn referenced_by(doc_type: impl Into<String>, values: Vec<String>, verbs: Vec<Verb>) -> Self {
        Self {
            description: String::new(),
            doc_type: doc_type.into(),
            selector: Selector::ReferencedBy { values },
            verbs,
        }
    }

    /// Creates a rule matching documents whose id is in `values`.
    pub fn ids(doc_type: impl Into<String>, values: Vec<String>, verbs: Vec<Verb>) -> Self {
        Self {
            description: String::new(),
            doc_type: doc_type.into(),
            selector: Selector::DirectMatch {
                field: None,
                values,
            },
            verbs,
        }
    }

    /// Returns true if the rule grants `verb`, directly or through `ALL`.
    pub fn permits(&self, verb: Verb) -> bool {
        self.verbs.iter().any(|v| *v == verb || *v == Verb::All)
    }

    /// Serializes the rule as an OAuth scope token:
    /// `doctype:VERB,VERB:value,value:selector`.
    pub fn scope_token(&self) -> String {
        let verbs = if self.verbs.is_empty() {
            Verb::All.as_str().to_string()
        } else {
            self.verbs
                .iter()
                .map(Verb::as_str)
                .collect::<Vec<_>>()
                .join(",")
        };
        let mut token = format!("{}:{}", self.doc_type, verbs);
        let values = self.selector.values();
        if !values.is_empty() {
            token.push(':');
            token.push_str(&values.join(","));
            let name = self.selector.name();
            if !name.is_empty() {
                token.push(':');
                token.push_str(name);
            }
        }
        token
    }
}

/// Flat wire representation of a rule.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawRule {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    description: String,
    #[serde(rename = "type", default)]
    doc_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    selector: String,
    #[serde(default)]
    values: Vec<String>,
    #[serde(default)]
    verbs: Vec<Verb>,
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        let selector = match raw.selector.as_str() {
            SELECTOR_REFERENCED_BY => Selector::ReferencedBy { values: raw.values },
            "" => Selector::DirectMatch {
                field: None,
                values: raw.values,
            },
            _ => Selector::DirectMatch {
                field: Some(raw.selector),
                values: raw.values,
            },
        };
        Rule {
            description: raw.description,
            doc_type: raw.doc_type,
            selector,
            verbs: raw.verbs,
        }
    }
}

impl From<Rule> for RawRule {
    fn from(rule: Rule) -> Self {
        let selector = rule.selector.name().to_string();
        let values = match rule.selector {
            Selector::ReferencedBy { values } | Selector::DirectMatch { values, .. } => values,
        };
        RawRule {
            description: rule.description,
            doc_type: rule.doc_type,
            selector,
            values,
            verbs: rule.verbs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_referenced_by_rule() {
        let rule: Rule = serde_json::from_value(json!({
            "type": "io.cozy.files",
            "selector": "referenced_by",
            "values": ["io.cozy.events/random"],
            "verbs": ["GET", "POST"]
        }))
        .unwrap();

        assert_eq!(
            rule.selector,
            Selector::ReferencedBy {
                values: vec!["io.cozy.events/random".to_string()]
            }
        );
        assert_eq!(rule.verbs, vec![Verb::Get, Verb::Create]);
    }

    #[test]
    fn test_unknown_selector_is_direct_match() {
        let rule: Rule = serde_json::from_value(json!({
            "type": "io.cozy.files",
            "selector": "dir_id",
            "values": ["123"]
        }))
        .unwrap();

        assert_eq!(rule.selector.name(), "dir_id");
        assert!(matches!(rule.selector, Selector::DirectMatch { .. }));

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["selector"], "dir_id");
        assert_eq!(back["values"], json!(["123"]));
    }

    #[test]
    fn test_http_verb_aliases() {
        let verbs: Vec<Verb> = serde_json::from_value(json!(["PUT", "PATCH", "DELETE"])).unwrap();
        assert_eq!(verbs, vec![Verb::Update, Verb::Update, Verb::Delete]);
    }

    #[test]
    fn test_permits() {
        let rule = Rule::ids("io.cozy.files", vec![], vec![Verb::Create]);
        assert!(rule.permits(Verb::Create));
        assert!(!rule.permits(Verb::Delete));

        let all = Rule::ids("io.cozy.files", vec![], vec![Verb::All]);
        assert!(all.permits(Verb::Delete));
    }

    #[test]
    fn test_scope_token() {
        let rule = Rule::referenced_by(
            "io.cozy.files",
            vec!["io.cozy.events/random".to_string()],
            vec![Verb::Get, Verb::Update],
        );
        assert_eq!(
            rule.scope_token(),
            "io.cozy.files:GET,UPDATE:io.cozy.events/random:referenced_by"
        );

        let bare = Rule::ids("io.cozy.contacts", vec![], vec![]);
        assert_eq!(bare.scope_token(), "io.cozy.contacts:ALL");
    }
}
