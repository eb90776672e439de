//! Sharing request mail templates.
//!
//! Placeholders use the `{{.Field}}` form and are filled from
//! [`MailTemplateValues`]. Values are HTML-escaped.

use serde::Serialize;

/// English body of a sharing request.
pub const MAIL_TEMPLATE_EN: &str = r#"
        <hr />
        <h3>Hey {{.RecipientName}}!</h3>
        <p>{{.SharerPublicName}} wants to share {{.Description}} with you! To accept the request copy-paste the following link in the sharing management page of your Cozy. :-)

        <br />

        <a href="{{.OAuthQueryString}}">{{.Description}}</a>
        </p>
    "#;

/// French body of a sharing request.
pub const MAIL_TEMPLATE_FR: &str = r#"
        <hr />
        <h3>Bonjour {{.RecipientName}} !</h3>
        <p>{{.SharerPublicName}} veut partager {{.Description}} avec vous ! Pour accepter sa demande, copiez-collez le lien ci-dessous dans la page de gestion des partages de votre Cozy. :-)

        <br />

        <a href="{{.OAuthQueryString}}">{{.Description}}</a>
        </p>
    "#;

/// Sharing-dependent values substituted into the templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MailTemplateValues {
    pub recipient_name: String,
    pub sharer_public_name: String,
    pub description: String,
    pub oauth_query_string: String,
}

impl MailTemplateValues {
    fn field(&self, name: &str) -> Option<&str> {
        match name {
            "RecipientName" => Some(self.recipient_name.as_str()),
            "SharerPublicName" => Some(self.sharer_public_name.as_str()),
            "Description" => Some(self.description.as_str()),
            "OAuthQueryString" => Some(self.oauth_query_string.as_str()),
            _ => None,
        }
    }
}

/// Fills every known placeholder of `template` in one pass over it.
///
/// Substituted values are never scanned again, so a value that itself looks
/// like a placeholder is written out as text. Unknown placeholders are kept.
pub fn render_template(template: &str, values: &MailTemplateValues) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{.") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 3..];
        let value = after
            .find("}}")
            .and_then(|end| values.field(&after[..end]).map(|v| (end, v)));
        match value {
            Some((end, v)) => {
                out.push_str(&escape_html(v));
                rest = &after[end + 2..];
            }
            None => {
                out.push_str("{{.");
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> MailTemplateValues {
        MailTemplateValues {
            recipient_name: "bob@example.com".to_string(),
            sharer_public_name: "Alice".to_string(),
            description: "holiday photos".to_string(),
            oauth_query_string: "https://bob.example.net/sharings/request?a=1&b=2".to_string(),
        }
    }

    #[test]
    fn test_render_en() {
        let body = render_template(MAIL_TEMPLATE_EN, &values());
        assert!(body.contains("<h3>Hey bob@example.com!</h3>"));
        assert!(body.contains("Alice wants to share holiday photos with you!"));
        assert!(body.contains(r#"href="https://bob.example.net/sharings/request?a=1&amp;b=2""#));
        assert!(!body.contains("{{."));
    }

    #[test]
    fn test_render_fr() {
        let body = render_template(MAIL_TEMPLATE_FR, &values());
        assert!(body.contains("Bonjour bob@example.com !"));
        assert!(body.contains("Alice veut partager holiday photos avec vous"));
    }

    #[test]
    fn test_values_are_escaped() {
        let mut v = values();
        v.description = "<script>alert('x')</script>".to_string();
        let body = render_template(MAIL_TEMPLATE_EN, &v);
        assert!(!body.contains("<script>"));
        assert!(body.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt;"));
    }

    #[test]
    fn test_placeholders_inside_values_stay_literal() {
        let mut v = values();
        v.description = "see {{.OAuthQueryString}}".to_string();
        v.recipient_name = "{{.Description}}".to_string();
        let body = render_template(MAIL_TEMPLATE_EN, &v);
        assert!(body.contains("<h3>Hey {{.Description}}!</h3>"));
        assert!(body.contains("wants to share see {{.OAuthQueryString}} with you!"));
        assert_eq!(body.matches("request?a=1&amp;b=2").count(), 1);
    }

    #[test]
    fn test_unknown_placeholder_is_kept() {
        let body = render_template("{{.Nope}} and {{.Description}} and {{.", &values());
        assert_eq!(body, "{{.Nope}} and holiday photos and {{.");
    }
}
