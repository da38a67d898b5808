use super::*;
use session::types::FormSettings;

fn form(id: &str, honeypot: Option<&str>) -> Form {
    Form {
        id: id.to_owned(),
        name: "Contact".to_owned(),
        description: None,
        settings: FormSettings { honeypot_field: honeypot.map(str::to_owned), ..FormSettings::default() },
        submission_count: None,
        created_at: None,
        updated_at: None,
    }
}

#[test]
fn endpoint_joins_base_and_id() {
    assert_eq!(submission_endpoint("https://api.example.com", "f1"), "https://api.example.com/f/f1");
}

#[test]
fn endpoint_trims_trailing_slash_and_encodes_id() {
    assert_eq!(submission_endpoint("https://api.example.com/", "a b/c"), "https://api.example.com/f/a%20b%2Fc");
}

#[test]
fn escape_html_covers_attribute_breakers() {
    assert_eq!(escape_html(r#"<a href="x">'&'</a>"#), "&lt;a href=&quot;x&quot;&gt;&#39;&amp;&#39;&lt;/a&gt;");
    assert_eq!(escape_html("plain"), "plain");
}

#[test]
fn html_snippet_posts_to_endpoint() {
    let snippet = html_snippet("https://api.example.com", &form("f1", None));
    assert!(snippet.starts_with(r#"<form action="https://api.example.com/f/f1" method="POST">"#));
    assert!(snippet.ends_with("</form>"));
    assert!(!snippet.contains("display:none"));
}

#[test]
fn html_snippet_includes_escaped_honeypot() {
    let snippet = html_snippet("https://api.example.com", &form("f1", Some(r#"_gotcha"x"#)));
    assert!(snippet.contains(r#"name="_gotcha&quot;x" style="display:none""#));
}

#[test]
fn html_snippet_ignores_blank_honeypot() {
    let snippet = html_snippet("https://api.example.com", &form("f1", Some("   ")));
    assert!(!snippet.contains("display:none"));
}

#[test]
fn fetch_snippet_quotes_endpoint_as_json_string() {
    let snippet = fetch_snippet("https://api.example.com", &form("f1", None));
    assert!(snippet.starts_with(r#"fetch("https://api.example.com/f/f1", {"#));
    assert!(snippet.contains(r#""Content-Type": "application/json""#));
}
