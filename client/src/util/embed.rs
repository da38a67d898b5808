//! Embedding snippets for a form's public submission endpoint.
//!
//! Pure string builders: the form detail page renders them in `<pre>`
//! blocks with a copy button. Values interpolated into HTML attributes are
//! escaped; the JS snippet embeds the endpoint as a JSON string literal.

#[cfg(test)]
#[path = "embed_test.rs"]
mod embed_test;

use session::types::Form;

/// Public endpoint third-party sites post to.
pub fn submission_endpoint(base_url: &str, form_id: &str) -> String {
    format!("{}/f/{}", base_url.trim_end_matches('/'), urlencoding::encode(form_id))
}

/// Escape text for an HTML attribute value or text node.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn honeypot_name(form: &Form) -> Option<&str> {
    form.settings
        .honeypot_field
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
}

/// Plain HTML `<form>` posting to the endpoint, with a hidden honeypot
/// input when the form has one configured.
pub fn html_snippet(base_url: &str, form: &Form) -> String {
    let action = escape_html(&submission_endpoint(base_url, &form.id));
    let mut lines = vec![
        format!(r#"<form action="{action}" method="POST">"#),
        r#"  <input type="email" name="email" placeholder="Your email" required>"#.to_owned(),
        r#"  <textarea name="message" placeholder="Your message"></textarea>"#.to_owned(),
    ];
    if let Some(name) = honeypot_name(form) {
        lines.push(format!(
            r#"  <input type="text" name="{}" style="display:none" tabindex="-1" autocomplete="off">"#,
            escape_html(name)
        ));
    }
    lines.push(r#"  <button type="submit">Send</button>"#.to_owned());
    lines.push("</form>".to_owned());
    lines.join("\n")
}

/// `fetch` call submitting JSON to the endpoint.
pub fn fetch_snippet(base_url: &str, form: &Form) -> String {
    let endpoint = submission_endpoint(base_url, &form.id);
    let literal = serde_json::Value::String(endpoint).to_string();
    format!(
        r#"fetch({literal}, {{
  method: "POST",
  headers: {{ "Content-Type": "application/json" }},
  body: JSON.stringify({{ email: "you@example.com", message: "Hello!" }}),
}})
  .then((res) => res.json())
  .then((data) => console.log(data));"#
    )
}
