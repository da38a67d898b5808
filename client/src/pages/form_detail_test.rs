use super::*;

fn form() -> Form {
    serde_json::from_value(serde_json::json!({
        "id": "f1",
        "name": "Contact",
        "description": "Main site",
        "settings": {
            "redirectUrl": "https://example.com/thanks",
            "honeypotField": "_gotcha",
            "allowedOrigins": ["https://example.com", "https://www.example.com"]
        }
    }))
    .unwrap()
}

// =============================================================================
// SettingsDraft
// =============================================================================

#[test]
fn draft_round_trips_a_loaded_form() {
    let form = form();
    let draft = SettingsDraft::from_form(&form);
    assert_eq!(draft.allowed_origins, "https://example.com\nhttps://www.example.com");
    assert_eq!(draft.to_input(), Ok(FormInput::from(&form)));
}

#[test]
fn blank_fields_become_none() {
    let draft = SettingsDraft { name: "Contact".to_owned(), description: "  ".to_owned(), ..SettingsDraft::default() };
    let input = draft.to_input().unwrap();
    assert_eq!(input.description, None);
    assert_eq!(input.settings, FormSettings::default());
}

#[test]
fn name_is_required() {
    let draft = SettingsDraft { name: " ".to_owned(), ..SettingsDraft::default() };
    assert_eq!(draft.to_input(), Err("Give the form a name.".to_owned()));
}

#[test]
fn redirect_must_be_http() {
    let draft = SettingsDraft {
        name: "Contact".to_owned(),
        redirect_url: "javascript:alert(1)".to_owned(),
        ..SettingsDraft::default()
    };
    assert_eq!(draft.to_input(), Err("Redirect URL must start with http:// or https://.".to_owned()));
}

#[test]
fn notify_email_is_checked() {
    let draft = SettingsDraft {
        name: "Contact".to_owned(),
        notify_email: "not-an-email".to_owned(),
        ..SettingsDraft::default()
    };
    assert_eq!(draft.to_input(), Err("Notification email is not a valid address.".to_owned()));
}

#[test]
fn bad_origin_is_named() {
    let draft = SettingsDraft {
        name: "Contact".to_owned(),
        allowed_origins: "https://ok.example\nexample.com".to_owned(),
        ..SettingsDraft::default()
    };
    assert_eq!(
        draft.to_input(),
        Err("Allowed origin example.com must start with http:// or https://.".to_owned())
    );
}

// =============================================================================
// Helpers
// =============================================================================

#[test]
fn parse_origins_splits_trims_and_dedupes() {
    assert_eq!(
        parse_origins(" https://a.example/ ,https://b.example\n\nhttps://a.example"),
        vec!["https://a.example".to_owned(), "https://b.example".to_owned()]
    );
    assert!(parse_origins("  \n , ").is_empty());
}

#[test]
fn submission_fields_render_values() {
    let submission: Submission = serde_json::from_value(serde_json::json!({
        "id": "s1",
        "formId": "f1",
        "data": { "email": "a@b.com", "age": 42, "extra": null }
    }))
    .unwrap();
    let fields = submission_fields(&submission);
    assert!(fields.contains(&("email".to_owned(), "a@b.com".to_owned())));
    assert!(fields.contains(&("age".to_owned(), "42".to_owned())));
    assert!(fields.contains(&("extra".to_owned(), String::new())));
}

#[test]
fn page_label_never_shows_zero_pages() {
    let empty = Pagination { page: 1, limit: 20, total: 0, total_pages: 0 };
    assert_eq!(page_label(&empty), "Page 1 of 1 (0 total)");
    let full = Pagination { page: 2, limit: 20, total: 45, total_pages: 3 };
    assert_eq!(page_label(&full), "Page 2 of 3 (45 total)");
}
