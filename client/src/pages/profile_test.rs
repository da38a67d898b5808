use super::*;
use session::types::Profile;

fn user(profile: Option<Profile>, display_name: Option<&str>) -> User {
    User {
        id: "u1".to_owned(),
        email: "ada@example.com".to_owned(),
        display_name: display_name.map(str::to_owned),
        profile,
    }
}

#[test]
fn draft_prefers_profile_name() {
    let profile = Profile { name: Some("Ada L.".to_owned()), bio: Some("Maths".to_owned()), ..Profile::default() };
    let draft = ProfileDraft::from_user(&user(Some(profile), Some("ada")));
    assert_eq!(draft.name, "Ada L.");
    assert_eq!(draft.bio, "Maths");
}

#[test]
fn draft_falls_back_to_display_name() {
    let draft = ProfileDraft::from_user(&user(None, Some("ada")));
    assert_eq!(draft.name, "ada");
    assert_eq!(draft.website, "");
}

#[test]
fn blank_fields_are_omitted() {
    let draft = ProfileDraft { name: " Ada ".to_owned(), ..ProfileDraft::default() };
    assert_eq!(draft.to_update(), Ok(ProfileUpdate { name: Some("Ada".to_owned()), ..ProfileUpdate::default() }));
}

#[test]
fn urls_must_be_http() {
    let avatar = ProfileDraft { avatar_url: "ftp://x".to_owned(), ..ProfileDraft::default() };
    assert_eq!(avatar.to_update(), Err("Avatar URL must start with http:// or https://."));
    let website = ProfileDraft { website: "example.com".to_owned(), ..ProfileDraft::default() };
    assert_eq!(website.to_update(), Err("Website must start with http:// or https://."));
}
