use super::*;
use crate::session::SessionStatus;
use crate::types::User;

fn snapshot(status: SessionStatus, signed_in: bool) -> SessionSnapshot {
    let user = signed_in.then(|| User {
        id: "u1".to_owned(),
        email: "a@b.com".to_owned(),
        display_name: None,
        profile: None,
    });
    SessionSnapshot { status, user, has_token: signed_in }
}

#[test]
fn pending_while_loading_regardless_of_outcome() {
    assert_eq!(evaluate(&snapshot(SessionStatus::Hydrating, false), "/forms"), GuardDecision::Pending);
    assert_eq!(evaluate(&snapshot(SessionStatus::Hydrating, true), "/forms"), GuardDecision::Pending);
}

#[test]
fn redirects_anonymous_with_return_path() {
    assert_eq!(
        evaluate(&snapshot(SessionStatus::Anonymous, false), "/forms/f1?tab=embed"),
        GuardDecision::Redirect { to: "/login?redirect=%2Fforms%2Ff1%3Ftab%3Dembed".to_owned() }
    );
}

#[test]
fn renders_when_authenticated() {
    assert_eq!(evaluate(&snapshot(SessionStatus::Authenticated, true), "/dashboard"), GuardDecision::Render);
}

#[test]
fn authenticated_status_without_user_redirects() {
    let snap = SessionSnapshot { status: SessionStatus::Authenticated, user: None, has_token: true };
    assert!(matches!(evaluate(&snap, "/dashboard"), GuardDecision::Redirect { .. }));
}

#[test]
fn login_redirect_drops_unsafe_targets() {
    assert_eq!(login_redirect("//evil.test/x"), "/login");
    assert_eq!(login_redirect("https://evil.test"), "/login");
    assert_eq!(login_redirect("/login"), "/login");
}

#[test]
fn return_path_round_trips_login_redirect() {
    let to = login_redirect("/forms/f1");
    let query = to.split_once('?').unwrap().1;
    assert_eq!(return_path(query), "/forms/f1");
}

#[test]
fn return_path_defaults_to_dashboard() {
    assert_eq!(return_path(""), "/dashboard");
    assert_eq!(return_path("?other=1"), "/dashboard");
    assert_eq!(return_path("?redirect=%2F%2Fevil.test"), "/dashboard");
}

#[test]
fn return_path_accepts_leading_question_mark() {
    assert_eq!(return_path("?foo=bar&redirect=%2Fprofile"), "/profile");
}
