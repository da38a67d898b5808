use std::sync::Arc;

use super::*;
use crate::test_helpers::{self, MockTransport, user_json};
use crate::token::{MemoryTokenStore, TokenStore};
use crate::transport::Method;

fn controller_with(token: Option<&str>, merge: bool) -> (SessionController, Arc<MockTransport>, Arc<MemoryTokenStore>) {
    let (http, transport, tokens) = test_helpers::client_with(&test_helpers::config());
    tokens.set_token(token);
    (SessionController::new(http, merge), transport, tokens)
}

fn controller() -> (SessionController, Arc<MockTransport>, Arc<MemoryTokenStore>) {
    controller_with(None, false)
}

fn login_json(token: &str) -> serde_json::Value {
    serde_json::json!({ "token": token, "user": user_json("u1", "a@b.com") })
}

// =============================================================================
// hydrate
// =============================================================================

#[tokio::test]
async fn starts_loading() {
    let (session, _transport, _tokens) = controller();
    assert!(session.is_loading());
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn hydrate_without_token_is_anonymous_without_network() {
    let (session, transport, _tokens) = controller();

    let status = session.hydrate().await.unwrap();

    assert_eq!(status, SessionStatus::Anonymous);
    assert!(!session.is_loading());
    assert_eq!(transport.request_count(), 0);
}

#[tokio::test]
async fn hydrate_with_valid_token_authenticates() {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    transport.push_json(200, user_json("u1", "a@b.com"));

    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Authenticated);
    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().email, "a@b.com");
    assert_eq!(tokens.get_token().as_deref(), Some("t1"));

    let request = transport.last_request();
    assert_eq!(request.url, "http://api.test/api/auth/me");
    assert_eq!(request.header("Authorization"), Some("Bearer t1"));
}

#[tokio::test]
async fn hydrate_accepts_wrapped_me_response() {
    let (session, transport, _tokens) = controller_with(Some("t1"), false);
    transport.push_json(200, serde_json::json!({ "user": user_json("u7", "w@b.com") }));

    session.hydrate().await.unwrap();
    assert_eq!(session.user().unwrap().id, "u7");
}

#[tokio::test]
async fn hydrate_with_expired_token_clears_it() {
    let (session, transport, tokens) = controller_with(Some("expired"), false);
    transport.push_json(401, serde_json::json!({ "message": "Token expired" }));

    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Anonymous);
    assert_eq!(tokens.get_token(), None);
    assert!(!session.is_authenticated());
    assert!(!session.is_loading());

    // Idempotent: nothing left to validate, so no second call.
    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Anonymous);
    assert_eq!(transport.request_count(), 1);
}

#[tokio::test]
async fn hydrate_network_failure_is_anonymous() {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    transport.push_error(ApiError::Transport("offline".to_owned()));

    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Anonymous);
    assert_eq!(tokens.get_token(), None);
}

#[tokio::test]
async fn stale_hydration_after_logout_is_discarded() {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    let gate = transport.push_gated_json(200, user_json("u1", "a@b.com"));

    let (status, ()) = tokio::join!(session.hydrate(), async {
        tokio::task::yield_now().await;
        session.logout();
        gate.notify_one();
    });

    assert_eq!(status.unwrap(), SessionStatus::Anonymous);
    assert!(!session.is_authenticated());
    assert_eq!(session.user(), None);
    assert_eq!(tokens.get_token(), None);
}

#[tokio::test]
async fn overlapping_hydrate_is_rejected() {
    let (session, transport, _tokens) = controller_with(Some("t1"), false);
    let gate = transport.push_gated_json(200, user_json("u1", "a@b.com"));

    let (first, second, ()) = tokio::join!(session.hydrate(), session.hydrate(), async {
        tokio::task::yield_now().await;
        gate.notify_one();
    });

    assert_eq!(first.unwrap(), SessionStatus::Authenticated);
    assert!(matches!(second, Err(SessionError::InFlight(Operation::Hydrate))));
    assert_eq!(transport.request_count(), 1);
}

// =============================================================================
// profile merge
// =============================================================================

#[tokio::test]
async fn merge_profile_combines_both_endpoints() {
    let (session, transport, _tokens) = controller_with(Some("t1"), true);
    transport.push_json(200, user_json("u1", "a@b.com"));
    transport.push_json(200, serde_json::json!({ "name": "Ada", "website": "https://ada.test" }));

    session.hydrate().await.unwrap();

    let user = session.user().unwrap();
    let profile = user.profile.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Ada"));
    assert_eq!(profile.website.as_deref(), Some("https://ada.test"));
    assert_eq!(transport.requests()[1].url, "http://api.test/api/user/me");
}

#[tokio::test]
async fn merge_profile_keeps_base_user_when_extension_fails() {
    let (session, transport, _tokens) = controller_with(Some("t1"), true);
    transport.push_json(200, user_json("u1", "a@b.com"));
    transport.push_json(500, serde_json::json!({ "error": "boom" }));

    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Authenticated);
    assert_eq!(session.user().unwrap().profile, None);
}

#[tokio::test]
async fn merge_profile_unauthorized_extension_fails_hydration() {
    let (session, transport, tokens) = controller_with(Some("t1"), true);
    transport.push_json(200, user_json("u1", "a@b.com"));
    transport.push_json(401, serde_json::json!({}));

    assert_eq!(session.hydrate().await.unwrap(), SessionStatus::Anonymous);
    assert_eq!(tokens.get_token(), None);
}

// =============================================================================
// login / logout
// =============================================================================

#[tokio::test]
async fn login_persists_token_and_user() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(200, login_json("t1"));

    let route = session.login("a@b.com", "secret1").await.unwrap();

    assert_eq!(route, Route::Dashboard);
    assert_eq!(tokens.get_token().as_deref(), Some("t1"));
    assert!(session.is_authenticated());
    assert_eq!(session.user().unwrap().email, "a@b.com");

    let request = transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "http://api.test/api/auth/login");
    assert_eq!(request.body, Some(serde_json::json!({ "email": "a@b.com", "password": "secret1" })));
}

#[tokio::test]
async fn failed_login_commits_nothing() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(401, serde_json::json!({ "message": "Invalid email or password" }));

    let err = session.login("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid email or password");
    assert_eq!(tokens.get_token(), None);
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn wrong_password_keeps_existing_session() {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    transport.push_json(200, user_json("u1", "a@b.com"));
    session.hydrate().await.unwrap();
    transport.push_json(401, serde_json::json!({ "message": "Invalid credentials" }));

    let err = session.login("a@b.com", "wrong").await.unwrap_err();

    assert_eq!(err.to_string(), "Invalid credentials");
    assert_eq!(transport.last_request().header("Authorization"), None);
    assert!(session.is_authenticated());
    assert_eq!(tokens.get_token().as_deref(), Some("t1"));
    assert_eq!(session.user().map(|u| u.id), Some("u1".to_owned()));
}

#[tokio::test]
async fn login_with_malformed_response_commits_nothing() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(200, serde_json::json!({ "user": user_json("u1", "a@b.com") }));

    assert!(session.login("a@b.com", "secret1").await.is_err());
    assert_eq!(tokens.get_token(), None);
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn login_then_logout_clears_everything() {
    for token in ["t1", "t2", "t3"] {
        let (session, transport, tokens) = controller();
        session.hydrate().await.unwrap();
        transport.push_json(200, login_json(token));
        session.login("a@b.com", "secret1").await.unwrap();

        assert_eq!(session.logout(), Route::Login);

        assert_eq!(tokens.get_token(), None);
        assert_eq!(session.status(), SessionStatus::Anonymous);
        assert_eq!(session.user(), None);
    }
}

#[tokio::test]
async fn logout_when_anonymous_is_harmless() {
    let (session, _transport, tokens) = controller();
    assert_eq!(session.logout(), Route::Login);
    assert_eq!(tokens.get_token(), None);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn overlapping_login_is_rejected() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    let gate = transport.push_gated_json(200, login_json("t1"));

    let (first, second, ()) = tokio::join!(
        session.login("a@b.com", "secret1"),
        session.login("a@b.com", "secret1"),
        async {
            tokio::task::yield_now().await;
            gate.notify_one();
        }
    );

    assert_eq!(first.unwrap(), Route::Dashboard);
    assert!(matches!(second, Err(SessionError::InFlight(Operation::Login))));
    assert_eq!(transport.request_count(), 1);
    assert_eq!(tokens.get_token().as_deref(), Some("t1"));
}

#[tokio::test]
async fn login_completing_after_logout_is_superseded() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    let gate = transport.push_gated_json(200, login_json("t1"));

    let (result, ()) = tokio::join!(session.login("a@b.com", "secret1"), async {
        tokio::task::yield_now().await;
        session.logout();
        gate.notify_one();
    });

    assert!(matches!(result, Err(SessionError::Superseded(Operation::Login))));
    assert_eq!(tokens.get_token(), None);
}

// =============================================================================
// 401 handling
// =============================================================================

#[tokio::test]
async fn unauthorized_protected_call_forces_logout() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(200, login_json("t1"));
    session.login("a@b.com", "secret1").await.unwrap();

    transport.push_json(401, serde_json::json!({ "error": "Unauthorized" }));
    let result = session.http().get::<serde_json::Value>("/api/forms").await;

    assert!(result.unwrap_err().is_unauthorized());
    assert_eq!(session.status(), SessionStatus::Anonymous);
    assert_eq!(tokens.get_token(), None);
}

#[tokio::test]
async fn unauthorized_for_superseded_token_is_ignored() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(200, login_json("old"));
    session.login("a@b.com", "secret1").await.unwrap();

    let gate = transport.push_gated_json(401, serde_json::json!({}));
    let (stale, ()) = tokio::join!(session.http().get::<serde_json::Value>("/api/forms"), async {
        tokio::task::yield_now().await;
        session.logout();
        transport.push_json(200, login_json("new"));
        session.login("a@b.com", "secret1").await.unwrap();
        gate.notify_one();
    });

    assert!(stale.is_err());
    assert!(session.is_authenticated());
    assert_eq!(tokens.get_token().as_deref(), Some("new"));
}

#[tokio::test]
async fn shutdown_detaches_from_unauthorized_signal() {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    transport.push_json(200, user_json("u1", "a@b.com"));
    session.hydrate().await.unwrap();
    session.shutdown();

    transport.push_json(401, serde_json::json!({}));
    let _ = session.http().get::<serde_json::Value>("/api/forms").await;

    assert!(session.is_authenticated());
    assert_eq!(tokens.get_token().as_deref(), Some("t1"));
}

// =============================================================================
// signup / callback / reset
// =============================================================================

#[tokio::test]
async fn signup_returns_message_without_session() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(201, serde_json::json!({ "message": "Please verify your email" }));

    let message = session.signup("new@b.com", "secret1").await.unwrap();

    assert_eq!(message, "Please verify your email");
    assert_eq!(tokens.get_token(), None);
    assert!(!session.is_authenticated());
    assert_eq!(transport.last_request().url, "http://api.test/api/auth/signup");
}

#[tokio::test]
async fn signup_defaults_message() {
    let (session, transport, _tokens) = controller();
    transport.push_json(201, serde_json::json!({}));
    assert_eq!(session.signup("new@b.com", "secret1").await.unwrap(), DEFAULT_SIGNUP_MESSAGE);
}

#[tokio::test]
async fn signup_failure_carries_server_message() {
    let (session, transport, _tokens) = controller();
    transport.push_json(409, serde_json::json!({ "error": "Email already registered" }));
    let err = session.signup("a@b.com", "secret1").await.unwrap_err();
    assert_eq!(err.to_string(), "Email already registered");
}

#[tokio::test]
async fn callback_token_authenticates() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(200, user_json("u1", "a@b.com"));

    assert_eq!(session.set_token_from_callback("oauth-t").await.unwrap(), Route::Dashboard);
    assert!(session.is_authenticated());
    assert_eq!(tokens.get_token().as_deref(), Some("oauth-t"));
    assert_eq!(transport.last_request().header("Authorization"), Some("Bearer oauth-t"));
}

#[tokio::test]
async fn callback_failure_rolls_back_token() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(500, serde_json::json!({ "message": "Profile service down" }));

    let err = session.set_token_from_callback("oauth-t").await.unwrap_err();

    assert_eq!(err.to_string(), "Profile service down");
    assert_eq!(tokens.get_token(), None);
    assert_eq!(session.status(), SessionStatus::Anonymous);
}

#[tokio::test]
async fn callback_unauthorized_rolls_back_token() {
    let (session, transport, tokens) = controller();
    session.hydrate().await.unwrap();
    transport.push_json(401, serde_json::json!({}));

    assert!(session.set_token_from_callback("bad").await.is_err());
    assert_eq!(tokens.get_token(), None);
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn reset_password_posts_token_and_password() {
    let (session, transport, tokens) = controller();
    transport.push_json(200, serde_json::json!({ "message": "Password updated" }));

    assert_eq!(session.reset_password("reset-1", "n3w-pass").await.unwrap(), "Password updated");
    assert_eq!(
        transport.last_request().body,
        Some(serde_json::json!({ "token": "reset-1", "password": "n3w-pass" }))
    );
    assert_eq!(tokens.get_token(), None);
}

// =============================================================================
// profile
// =============================================================================

async fn signed_in() -> (SessionController, Arc<MockTransport>, Arc<MemoryTokenStore>) {
    let (session, transport, tokens) = controller_with(Some("t1"), false);
    transport.push_json(200, user_json("u1", "a@b.com"));
    session.hydrate().await.unwrap();
    (session, transport, tokens)
}

#[tokio::test]
async fn update_profile_replaces_user_with_acknowledgment() {
    let (session, transport, _tokens) = signed_in().await;
    transport.push_json(200, serde_json::json!({ "name": "Ada", "bio": "Math" }));

    let update = ProfileUpdate { name: Some("Ada".into()), bio: Some("Math".into()), ..ProfileUpdate::default() };
    let user = session.update_profile(&update).await.unwrap();

    assert_eq!(user.profile.as_ref().unwrap().bio.as_deref(), Some("Math"));
    assert_eq!(session.user(), Some(user));
    assert_eq!(transport.last_request().method, Method::Put);
    assert_eq!(transport.last_request().url, "http://api.test/api/user/me");
}

#[tokio::test]
async fn update_profile_empty_ack_merges_update() {
    let (session, transport, _tokens) = signed_in().await;
    transport.push_raw(204, "");

    let update = ProfileUpdate { website: Some("https://ada.test".into()), ..ProfileUpdate::default() };
    let user = session.update_profile(&update).await.unwrap();
    assert_eq!(user.profile.unwrap().website.as_deref(), Some("https://ada.test"));
}

#[tokio::test]
async fn update_profile_message_only_ack_merges_update() {
    let (session, transport, _tokens) = signed_in().await;
    transport.push_json(200, serde_json::json!({ "name": "Ada" }));
    session
        .update_profile(&ProfileUpdate { name: Some("Ada".into()), ..ProfileUpdate::default() })
        .await
        .unwrap();

    transport.push_json(200, serde_json::json!({ "success": true, "message": "Profile updated" }));
    let user = session
        .update_profile(&ProfileUpdate { bio: Some("Math".into()), ..ProfileUpdate::default() })
        .await
        .unwrap();

    let profile = user.profile.unwrap();
    assert_eq!(profile.name.as_deref(), Some("Ada"));
    assert_eq!(profile.bio.as_deref(), Some("Math"));
    assert_eq!(session.user().unwrap().profile, Some(profile));
}

#[tokio::test]
async fn update_profile_accepts_enveloped_ack() {
    let (session, transport, _tokens) = signed_in().await;
    transport.push_json(200, serde_json::json!({ "success": true, "data": { "name": "Ada", "bio": "Math" } }));

    let user = session
        .update_profile(&ProfileUpdate { bio: Some("Math".into()), ..ProfileUpdate::default() })
        .await
        .unwrap();
    assert_eq!(user.profile.unwrap().name.as_deref(), Some("Ada"));
}

#[tokio::test]
async fn update_profile_accepts_wrapped_user_ack() {
    let (session, transport, _tokens) = signed_in().await;
    let mut ack = user_json("u1", "a@b.com");
    ack["profile"] = serde_json::json!({ "website": "https://ada.test" });
    transport.push_json(200, serde_json::json!({ "user": ack }));

    let user = session
        .update_profile(&ProfileUpdate { website: Some("https://ada.test".into()), ..ProfileUpdate::default() })
        .await
        .unwrap();
    assert_eq!(user.profile.unwrap().website.as_deref(), Some("https://ada.test"));
}

#[tokio::test]
async fn update_profile_requires_session() {
    let (session, _transport, _tokens) = controller();
    session.hydrate().await.unwrap();
    let err = session.update_profile(&ProfileUpdate::default()).await.unwrap_err();
    assert!(matches!(err, SessionError::NotAuthenticated));
}

#[tokio::test]
async fn refresh_user_replaces_user() {
    let (session, transport, _tokens) = signed_in().await;
    transport.push_json(200, serde_json::json!({ "id": "u1", "email": "a@b.com", "displayName": "Ada" }));

    let user = session.refresh_user().await.unwrap();
    assert_eq!(user.display_name.as_deref(), Some("Ada"));
    assert_eq!(session.user().unwrap().display_name.as_deref(), Some("Ada"));
}

#[test]
fn merge_profile_prefers_update_fields() {
    let current = Profile { name: Some("Old".into()), bio: Some("Bio".into()), ..Profile::default() };
    let update = ProfileUpdate { name: Some("New".into()), ..ProfileUpdate::default() };
    let merged = merge_profile(Some(&current), &update);
    assert_eq!(merged.name.as_deref(), Some("New"));
    assert_eq!(merged.bio.as_deref(), Some("Bio"));
}

// =============================================================================
// observers
// =============================================================================

#[tokio::test]
async fn subscribers_see_each_transition() {
    let (session, transport, _tokens) = controller();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let id = session.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.status));

    session.hydrate().await.unwrap();
    transport.push_json(200, login_json("t1"));
    session.login("a@b.com", "secret1").await.unwrap();
    session.logout();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![SessionStatus::Anonymous, SessionStatus::Authenticated, SessionStatus::Anonymous]
    );

    assert!(session.unsubscribe(id));
    session.logout();
    assert_eq!(seen.lock().unwrap().len(), 3);
}

#[test]
fn snapshot_requires_user_and_token() {
    let user = serde_json::from_value::<User>(user_json("u1", "a@b.com")).unwrap();
    let snapshot = SessionSnapshot { status: SessionStatus::Authenticated, user: Some(user), has_token: false };
    assert!(!snapshot.is_authenticated());
}

#[test]
fn route_paths() {
    assert_eq!(Route::Dashboard.path(), "/dashboard");
    assert_eq!(Route::Login.path(), "/login");
}
