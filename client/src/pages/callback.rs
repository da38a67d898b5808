//! OAuth callback: `/auth/callback?token=...`.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend finishes the provider handshake and redirects here with a
//! bearer token (or `?error=`). The page hands the token to the session
//! controller, which persists it, fetches the user and rolls back on
//! failure; on success the user lands on the dashboard.

#[cfg(test)]
#[path = "callback_test.rs"]
mod callback_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_navigate, use_query_map};
use session::SessionController;

/// Token to exchange, or the message to show instead.
pub(crate) fn callback_token(token: Option<String>, error: Option<String>) -> Result<String, String> {
    if let Some(error) = error.map(|e| e.trim().to_owned()).filter(|e| !e.is_empty()) {
        return Err(format!("Sign-in failed: {error}"));
    }
    token
        .map(|t| t.trim().to_owned())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| "Sign-in link is missing its token.".to_owned())
}

#[component]
pub fn CallbackPage() -> impl IntoView {
    let session = expect_context::<SessionController>();
    let query = use_query_map();
    let navigate = use_navigate();
    let error = RwSignal::new(None::<String>);
    let started = RwSignal::new(false);

    Effect::new(move || {
        if started.get_untracked() {
            return;
        }
        let params = query.read();
        let outcome = callback_token(params.get("token"), params.get("error"));
        drop(params);
        started.set(true);

        let token = match outcome {
            Ok(token) => token,
            Err(message) => {
                error.set(Some(message));
                return;
            }
        };

        #[cfg(feature = "csr")]
        {
            let session = session.clone();
            let navigate = navigate.clone();
            leptos::task::spawn_local(async move {
                match session.set_token_from_callback(&token).await {
                    Ok(route) => {
                        navigate(route.path(), NavigateOptions { replace: true, ..NavigateOptions::default() });
                    }
                    Err(e) => error.set(Some(e.to_string())),
                }
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&session, &navigate, token);
        }
    });

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <Show
                    when=move || error.get().is_some()
                    fallback=|| view! { <p class="auth-message">"Signing you in..."</p> }
                >
                    <p class="auth-message auth-message--error">{move || error.get().unwrap_or_default()}</p>
                    <a href="/login" class="auth-button">"Back to sign in"</a>
                </Show>
            </div>
        </div>
    }
}
