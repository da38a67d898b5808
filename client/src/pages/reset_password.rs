//! Password reset from an emailed link: `/reset-password?token=...`.
//! Resetting never changes the current session.

#[cfg(test)]
#[path = "reset_password_test.rs"]
mod reset_password_test;

use leptos::prelude::*;
use leptos_router::hooks::use_query_map;
use session::SessionController;

use crate::pages::credentials::validate_new_password;

/// Reset token from the query, ignoring blanks.
pub(crate) fn reset_token(raw: Option<String>) -> Option<String> {
    raw.map(|token| token.trim().to_owned()).filter(|token| !token.is_empty())
}

#[component]
pub fn ResetPasswordPage() -> impl IntoView {
    let session = expect_context::<SessionController>();
    let query = use_query_map();
    let token = Memo::new(move |_| reset_token(query.read().get("token")));

    let password = RwSignal::new(String::new());
    let confirm = RwSignal::new(String::new());
    let error = RwSignal::new(String::new());
    let done = RwSignal::new(None::<String>);
    let busy = RwSignal::new(false);

    let on_submit = Callback::new(move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        if busy.get() {
            return;
        }
        let Some(token_value) = token.get() else {
            error.set("This reset link is missing its token.".to_owned());
            return;
        };
        let password_value = password.get();
        if let Err(message) = validate_new_password(&password_value, &confirm.get()) {
            error.set(message.to_owned());
            return;
        }
        busy.set(true);
        error.set(String::new());

        #[cfg(feature = "csr")]
        {
            let session = session.clone();
            leptos::task::spawn_local(async move {
                match session.reset_password(&token_value, &password_value).await {
                    Ok(message) => done.set(Some(message)),
                    Err(e) => error.set(e.to_string()),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&session, token_value, password_value);
        }
    });

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h1>"Choose a new password"</h1>
                <Show
                    when=move || done.get().is_none()
                    fallback=move || {
                        view! {
                            <p class="auth-message">{move || done.get().unwrap_or_default()}</p>
                            <a href="/login" class="auth-button">"Sign in"</a>
                        }
                    }
                >
                    <Show
                        when=move || token.get().is_some()
                        fallback=|| {
                            view! {
                                <p class="auth-message auth-message--error">
                                    "This reset link is invalid or incomplete."
                                </p>
                            }
                        }
                    >
                        <form class="auth-form" on:submit=move |ev| on_submit.run(ev)>
                            <input
                                class="auth-input"
                                type="password"
                                placeholder="New password"
                                autocomplete="new-password"
                                prop:value=move || password.get()
                                on:input=move |ev| password.set(event_target_value(&ev))
                            />
                            <input
                                class="auth-input"
                                type="password"
                                placeholder="Confirm new password"
                                autocomplete="new-password"
                                prop:value=move || confirm.get()
                                on:input=move |ev| confirm.set(event_target_value(&ev))
                            />
                            <button class="auth-button" type="submit" disabled=move || busy.get()>
                                "Reset password"
                            </button>
                        </form>
                    </Show>
                    <Show when=move || !error.get().is_empty()>
                        <p class="auth-message auth-message--error">{move || error.get()}</p>
                    </Show>
                </Show>
            </div>
        </div>
    }
}
