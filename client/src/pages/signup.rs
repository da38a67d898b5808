//! Signup page. A successful signup shows the server's message (usually
//! "check your email") and never signs the user in.

#[cfg(test)]
#[path = "signup_test.rs"]
mod signup_test;

use leptos::prelude::*;
use session::SessionController;

use crate::pages::credentials::{validate_email, validate_new_password};

pub(crate) fn validate_signup_input(email: &str, password: &str, confirm: &str) -> Result<String, &'static str> {
    let email = validate_email(email)?;
    validate_new_password(password, confirm)?;
    Ok(email)
}

#[component]
pub fn SignupPage() -> impl IntoView {
    let session = expect_context::<SessionController>();

    let email = RwSignal::new(String::new());
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
        let password_value = password.get();
        let email_value = match validate_signup_input(&email.get(), &password_value, &confirm.get()) {
            Ok(email_value) => email_value,
            Err(message) => {
                error.set(message.to_owned());
                return;
            }
        };
        busy.set(true);
        error.set(String::new());

        #[cfg(feature = "csr")]
        {
            let session = session.clone();
            leptos::task::spawn_local(async move {
                match session.signup(&email_value, &password_value).await {
                    Ok(message) => {
                        password.set(String::new());
                        confirm.set(String::new());
                        done.set(Some(message));
                    }
                    Err(e) => error.set(e.to_string()),
                }
                busy.set(false);
            });
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = (&session, email_value, password_value);
        }
    });

    view! {
        <div class="auth-page">
            <div class="auth-card">
                <h1>"Create your account"</h1>
                <Show
                    when=move || done.get().is_none()
                    fallback=move || {
                        view! {
                            <p class="auth-message">{move || done.get().unwrap_or_default()}</p>
                            <a href="/login" class="auth-button">"Back to sign in"</a>
                        }
                    }
                >
                    <form class="auth-form" on:submit=move |ev| on_submit.run(ev)>
                        <input
                            class="auth-input"
                            type="email"
                            placeholder="you@example.com"
                            autocomplete="email"
                            prop:value=move || email.get()
                            on:input=move |ev| email.set(event_target_value(&ev))
                        />
                        <input
                            class="auth-input"
                            type="password"
                            placeholder="Password (8+ characters)"
                            autocomplete="new-password"
                            prop:value=move || password.get()
                            on:input=move |ev| password.set(event_target_value(&ev))
                        />
                        <input
                            class="auth-input"
                            type="password"
                            placeholder="Confirm password"
                            autocomplete="new-password"
                            prop:value=move || confirm.get()
                            on:input=move |ev| confirm.set(event_target_value(&ev))
                        />
                        <button class="auth-button" type="submit" disabled=move || busy.get()>
                            {move || if busy.get() { "Creating account..." } else { "Sign up" }}
                        </button>
                    </form>
                    <Show when=move || !error.get().is_empty()>
                        <p class="auth-message auth-message--error">{move || error.get()}</p>
                    </Show>
                    <p class="auth-card__footer">
                        "Already registered? "
                        <a href="/login">"Sign in"</a>
                    </p>
                </Show>
            </div>
        </div>
    }
}
