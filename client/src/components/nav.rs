//! Top navigation bar for signed-in pages.

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::use_navigate;
use session::SessionController;

use crate::state::auth::AuthState;

#[component]
pub fn Nav() -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let session = expect_context::<SessionController>();
    let navigate = use_navigate();

    let on_logout = move |_| {
        let route = session.logout();
        navigate(route.path(), NavigateOptions::default());
    };

    view! {
        <nav class="nav">
            <a href="/dashboard" class="nav__brand">"formbase"</a>
            <a href="/dashboard" class="nav__link">"Dashboard"</a>
            <a href="/profile" class="nav__link">"Profile"</a>
            <span class="nav__spacer"></span>
            <span class="nav__user">{move || auth.get().display_name().unwrap_or_default()}</span>
            <button class="nav__logout" on:click=on_logout>
                "Log out"
            </button>
        </nav>
    }
}
