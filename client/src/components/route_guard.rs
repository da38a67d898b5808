//! Protected-route wrapper.
//!
//! SYSTEM CONTEXT
//! ==============
//! Wraps every authenticated page. The decision itself comes from
//! `session::guard::evaluate`; this component only turns it into a view:
//! a neutral indicator while hydrating, a replace-navigation to the login
//! page (carrying the requested location) when signed out, and the page
//! plus navigation bar when signed in.

#[cfg(test)]
#[path = "route_guard_test.rs"]
mod route_guard_test;

use leptos::prelude::*;
use leptos_router::NavigateOptions;
use leptos_router::hooks::{use_location, use_navigate};
use session::guard::{GuardDecision, evaluate};

use crate::components::nav::Nav;
use crate::state::auth::AuthState;

/// Path plus query string, as it should be restored after login.
pub(crate) fn requested_path(pathname: &str, search: &str) -> String {
    let search = search.trim_start_matches('?');
    if search.is_empty() { pathname.to_owned() } else { format!("{pathname}?{search}") }
}

/// Render `children` only for a signed-in user.
#[component]
pub fn ProtectedRoute(children: ChildrenFn) -> impl IntoView {
    let auth = expect_context::<RwSignal<AuthState>>();
    let location = use_location();
    let navigate = use_navigate();

    let decision = Memo::new(move |_| {
        let requested = requested_path(&location.pathname.get(), &location.search.get());
        evaluate(&auth.get().snapshot(), &requested)
    });

    Effect::new(move || {
        if let GuardDecision::Redirect { to } = decision.get() {
            navigate(&to, NavigateOptions { replace: true, ..NavigateOptions::default() });
        }
    });

    view! {
        <Show
            when=move || decision.get() == GuardDecision::Render
            fallback=move || {
                (decision.get() == GuardDecision::Pending)
                    .then(|| view! { <div class="route-guard__pending">"Loading..."</div> })
            }
        >
            <Nav/>
            <main class="page">{children()}</main>
        </Show>
    }
}
