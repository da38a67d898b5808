//! Root application component with routing and context providers.
//!
//! SYSTEM CONTEXT
//! ==============
//! Builds the single session stack for the tab (token store, transport,
//! HTTP client, session controller, forms API), provides each piece as
//! context, mirrors session transitions into `RwSignal<AuthState>`, and
//! starts hydration before the first route renders.

#[cfg(test)]
#[path = "app_test.rs"]
mod app_test;

use std::sync::Arc;

use leptos::prelude::*;
use leptos_meta::{Stylesheet, Title, provide_meta_context};
use leptos_router::{
    ParamSegment, StaticSegment,
    components::{Redirect, Route, Router, Routes},
};
use session::{ClientConfig, FormsApi, HttpClient, SessionController};

use crate::components::route_guard::ProtectedRoute;
use crate::net::storage::LocalStorageTokenStore;
use crate::net::transport::GlooTransport;
use crate::pages::{
    callback::CallbackPage, dashboard::DashboardPage, form_detail::FormDetailPage, login::LoginPage,
    profile::ProfilePage, reset_password::ResetPasswordPage, signup::SignupPage,
};
use crate::state::auth::AuthState;

/// Browser config: the API origin is fixed at build time through
/// `FORMBASE_API_URL`; everything else uses defaults.
pub fn browser_config(api_url: Option<&str>) -> ClientConfig {
    api_url.map_or_else(ClientConfig::default, ClientConfig::with_base_url)
}

/// Root application component.
///
/// Provides all shared state contexts and sets up client-side routing.
#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    let config = browser_config(option_env!("FORMBASE_API_URL"));
    let tokens = Arc::new(LocalStorageTokenStore::new(config.token_key.clone()));
    let http = HttpClient::new(&config, Arc::new(GlooTransport), tokens);
    let session = SessionController::from_config(http.clone(), &config);
    let forms = FormsApi::new(http);

    let auth = RwSignal::new(AuthState::from(&session.snapshot()));
    let subscription = session.subscribe(move |snapshot| auth.set(AuthState::from(snapshot)));

    let session_cleanup = session.clone();
    on_cleanup(move || {
        session_cleanup.unsubscribe(subscription);
        session_cleanup.shutdown();
    });

    #[cfg(feature = "csr")]
    {
        let session = session.clone();
        leptos::task::spawn_local(async move {
            match session.hydrate().await {
                Ok(status) => log::debug!("session hydrated: {status:?}"),
                Err(e) => log::warn!("session hydration skipped: {e}"),
            }
        });
    }

    provide_context(config);
    provide_context(session);
    provide_context(forms);
    provide_context(auth);

    view! {
        <Stylesheet id="leptos" href="/pkg/formbase.css"/>
        <Title text="formbase"/>

        <Router>
            <Routes fallback=|| "Page not found.".into_view()>
                <Route path=StaticSegment("") view=|| view! { <Redirect path="/dashboard"/> }/>
                <Route path=StaticSegment("login") view=LoginPage/>
                <Route path=StaticSegment("signup") view=SignupPage/>
                <Route path=StaticSegment("reset-password") view=ResetPasswordPage/>
                <Route path=(StaticSegment("auth"), StaticSegment("callback")) view=CallbackPage/>
                <Route
                    path=StaticSegment("dashboard")
                    view=|| view! { <ProtectedRoute><DashboardPage/></ProtectedRoute> }
                />
                <Route
                    path=(StaticSegment("forms"), ParamSegment("id"))
                    view=|| view! { <ProtectedRoute><FormDetailPage/></ProtectedRoute> }
                />
                <Route
                    path=StaticSegment("profile")
                    view=|| view! { <ProtectedRoute><ProfilePage/></ProtectedRoute> }
                />
            </Routes>
        </Router>
    }
}
