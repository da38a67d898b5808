//! Route gating decisions.
//!
//! The UI layer renders whatever [`evaluate`] decides; keeping the decision
//! here lets the browser and terminal front-ends share it and keeps it
//! testable without a DOM.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::session::{Route, SessionSnapshot};

/// Query parameter carrying the originally requested location.
pub const RETURN_PARAM: &str = "redirect";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Hydration still running: show a neutral indicator, do not navigate.
    Pending,
    /// Not signed in: navigate to `to` (login with the return path).
    Redirect { to: String },
    /// Signed in: render the guarded content unchanged.
    Render,
}

/// Decide what a protected route shows for `requested_path`.
#[must_use]
pub fn evaluate(snapshot: &SessionSnapshot, requested_path: &str) -> GuardDecision {
    if snapshot.is_loading() {
        return GuardDecision::Pending;
    }
    if !snapshot.is_authenticated() {
        return GuardDecision::Redirect { to: login_redirect(requested_path) };
    }
    GuardDecision::Render
}

/// `/login?redirect=<path>`, or plain `/login` when there is nothing worth
/// returning to.
#[must_use]
pub fn login_redirect(requested_path: &str) -> String {
    match sanitize_return_path(requested_path) {
        Some(path) if path != Route::Login.path() => {
            format!("{}?{RETURN_PARAM}={}", Route::Login.path(), urlencoding::encode(&path))
        }
        _ => Route::Login.path().to_owned(),
    }
}

/// Where to go after login, given the login page's query string (with or
/// without the leading `?`). Falls back to the dashboard.
#[must_use]
pub fn return_path(query: &str) -> String {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == RETURN_PARAM)
        .and_then(|(_, value)| urlencoding::decode(value).ok())
        .and_then(|value| sanitize_return_path(&value))
        .unwrap_or_else(|| Route::Dashboard.path().to_owned())
}

/// Accept only same-origin absolute paths (`/x`, not `//host` or `http:`).
fn sanitize_return_path(raw: &str) -> Option<String> {
    let path = raw.trim();
    if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
        return None;
    }
    Some(path.to_owned())
}
