//! Auth-session state for the current browser user.
//!
//! SYSTEM CONTEXT
//! ==============
//! A read-only mirror of the session controller, refreshed on every
//! transition. Route guards and user-aware components read it through an
//! `RwSignal<AuthState>` context; only the controller subscription in
//! `app.rs` writes it.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use session::{SessionSnapshot, SessionStatus, User};

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthState {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub has_token: bool,
}

impl Default for AuthState {
    /// Hydration starts with the app, so the initial state is loading.
    fn default() -> Self {
        Self { status: SessionStatus::Hydrating, user: None, has_token: false }
    }
}

impl From<&SessionSnapshot> for AuthState {
    fn from(snapshot: &SessionSnapshot) -> Self {
        Self { status: snapshot.status, user: snapshot.user.clone(), has_token: snapshot.has_token }
    }
}

impl AuthState {
    pub fn loading(&self) -> bool {
        self.status == SessionStatus::Hydrating
    }

    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    /// Name shown in the navigation bar.
    pub fn display_name(&self) -> Option<String> {
        self.user.as_ref().map(|user| user.label().to_owned())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { status: self.status, user: self.user.clone(), has_token: self.has_token }
    }
}
