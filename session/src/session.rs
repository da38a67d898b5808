//! Session controller: the single owner of the bearer token and the
//! signed-in user.
//!
//! SYSTEM CONTEXT
//! ==============
//! Lifecycle: construct at app start, [`SessionController::hydrate`] once,
//! [`SessionController::shutdown`] at teardown. UI code reads snapshots and
//! subscribes to transitions; it never writes the token store itself.
//!
//! ```text
//! Hydrating ──▶ Authenticated ◀──▶ Anonymous
//!     └───────────────────────────────▲
//! ```
//!
//! RACES
//! =====
//! - Each flow holds a per-operation in-flight flag; a second call of the
//!   same kind fails fast with [`SessionError::InFlight`].
//! - Every committed transition bumps an epoch. Async flows capture the
//!   epoch before awaiting and drop their result if it moved, so a slow
//!   hydration can never resurrect a session after logout.
//! - A 401 on a token-bearing request forces logout, but only if that token
//!   is still the current one.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde::Deserialize;

use crate::error::{ApiError, SessionError};
use crate::http::{HttpClient, SubscriptionId, Unauthorized};
use crate::types::{Credentials, LoginResponse, MessageResponse, Profile, ProfileUpdate, ResetPasswordRequest, User};

const DEFAULT_SIGNUP_MESSAGE: &str = "Check your email to verify your account.";
const DEFAULT_RESET_MESSAGE: &str = "Your password has been reset.";

/// Flows guarded against overlapping calls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Hydrate,
    Login,
    Signup,
    Callback,
    Refresh,
    ProfileUpdate,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Hydrate => "session restore",
            Self::Login => "login",
            Self::Signup => "signup",
            Self::Callback => "sign-in callback",
            Self::Refresh => "profile refresh",
            Self::ProfileUpdate => "profile update",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Hydrating,
    Authenticated,
    Anonymous,
}

/// Read-only view of the session handed to UI code.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSnapshot {
    pub status: SessionStatus,
    pub user: Option<User>,
    pub has_token: bool,
}

impl SessionSnapshot {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.status == SessionStatus::Hydrating
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated && self.user.is_some() && self.has_token
    }
}

/// Where the caller should navigate after a flow completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Login,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Dashboard => "/dashboard",
            Self::Login => "/login",
        }
    }
}

/// `/api/auth/me` answers either `{ user: {...} }` or the bare user.
#[derive(Deserialize)]
#[serde(untagged)]
enum MeResponse {
    Wrapped { user: User },
    Bare(User),
}

impl MeResponse {
    fn into_user(self) -> User {
        match self {
            Self::Wrapped { user } | Self::Bare(user) => user,
        }
    }
}

/// Accepted `PUT /api/user/me` acknowledgments. A body with no profile
/// fields (e.g. `{ success, message }`) is not an acknowledgment.
#[derive(Deserialize)]
#[serde(untagged)]
enum ProfileAck {
    Wrapped { user: User },
    Envelope { data: Profile },
    Bare(Profile),
}

impl ProfileAck {
    fn into_profile(self) -> Option<Profile> {
        let profile = match self {
            Self::Wrapped { user } => user.profile?,
            Self::Envelope { data } => data,
            Self::Bare(profile) => profile,
        };
        (!profile.is_empty()).then_some(profile)
    }
}

type Listener = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

struct State {
    status: SessionStatus,
    user: Option<User>,
    token: Option<String>,
    epoch: u64,
    in_flight: HashSet<Operation>,
}

impl State {
    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot { status: self.status, user: self.user.clone(), has_token: self.token.is_some() }
    }
}

struct Inner {
    http: HttpClient,
    merge_profile: bool,
    state: Mutex<State>,
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_listener: Mutex<u64>,
    unauthorized: Mutex<Option<SubscriptionId>>,
}

/// Releases the in-flight flag on drop, including when the future is dropped.
struct InFlight<'a> {
    inner: &'a Inner,
    op: Operation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.inner.lock_state().in_flight.remove(&self.op);
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, State> {
        // Poisoning is ignored: every write is a whole-field assignment.
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn begin(&self, op: Operation) -> Result<InFlight<'_>, SessionError> {
        if !self.lock_state().in_flight.insert(op) {
            tracing::debug!(operation = %op, "rejected overlapping call");
            return Err(SessionError::InFlight(op));
        }
        Ok(InFlight { inner: self, op })
    }

    fn epoch(&self) -> u64 {
        self.lock_state().epoch
    }

    /// Apply `change` and bump the epoch if nothing committed since `epoch`.
    /// `None` skips the check. Returns whether the change was applied.
    fn commit(&self, epoch: Option<u64>, change: impl FnOnce(&mut State)) -> bool {
        let snapshot = {
            let mut state = self.lock_state();
            if epoch.is_some_and(|e| e != state.epoch) {
                return false;
            }
            change(&mut state);
            state.epoch += 1;
            // Token store writes happen under the state lock so the two never
            // diverge between concurrent flows.
            self.http.tokens().set_token(state.token.as_deref());
            state.snapshot()
        };
        self.notify(&snapshot);
        true
    }

    fn notify(&self, snapshot: &SessionSnapshot) {
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(snapshot);
        }
    }

    fn sign_in(state: &mut State, token: String, user: User) {
        state.status = SessionStatus::Authenticated;
        state.token = Some(token);
        state.user = Some(user);
    }

    fn sign_out(state: &mut State) {
        state.status = SessionStatus::Anonymous;
        state.token = None;
        state.user = None;
    }

    fn on_unauthorized(&self, event: &Unauthorized) {
        let current = self.lock_state().token.clone();
        if current.as_deref() != Some(event.token.as_str()) {
            tracing::debug!(path = %event.path, "ignoring 401 for a superseded token");
            return;
        }
        tracing::warn!(method = %event.method, path = %event.path, "token rejected; signing out");
        self.commit(None, Self::sign_out);
    }

    async fn fetch_user(&self) -> Result<User, ApiError> {
        let mut user = self.http.get::<MeResponse>("/api/auth/me").await?.into_user();
        if self.merge_profile {
            match self.http.get::<Profile>("/api/user/me").await {
                Ok(profile) => user.profile = Some(profile),
                Err(e) if e.is_unauthorized() => return Err(e),
                Err(e) => tracing::warn!(error = %e, "extended profile unavailable; using base user"),
            }
        }
        Ok(user)
    }
}

/// Cheaply clonable handle; clones share one session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    /// Build a controller in the `Hydrating` state and subscribe it to the
    /// client's 401 signal.
    #[must_use]
    pub fn new(http: HttpClient, merge_profile: bool) -> Self {
        let token = http.tokens().get_token();
        let inner = Arc::new(Inner {
            http: http.clone(),
            merge_profile,
            state: Mutex::new(State {
                status: SessionStatus::Hydrating,
                user: None,
                token,
                epoch: 0,
                in_flight: HashSet::new(),
            }),
            listeners: Mutex::new(Vec::new()),
            next_listener: Mutex::new(0),
            unauthorized: Mutex::new(None),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        let id = http.on_unauthorized(move |event| {
            if let Some(inner) = weak.upgrade() {
                inner.on_unauthorized(event);
            }
        });
        if let Ok(mut slot) = inner.unauthorized.lock() {
            *slot = Some(id);
        }

        Self { inner }
    }

    /// Controller using `config.merge_profile`.
    #[must_use]
    pub fn from_config(http: HttpClient, config: &crate::ClientConfig) -> Self {
        Self::new(http, config.merge_profile)
    }

    #[must_use]
    pub fn http(&self) -> &HttpClient {
        &self.inner.http
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.lock_state().snapshot()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.lock_state().status
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.snapshot().is_authenticated()
    }

    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.lock_state().user.clone()
    }

    /// Observe every transition. The listener runs synchronously after the
    /// state lock is released.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionSnapshot) + Send + Sync + 'static,
    {
        let id = {
            let mut next = self.inner.next_listener.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            *next += 1;
            SubscriptionId(*next)
        };
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.push((id, Arc::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.inner.listeners.lock() else {
            return false;
        };
        let before = listeners.len();
        listeners.retain(|(entry, _)| *entry != id);
        listeners.len() != before
    }

    /// Detach from the HTTP client and drop all observers.
    pub fn shutdown(&self) {
        let id = self.inner.unauthorized.lock().ok().and_then(|mut slot| slot.take());
        if let Some(id) = id {
            self.inner.http.unsubscribe(id);
        }
        if let Ok(mut listeners) = self.inner.listeners.lock() {
            listeners.clear();
        }
    }

    /// Rebuild the session from the persisted token.
    ///
    /// Never fails on network or auth errors: any failure clears the token
    /// and lands in `Anonymous`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InFlight`] if a hydration is already running.
    pub async fn hydrate(&self) -> Result<SessionStatus, SessionError> {
        let _flight = self.inner.begin(Operation::Hydrate)?;
        let epoch = self.inner.epoch();

        let Some(token) = self.inner.http.tokens().get_token() else {
            self.inner.commit(Some(epoch), Inner::sign_out);
            return Ok(self.status());
        };

        match self.inner.fetch_user().await {
            Ok(user) => {
                if self.inner.commit(Some(epoch), |state| Inner::sign_in(state, token, user)) {
                    tracing::info!("session restored");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "session restore failed; clearing token");
                self.inner.commit(Some(epoch), Inner::sign_out);
            }
        }
        Ok(self.status())
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// - [`SessionError::InFlight`] while another login is pending
    /// - [`SessionError::Api`] with the extracted message on failure; nothing
    ///   is persisted in that case
    pub async fn login(&self, email: &str, password: &str) -> Result<Route, SessionError> {
        let _flight = self.inner.begin(Operation::Login)?;
        let epoch = self.inner.epoch();

        let response: LoginResponse = self
            .inner
            .http
            .post_anonymous("/api/auth/login", &Credentials { email, password })
            .await
            .inspect_err(|e| tracing::info!(error = %e, "login failed"))?;

        let LoginResponse { token, user } = response;
        if !self.inner.commit(Some(epoch), |state| Inner::sign_in(state, token, user)) {
            return Err(SessionError::Superseded(Operation::Login));
        }
        tracing::info!("signed in");
        Ok(Route::Dashboard)
    }

    /// Register an account. Never establishes a session.
    ///
    /// Returns the server's confirmation message.
    ///
    /// # Errors
    ///
    /// [`SessionError::InFlight`] or [`SessionError::Api`].
    pub async fn signup(&self, email: &str, password: &str) -> Result<String, SessionError> {
        let _flight = self.inner.begin(Operation::Signup)?;
        let response: MessageResponse = self
            .inner
            .http
            .post_anonymous("/api/auth/signup", &Credentials { email, password })
            .await?;
        Ok(response.message.unwrap_or_else(|| DEFAULT_SIGNUP_MESSAGE.to_owned()))
    }

    /// Adopt a token delivered by an OAuth redirect.
    ///
    /// The token is persisted before the user fetch; if the fetch fails it
    /// is rolled back so no dangling token remains.
    ///
    /// # Errors
    ///
    /// [`SessionError::InFlight`], [`SessionError::Superseded`], or
    /// [`SessionError::Api`] when the user fetch fails.
    pub async fn set_token_from_callback(&self, token: &str) -> Result<Route, SessionError> {
        let _flight = self.inner.begin(Operation::Callback)?;

        let token = token.to_owned();
        let persisted = token.clone();
        self.inner.commit(None, move |state| {
            state.token = Some(persisted);
            state.user = None;
        });
        let epoch = self.inner.epoch();

        match self.inner.fetch_user().await {
            Ok(user) => {
                if !self.inner.commit(Some(epoch), |state| Inner::sign_in(state, token, user)) {
                    return Err(SessionError::Superseded(Operation::Callback));
                }
                tracing::info!("signed in from callback");
                Ok(Route::Dashboard)
            }
            Err(e) => {
                tracing::warn!(error = %e, "callback token rejected; rolling back");
                self.inner.commit(Some(epoch), Inner::sign_out);
                Err(e.into())
            }
        }
    }

    /// Clear the session unconditionally.
    pub fn logout(&self) -> Route {
        self.inner.commit(None, Inner::sign_out);
        tracing::info!("signed out");
        Route::Login
    }

    /// Re-fetch the signed-in user.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`] without a session,
    /// [`SessionError::Superseded`] if the session changed meanwhile, or
    /// [`SessionError::Api`].
    pub async fn refresh_user(&self) -> Result<User, SessionError> {
        if !self.is_authenticated() {
            return Err(SessionError::NotAuthenticated);
        }
        let epoch = self.inner.epoch();
        let user = self.inner.fetch_user().await?;
        let stored = user.clone();
        if !self.inner.commit(Some(epoch), |state| state.user = Some(stored)) {
            return Err(SessionError::Superseded(Operation::Refresh));
        }
        Ok(user)
    }

    /// `PUT /api/user/me`, then replace the user with the acknowledged
    /// profile (bare, `{ user }` or `{ data }`). A body carrying no profile
    /// fields applies `update` over the current profile.
    ///
    /// # Errors
    ///
    /// [`SessionError::NotAuthenticated`], [`SessionError::InFlight`],
    /// [`SessionError::Superseded`], or [`SessionError::Api`].
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let _flight = self.inner.begin(Operation::ProfileUpdate)?;
        let Some(current) = self.snapshot().user.filter(|_| self.is_authenticated()) else {
            return Err(SessionError::NotAuthenticated);
        };
        let epoch = self.inner.epoch();

        let acknowledged: Option<ProfileAck> = self.inner.http.put("/api/user/me", update).await?;
        let profile = acknowledged
            .and_then(ProfileAck::into_profile)
            .unwrap_or_else(|| merge_profile(current.profile.as_ref(), update));
        let user = User { profile: Some(profile), ..current };

        let stored = user.clone();
        if !self.inner.commit(Some(epoch), |state| state.user = Some(stored)) {
            return Err(SessionError::Superseded(Operation::ProfileUpdate));
        }
        Ok(user)
    }

    /// Complete a password reset. Does not touch the session.
    ///
    /// # Errors
    ///
    /// [`SessionError::Api`] on failure.
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<String, SessionError> {
        let response: MessageResponse = self
            .inner
            .http
            .post_anonymous("/api/auth/reset-password", &ResetPasswordRequest { token, password })
            .await?;
        Ok(response.message.unwrap_or_else(|| DEFAULT_RESET_MESSAGE.to_owned()))
    }
}

fn merge_profile(current: Option<&Profile>, update: &ProfileUpdate) -> Profile {
    let base = current.cloned().unwrap_or_default();
    Profile {
        name: update.name.clone().or(base.name),
        bio: update.bio.clone().or(base.bio),
        avatar_url: update.avatar_url.clone().or(base.avatar_url),
        website: update.website.clone().or(base.website),
    }
}
