//! Configured JSON request layer over a [`Transport`].
//!
//! SYSTEM CONTEXT
//! ==============
//! Every call goes through two interceptors:
//! - request: attach `Authorization: Bearer <token>` when the token store
//!   holds one;
//! - response: on 401 for a request that carried a token, log and emit an
//!   [`Unauthorized`] signal to subscribers (the session controller forces
//!   a logout in response).
//!
//! [`extract_error_message`] turns any [`ApiError`] into display text.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorBody};
use crate::forms::validation_message;
use crate::token::TokenStore;
use crate::transport::{HttpRequest, HttpResponse, Method, Transport};

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Structured signal emitted when the server rejects the bearer token.
#[derive(Clone, PartialEq, Eq)]
pub struct Unauthorized {
    pub method: Method,
    pub path: String,
    /// The token the rejected request carried.
    pub token: String,
}

impl std::fmt::Debug for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Unauthorized")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Handle returned when registering a listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

type UnauthorizedListener = Arc<dyn Fn(&Unauthorized) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(SubscriptionId, UnauthorizedListener)>,
}

struct Inner {
    base_url: String,
    timeout: Duration,
    transport: Arc<dyn Transport>,
    tokens: Arc<dyn TokenStore>,
    listeners: Mutex<Listeners>,
}

/// Cheaply clonable API client; clones share transport, token store and
/// subscribers.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl HttpClient {
    #[must_use]
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                base_url: crate::config::normalize_base_url(&config.base_url),
                timeout: Duration::from_secs(config.request_timeout_secs),
                transport,
                tokens,
                listeners: Mutex::new(Listeners::default()),
            }),
        }
    }

    /// Client backed by [`crate::transport::ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client fails to build.
    #[cfg(feature = "native")]
    pub fn native(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Result<Self, ApiError> {
        let transport =
            crate::transport::ReqwestTransport::new(Duration::from_secs(config.connect_timeout_secs))?;
        Ok(Self::new(config, Arc::new(transport), tokens))
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    pub(crate) fn tokens(&self) -> &dyn TokenStore {
        self.inner.tokens.as_ref()
    }

    /// Register a callback for rejected-token responses.
    pub fn on_unauthorized<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&Unauthorized) + Send + Sync + 'static,
    {
        let Ok(mut listeners) = self.inner.listeners.lock() else {
            return SubscriptionId(u64::MAX);
        };
        let id = SubscriptionId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));
        id
    }

    /// Remove a callback. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let Ok(mut listeners) = self.inner.listeners.lock() else {
            return false;
        };
        let before = listeners.entries.len();
        listeners.entries.retain(|(entry, _)| *entry != id);
        listeners.entries.len() != before
    }

    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::Get, path, None).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::Post, path, Some(encode_body(body)?)).await
    }

    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request(Method::Put, path, Some(encode_body(body)?)).await
    }

    /// `POST` without the bearer token, for credential endpoints. A 401
    /// here means bad credentials and never raises [`Unauthorized`].
    ///
    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn post_anonymous<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::Post, path, Some(encode_body(body)?), false).await?;
        decode_body(&response.body)
    }

    /// # Errors
    ///
    /// See [`HttpClient::request`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.request(Method::Delete, path, None).await
    }

    /// Send a request and decode a 2xx JSON body into `T`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Transport`] / [`ApiError::Timeout`] when no response arrives
    /// - [`ApiError::Status`] for non-2xx responses
    /// - [`ApiError::Decode`] when the body does not match `T`
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ApiError> {
        let response = self.send(method, path, body, true).await?;
        decode_body(&response.body)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
        with_bearer: bool,
    ) -> Result<HttpResponse, ApiError> {
        let mut headers = vec![
            ("Content-Type".to_owned(), "application/json".to_owned()),
            ("Accept".to_owned(), "application/json".to_owned()),
        ];
        let bearer = if with_bearer { self.inner.tokens.get_token() } else { None };
        if let Some(token) = &bearer {
            headers.push(("Authorization".to_owned(), format!("Bearer {token}")));
        }

        let request = HttpRequest {
            method,
            url: self.url(path),
            headers,
            body,
            timeout: self.inner.timeout,
        };

        let response = match self.inner.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(%method, path, error = %e, "request failed");
                return Err(e);
            }
        };
        tracing::debug!(%method, path, status = response.status, "response");

        if response.status == 401 {
            tracing::warn!(%method, path, "unauthorized response");
            if let Some(token) = bearer {
                self.emit_unauthorized(&Unauthorized { method, path: path.to_owned(), token });
            }
        }

        if !response.is_success() {
            return Err(ApiError::Status {
                status: response.status,
                body: parse_error_body(&response.body),
            });
        }
        Ok(response)
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_owned();
        }
        let path = path.trim_start_matches('/');
        format!("{}/{path}", self.inner.base_url)
    }

    fn emit_unauthorized(&self, event: &Unauthorized) {
        // Snapshot first so a listener may (un)subscribe without deadlocking.
        let listeners: Vec<UnauthorizedListener> = match self.inner.listeners.lock() {
            Ok(listeners) => listeners.entries.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(event);
        }
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::Decode(format!("request body: {e}")))
}

fn decode_body<T: DeserializeOwned>(raw: &str) -> Result<T, ApiError> {
    let result = if raw.trim().is_empty() {
        serde_json::from_value(serde_json::Value::Null)
    } else {
        serde_json::from_str(raw)
    };
    result.map_err(|e| ApiError::Decode(e.to_string()))
}

fn parse_error_body(raw: &str) -> Option<ErrorBody> {
    serde_json::from_str(raw).ok()
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Display text for a failed call.
///
/// Priority: server `message`, server `error`, field errors, the error's own
/// description, then [`GENERIC_ERROR_MESSAGE`]. Never panics.
#[must_use]
pub fn extract_error_message(error: &ApiError) -> String {
    let (message, error_field) = match error {
        ApiError::Status { body: Some(body), .. } => (body.message.as_deref(), body.error.as_deref()),
        ApiError::Rejected { message, .. } => (message.as_deref(), None),
        _ => (None, None),
    };
    if let Some(text) = non_blank(message).or(non_blank(error_field)) {
        return text.to_owned();
    }
    if !error.field_errors().is_empty() {
        return validation_message(error.field_errors());
    }
    let own = error.to_string();
    if own.trim().is_empty() { GENERIC_ERROR_MESSAGE.to_owned() } else { own }
}
