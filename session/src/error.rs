//! Error types for the session core.
//!
//! ERROR HANDLING
//! ==============
//! Transport and HTTP failures are [`ApiError`]. The session flows wrap them
//! in [`SessionError::Api`] together with the human-readable message the UI
//! shows inline, so callers never need to re-derive it.

use serde::Deserialize;

use crate::session::Operation;
use crate::types::FieldError;

/// Best-effort parse of a non-2xx response body.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub errors: Vec<FieldError>,
}

/// Errors produced by [`crate::HttpClient`] calls.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, connection, CORS, ...).
    #[error("request failed: {0}")]
    Transport(String),

    /// No response arrived within the configured request timeout.
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },

    /// The server answered with a non-2xx status.
    #[error("server responded with status {status}")]
    Status { status: u16, body: Option<ErrorBody> },

    /// A 2xx body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// An enveloped response came back with `success: false`.
    #[error("request rejected: {}", message.as_deref().unwrap_or("no message"))]
    Rejected { message: Option<String>, errors: Vec<FieldError> },

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ApiError {
    /// HTTP status, when the server answered at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Field-level validation failures carried by the error, if any.
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Status { body: Some(body), .. } => &body.errors,
            Self::Rejected { errors, .. } => errors,
            _ => &[],
        }
    }
}

/// Errors surfaced by [`crate::SessionController`] operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An API call failed; `message` is ready for display.
    #[error("{message}")]
    Api {
        message: String,
        #[source]
        source: ApiError,
    },

    /// The same operation is already pending.
    #[error("{0} already in progress")]
    InFlight(Operation),

    /// Another flow changed the session while this one was waiting; its
    /// result was discarded.
    #[error("{0} was interrupted by another sign-in change")]
    Superseded(Operation),

    /// The operation needs a signed-in session.
    #[error("not signed in")]
    NotAuthenticated,
}

impl From<ApiError> for SessionError {
    fn from(source: ApiError) -> Self {
        let message = crate::http::extract_error_message(&source);
        Self::Api { message, source }
    }
}

impl SessionError {
    /// Underlying API error, if the failure came from the network layer.
    #[must_use]
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Invalid configuration values.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
