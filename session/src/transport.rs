//! Pluggable HTTP transport.
//!
//! DESIGN
//! ======
//! [`crate::HttpClient`] builds fully-resolved [`HttpRequest`]s and hands
//! them to a [`Transport`]. Native builds use [`ReqwestTransport`]; the
//! browser crate supplies a `gloo-net` implementation; tests script
//! responses. Futures are `?Send` because browser fetch futures are not.

use std::time::Duration;

use crate::error::ApiError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request with its absolute URL and final header set.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Raw response: status plus undecoded body text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request. Implementations must enforce `request.timeout` and
/// report it as [`ApiError::Timeout`].
#[async_trait::async_trait(?Send)]
pub trait Transport: Send + Sync {
    /// # Errors
    ///
    /// Returns [`ApiError::Transport`] or [`ApiError::Timeout`] when no
    /// response was received. Non-2xx statuses are not errors here.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[cfg(feature = "native")]
pub use native::ReqwestTransport;

#[cfg(feature = "native")]
mod native {
    use std::time::Duration;

    use super::{HttpRequest, HttpResponse, Method, Transport};
    use crate::error::ApiError;

    /// `reqwest`-backed transport for native builds.
    pub struct ReqwestTransport {
        http: reqwest::Client,
    }

    impl ReqwestTransport {
        /// # Errors
        ///
        /// Returns [`ApiError::HttpClientBuild`] if the TLS stack fails to initialize.
        pub fn new(connect_timeout: Duration) -> Result<Self, ApiError> {
            let http = reqwest::Client::builder()
                .connect_timeout(connect_timeout)
                .build()
                .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
            Ok(Self { http })
        }
    }

    #[async_trait::async_trait(?Send)]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
            let method = match request.method {
                Method::Get => reqwest::Method::GET,
                Method::Post => reqwest::Method::POST,
                Method::Put => reqwest::Method::PUT,
                Method::Delete => reqwest::Method::DELETE,
            };
            let mut builder = self.http.request(method, &request.url).timeout(request.timeout);
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = &request.body {
                builder = builder.json(body);
            }

            let response = builder.send().await.map_err(|e| map_error(&e, request.timeout))?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| map_error(&e, request.timeout))?;
            Ok(HttpResponse { status, body })
        }
    }

    fn map_error(error: &reqwest::Error, timeout: Duration) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout { secs: timeout.as_secs() }
        } else {
            ApiError::Transport(error.to_string())
        }
    }
}
