//! `gloo-net` transport for the browser.
//!
//! ERROR HANDLING
//! ==============
//! Fetch failures map to `ApiError::Transport`; a request still pending
//! when its timeout fires maps to `ApiError::Timeout`. Non-2xx statuses
//! are returned as responses for the HTTP client to interpret.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::time::Duration;

use session::ApiError;
use session::transport::{HttpRequest, HttpResponse, Transport};

/// Browser fetch transport; the timeout is raced against a `gloo-timers`
/// future.
#[derive(Clone, Copy, Debug, Default)]
pub struct GlooTransport;

/// Timer length in milliseconds, saturating at `u32::MAX` and never zero.
#[cfg_attr(not(feature = "csr"), allow(dead_code))]
pub(crate) fn timeout_millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

#[cfg(feature = "csr")]
async fn fetch(request: HttpRequest) -> Result<HttpResponse, ApiError> {
    use gloo_net::http::Request;
    use session::transport::Method;

    let mut builder = match request.method {
        Method::Get => Request::get(&request.url),
        Method::Post => Request::post(&request.url),
        Method::Put => Request::put(&request.url),
        Method::Delete => Request::delete(&request.url),
    };
    for (name, value) in &request.headers {
        builder = builder.header(name, value);
    }
    let built = match &request.body {
        Some(body) => {
            let raw = serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))?;
            builder.body(raw)
        }
        None => builder.build(),
    }
    .map_err(|e| ApiError::Transport(e.to_string()))?;

    let response = built.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
    Ok(HttpResponse { status, body })
}

#[async_trait::async_trait(?Send)]
impl Transport for GlooTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        #[cfg(feature = "csr")]
        {
            use futures::future::{Either, select};

            let secs = request.timeout.as_secs();
            let timer = gloo_timers::future::TimeoutFuture::new(timeout_millis(request.timeout));
            match select(Box::pin(fetch(request)), Box::pin(timer)).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => Err(ApiError::Timeout { secs }),
            }
        }
        #[cfg(not(feature = "csr"))]
        {
            let _ = request;
            Err(ApiError::Transport("browser transport requires the csr feature".to_owned()))
        }
    }
}
