//! Scripted transport and fixtures shared by the unit tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::http::HttpClient;
use crate::token::{MemoryTokenStore, TokenStore};
use crate::transport::{HttpRequest, HttpResponse, Transport};

struct Scripted {
    gate: Option<Arc<Notify>>,
    result: Result<HttpResponse, ApiError>,
}

/// Transport answering from a FIFO script and recording every request.
#[derive(Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, gate: Option<Arc<Notify>>, result: Result<HttpResponse, ApiError>) {
        self.script.lock().unwrap().push_back(Scripted { gate, result });
    }

    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push(None, Ok(HttpResponse { status, body: body.to_string() }));
    }

    pub fn push_raw(&self, status: u16, body: &str) {
        self.push(None, Ok(HttpResponse { status, body: body.to_owned() }));
    }

    pub fn push_error(&self, error: ApiError) {
        self.push(None, Err(error));
    }

    /// Queue a response that is held back until the returned gate is notified.
    pub fn push_gated_json(&self, status: u16, body: serde_json::Value) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.push(Some(Arc::clone(&gate)), Ok(HttpResponse { status, body: body.to_string() }));
        gate
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests.lock().unwrap().last().cloned().expect("no request recorded")
    }
}

#[async_trait::async_trait(?Send)]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        let Some(Scripted { gate, result }) = next else {
            return Err(ApiError::Transport("no scripted response".to_owned()));
        };
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }
}

pub const BASE_URL: &str = "http://api.test";

pub fn config() -> ClientConfig {
    ClientConfig { merge_profile: false, ..ClientConfig::with_base_url(BASE_URL) }
}

/// Client wired to a fresh mock transport and memory token store.
pub fn client_with(config: &ClientConfig) -> (HttpClient, Arc<MockTransport>, Arc<MemoryTokenStore>) {
    let transport = MockTransport::new();
    let tokens = Arc::new(MemoryTokenStore::new());
    let client = HttpClient::new(
        config,
        Arc::clone(&transport) as Arc<dyn Transport>,
        Arc::clone(&tokens) as Arc<dyn TokenStore>,
    );
    (client, transport, tokens)
}

pub fn user_json(id: &str, email: &str) -> serde_json::Value {
    serde_json::json!({ "id": id, "email": email })
}
