//! Test doubles shared by the unit tests.

use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::client::ApiClient;
use crate::session::SessionContext;
use crate::storage::MemoryCredentialStore;
use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, status: u16, body: Value) -> &Self {
        self.reply_raw(status, &body.to_string())
    }

    pub fn reply_raw(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub fn fail(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| {
                let path = r.url.trim_start_matches(BASE_URL);
                format!("{} {}", r.method, path)
            })
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no scripted response left".to_string())))
    }
}

pub const BASE_URL: &str = "http://roadmap.test";

pub struct Harness {
    pub transport: Arc<ScriptedTransport>,
    pub store: Arc<MemoryCredentialStore>,
    pub ctx: SessionContext,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(MemoryCredentialStore::new())
    }

    pub fn logged_in() -> Self {
        let store = MemoryCredentialStore::new();
        crate::storage::CredentialStore::set_token(&store, "token-123").unwrap();
        crate::storage::CredentialStore::set_user(&store, &crate::types::fixtures::user())
            .unwrap();
        Self::with_store(store)
    }

    fn with_store(store: MemoryCredentialStore) -> Self {
        let transport = ScriptedTransport::new();
        let store = Arc::new(store);
        let client = ApiClient::new(BASE_URL, transport.clone(), store.clone());
        Self {
            transport,
            store,
            ctx: SessionContext::new(client),
        }
    }
}
