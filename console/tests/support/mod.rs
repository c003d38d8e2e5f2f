//! Shared helpers for console integration tests.
//!
//! Integration tests compile as separate crates, so the scripted transport and
//! pipeline wiring live here instead of being repeated per suite.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chatbot_console::domain::ports::{
    HttpTransport, InMemoryKeyValueStore, KeyValueStore, TransportError, TransportRequest,
    TransportResponse,
};
use chatbot_console::domain::{
    DispatcherConfig, RequestDispatcher, SessionContext, SessionEvent, TOKEN_KEY,
};
use serde_json::Value;
use tokio::sync::broadcast;

pub const BASE_URL: &str = "http://backend.test";
pub const BASE_PATH: &str = "/console";

type Reply = Result<TransportResponse, TransportError>;

/// Transport that replays canned replies in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    replies: Mutex<VecDeque<Reply>>,
    seen: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn replying(status: u16, body: &Value) -> Self {
        Self::default().then(Ok(TransportResponse::json(status, body)))
    }

    pub fn failing(message: &str) -> Self {
        Self::default().then(Err(TransportError::network(message)))
    }

    pub fn then(self, reply: Reply) -> Self {
        self.replies.lock().expect("replies lock").push_back(reply);
        self
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().expect("requests lock").len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.seen.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self.seen.lock().expect("requests lock").push(request);
        self.replies
            .lock()
            .expect("replies lock")
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::network("no scripted reply left")))
    }
}

/// Structurally valid bearer token (`{"alg":"HS256"}` / `{"sub":"42"}`).
pub fn valid_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(br#"{"sub":"42"}"#);
    format!("{header}.{payload}.c2ln")
}

/// A dispatcher wired to a scripted transport and in-memory storage.
pub struct Pipeline {
    pub dispatcher: RequestDispatcher,
    pub transport: Arc<ScriptedTransport>,
    pub storage: Arc<InMemoryKeyValueStore>,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl Pipeline {
    pub fn new(transport: ScriptedTransport, stored: Option<&str>) -> Self {
        let storage = Arc::new(match stored {
            Some(token) => InMemoryKeyValueStore::with_slot(TOKEN_KEY, token),
            None => InMemoryKeyValueStore::default(),
        });
        let transport = Arc::new(transport);
        let session = Arc::new(SessionContext::new());
        let events = session.subscribe();
        let dispatcher = RequestDispatcher::with_session(
            transport.clone(),
            storage.clone(),
            session,
            DispatcherConfig::new(BASE_URL).with_base_path(BASE_PATH),
        );
        Self {
            dispatcher,
            transport,
            storage,
            events,
        }
    }

    pub fn stored_token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).expect("in-memory store never fails")
    }

    /// Redirect targets emitted so far, draining the event queue.
    pub fn redirects(&mut self) -> Vec<String> {
        let mut targets = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            if let SessionEvent::Redirect { target, .. } = event {
                targets.push(target);
            }
        }
        targets
    }
}
