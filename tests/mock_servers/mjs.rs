//! Mock MJS backend for testing
//!
//! Serves canned bodies for GET requests, records every request it receives and keeps a
//! playback status that POST /status updates. The same server also hosts media objects
//! for the resolver under /objects/.

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// One request as seen by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

struct MockMjsState {
    status: String,
    responses: HashMap<String, String>,
    requests: Vec<Recorded>,
}

pub struct MockMjsServer {
    addr: SocketAddr,
    state: Arc<RwLock<MockMjsState>>,
    handle: JoinHandle<()>,
}

impl MockMjsServer {
    /// Start a mock backend on a random port
    pub async fn start() -> Self {
        let state = Arc::new(RwLock::new(MockMjsState {
            status: "stopped".to_string(),
            responses: HashMap::new(),
            requests: Vec::new(),
        }));

        let app = Router::new().fallback(handle_any).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state, handle }
    }

    /// Base URL as configured in the player registry
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn object_url(&self, id: &str) -> String {
        format!("http://{}/objects/{}", self.addr, id)
    }

    /// Serve `body` verbatim for GET `path` (leading slash included)
    pub async fn respond(&self, path: &str, body: &str) {
        let mut state = self.state.write().await;
        state.responses.insert(path.to_string(), body.to_string());
    }

    pub async fn respond_json(&self, path: &str, body: Value) {
        self.respond(path, &body.to_string()).await;
    }

    pub async fn set_status(&self, status: &str) {
        self.state.write().await.status = status.to_string();
    }

    pub async fn requests(&self) -> Vec<Recorded> {
        self.state.read().await.requests.clone()
    }

    /// Requests other than GET
    pub async fn writes(&self) -> Vec<Recorded> {
        self.requests().await.into_iter().filter(|r| r.method != "GET").collect()
    }

    pub async fn clear_requests(&self) {
        self.state.write().await.requests.clear();
    }

    pub async fn stop(self) {
        self.handle.abort();
    }
}

async fn handle_any(
    State(state): State<Arc<RwLock<MockMjsState>>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> impl IntoResponse {
    let path = uri.path().to_string();
    let body = String::from_utf8_lossy(&body).to_string();
    let mut state = state.write().await;
    state.requests.push(Recorded { method: method.to_string(), path: path.clone(), body: body.clone() });

    if method == Method::POST && path == "/status" {
        if let Some(s) = serde_json::from_str::<Value>(&body).ok().and_then(|v| v["status"].as_str().map(String::from)) {
            if ["playing", "stopped", "paused"].contains(&s.as_str()) {
                state.status = s;
            }
        }
    }

    if method != Method::GET {
        return (StatusCode::OK, json!({ "ok": true }).to_string());
    }
    if let Some(canned) = state.responses.get(&path) {
        return (StatusCode::OK, canned.clone());
    }
    if path == "/status" {
        return (StatusCode::OK, json!({ "status": state.status }).to_string());
    }
    (StatusCode::NOT_FOUND, String::new())
}
