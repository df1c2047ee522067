//! In-process HTTP backend for exercising the clients without a network.
//!
//! Routes are matched on method and exact path; every request is recorded so
//! tests can assert on what a client sent (or that it sent nothing).
#![allow(dead_code)]

use std::collections::HashMap;
use std::net::TcpListener;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use serde_json::Value;

#[derive(Clone)]
struct Canned {
    status: StatusCode,
    content_type: &'static str,
    body: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("request body is JSON")
    }

    /// Decoded `application/x-www-form-urlencoded` body.
    pub fn form(&self) -> HashMap<String, String> {
        decode_pairs(&String::from_utf8_lossy(&self.body))
    }

    pub fn query_pairs(&self) -> HashMap<String, String> {
        decode_pairs(self.query.as_deref().unwrap_or(""))
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name).and_then(|v| v.to_str().ok()).map(String::from)
    }
}

fn decode_pairs(encoded: &str) -> HashMap<String, String> {
    let url = reqwest::Url::parse(&format!("http://decode.local/?{}", encoded)).expect("valid query");
    url.query_pairs().into_owned().collect()
}

struct MockState {
    routes: HashMap<(Method, String), Canned>,
    seen: Mutex<Vec<Recorded>>,
}

#[derive(Default)]
pub struct MockBackend {
    routes: HashMap<(Method, String), Canned>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(mut self, method: Method, path: &str, status: StatusCode, body: Value) -> Self {
        self.routes.insert(
            (method, path.to_string()),
            Canned { status, content_type: "application/json", body: body.to_string().into_bytes() },
        );
        self
    }

    pub fn bytes(mut self, method: Method, path: &str, status: StatusCode, body: &[u8]) -> Self {
        self.routes.insert(
            (method, path.to_string()),
            Canned { status, content_type: "image/png", body: body.to_vec() },
        );
        self
    }

    pub async fn start(self) -> RunningMock {
        let state = Arc::new(MockState { routes: self.routes, seen: Mutex::new(Vec::new()) });
        let app = Router::new().fallback(respond).with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").expect("bind mock backend");
        listener.set_nonblocking(true).expect("nonblocking listener");
        let addr = listener.local_addr().expect("mock backend address");
        let server = axum::Server::from_tcp(listener)
            .expect("mock backend server")
            .serve(app.into_make_service());
        tokio::spawn(async move {
            let _ = server.await;
        });

        RunningMock { base_url: format!("http://{}", addr), state }
    }
}

pub struct RunningMock {
    pub base_url: String,
    state: Arc<MockState>,
}

impl RunningMock {
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.seen.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.path == path).collect()
    }
}

async fn respond(
    State(state): State<Arc<MockState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.seen.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(String::from),
        headers,
        body: body.to_vec(),
    });

    match state.routes.get(&(method, uri.path().to_string())) {
        Some(canned) => (
            canned.status,
            [(header::CONTENT_TYPE, canned.content_type)],
            canned.body.clone(),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "no canned response").into_response(),
    }
}
