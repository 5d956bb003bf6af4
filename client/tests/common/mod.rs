//! A local HTTP/1 backend for integration tests.
//!
//! Every request is recorded; replies come from a synchronous handler so
//! each test can script the backend inline.
#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{HeaderMap, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioIo, TokioTimer};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use client::Client;
use client::storage::{KeyValueStore, MemoryStorage};
use shared::types::{ApiConfig, ClientConfig};

pub const TOKEN: &str = "srv-token-1";
pub const ACTIVATION_CODE: &str = "AC-2024";

// ---------------------------------------------------------------------------
// Recorded requests and scripted replies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Recorded {
    pub fn param(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }
}

#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub body: String,
    pub delay: Duration,
}

impl Reply {
    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, &body.to_string())
    }

    pub fn ok(body: Value) -> Self {
        Self::json(200, body)
    }

    pub fn raw(status: u16, body: &str) -> Self {
        Self {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: body.to_string(),
            delay: Duration::ZERO,
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = Arc<dyn Fn(&Recorded) -> Reply + Send + Sync>;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

pub struct TestServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start<F>(handler: F) -> Result<Self>
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind test listener")?;
        let addr = listener.local_addr().context("No local address")?;
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Handler = Arc::new(handler);

        let log = requests.clone();
        let task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let io = TokioIo::new(stream);
                let handler = handler.clone();
                let log = log.clone();
                tokio::task::spawn(async move {
                    let service = service_fn(move |req| handle(req, handler.clone(), log.clone()));
                    let _ = http1::Builder::new()
                        .timer(TokioTimer::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        Ok(Self {
            addr,
            requests,
            task,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|r| r.path == path).count()
    }

    pub fn last(&self, path: &str) -> Option<Recorded> {
        self.requests().into_iter().rev().find(|r| r.path == path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    req: Request<Incoming>,
    handler: Handler,
    log: Arc<Mutex<Vec<Recorded>>>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let (parts, body) = req.into_parts();
    let body = body
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .unwrap_or_default();

    let recorded = Recorded {
        method: parts.method,
        path: parts.uri.path().to_string(),
        query: parts.uri.query().map(str::to_string),
        headers: parts.headers,
        body,
    };
    log.lock().unwrap().push(recorded.clone());

    let reply = handler(&recorded);
    if !reply.delay.is_zero() {
        tokio::time::sleep(reply.delay).await;
    }

    let mut response = Response::new(Full::new(Bytes::from(reply.body)));
    *response.status_mut() = reply.status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn config_for(server: &TestServer) -> ClientConfig {
    let mut api = ApiConfig::new(&server.base_url());
    api.timeout_secs = 2;
    api.presearch_page_size = 50;
    ClientConfig::new(api)
}

pub fn client_for(server: &TestServer) -> (Client, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store: Arc<dyn KeyValueStore> = storage.clone();
    (Client::new(&config_for(server), store), storage)
}

/// A successful `/auth/login` body.
pub fn login_body() -> Value {
    json!({
        "role": "CANDIDATE_ADMIN",
        "activationCode": ACTIVATION_CODE,
        "token": TOKEN,
        "username": "asha",
        "name": "Asha Patil"
    })
}

/// Accepts password `secret` and rejects everything else.
pub fn login_reply(req: &Recorded) -> Reply {
    if req.param("password").as_deref() == Some("secret") {
        Reply::ok(login_body())
    } else {
        Reply::json(401, json!({ "message": "Invalid credentials" }))
    }
}

pub fn voters() -> Value {
    json!([
        {
            "id": 1, "name": "priya sharma", "age": 29, "gender": "Female",
            "voterIdNumber": "MH/01/001", "houseNo": "", "relatedTo": "ramesh",
            "city": "Pune", "boothNo": 12, "boothAddress": "Govt School",
            "mobile": "9876543210", "isPrint": true
        },
        {
            "id": 2, "name": "rahul verma", "age": 41, "gender": "Male",
            "voterIdNumber": "MH/01/002", "houseNo": "A-123", "relatedTo": "suresh",
            "city": "Pune", "boothNo": "12", "boothAddress": "Govt School",
            "mobile": "", "isPrint": false
        }
    ])
}

pub async fn signed_in(server: &TestServer) -> Result<(Client, Arc<MemoryStorage>)> {
    let (client, storage) = client_for(server);
    client
        .login("asha", "secret", ACTIVATION_CODE)
        .await
        .context("login against test server failed")?;
    Ok((client, storage))
}
