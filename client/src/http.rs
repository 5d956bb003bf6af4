use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, HeaderValue};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use uuid::Uuid;

use shared::types::{ApiConfig, ErrorResponse};

use crate::error::{ClientError, FALLBACK_MESSAGE};

/// Supplies the bearer token and hears about auth rejections.
///
/// Implemented by the session store; the wrapper never owns session state.
pub trait TokenSource: Send + Sync {
    fn bearer_token(&self) -> Option<String>;

    /// Called when a request that carried `token` came back 401/403.
    /// Only that token is revoked; a newer session is left alone.
    fn reject(&self, status: StatusCode, token: &str);
}

// ---------------------------------------------------------------------------
// Request description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum RequestBody {
    Empty,
    Json(Bytes),
    Multipart(Multipart),
}

/// Everything needed to issue one call against the backend.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    method: Method,
    path: String,
    body: RequestBody,
    headers: Vec<(HeaderName, HeaderValue)>,
    with_auth: bool,
}

impl RequestOptions {
    /// `path` is relative to the configured base URL and may carry a query.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            with_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        let bytes = serde_json::to_vec(body).map_err(|e| ClientError::Application {
            status: None,
            message: format!("Failed to serialize request body: {}", e),
        })?;
        self.body = RequestBody::Json(Bytes::from(bytes));
        Ok(self)
    }

    /// The form sets its own `Content-Type` with the boundary.
    pub fn multipart(mut self, form: Multipart) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Replaces the default header of the same name. An `Authorization`
    /// header here also stops the session token from being attached.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.push((name, value));
        self
    }

    /// Never attach the bearer token, even when a session exists.
    pub fn without_auth(mut self) -> Self {
        self.with_auth = false;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The path without its query string. Safe to log: login credentials
    /// travel in the query.
    pub fn route(&self) -> &str {
        self.path.split('?').next().unwrap_or(&self.path)
    }

    fn overrides(&self, name: &HeaderName) -> bool {
        self.headers.iter().any(|(n, _)| n == name)
    }
}

// ---------------------------------------------------------------------------
// Multipart bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

/// A `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct Multipart {
    boundary: String,
    parts: Vec<Part>,
}

impl Multipart {
    pub fn new() -> Self {
        Self {
            boundary: format!("chunaav-{}", Uuid::new_v4().simple()),
            parts: Vec::new(),
        }
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            data: Bytes::copy_from_slice(value.as_bytes()),
        });
        self
    }

    pub fn file(
        mut self,
        name: &str,
        file_name: &str,
        content_type: &str,
        data: impl Into<Bytes>,
    ) -> Self {
        self.parts.push(Part {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            content_type: Some(content_type.to_string()),
            data: data.into(),
        });
        self
    }

    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    pub fn encode(&self) -> Bytes {
        let mut out = BytesMut::new();
        for part in &self.parts {
            out.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            let mut disposition =
                format!("Content-Disposition: form-data; name=\"{}\"", quote(&part.name));
            if let Some(file_name) = &part.file_name {
                disposition.push_str(&format!("; filename=\"{}\"", quote(file_name)));
            }
            out.put_slice(disposition.as_bytes());
            out.put_slice(b"\r\n");
            if let Some(content_type) = &part.content_type {
                out.put_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
            }
            out.put_slice(b"\r\n");
            out.put_slice(&part.data);
            out.put_slice(b"\r\n");
        }
        out.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        out.freeze()
    }
}

impl Default for Multipart {
    fn default() -> Self {
        Self::new()
    }
}

/// Header parameter values cannot carry quotes or line breaks.
fn quote(value: &str) -> String {
    value
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .map(|c| if c == '"' { '\'' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

type Connector = HttpsConnector<HttpConnector>;

/// Thin wrapper over a pooled hyper client that speaks the backend's JSON
/// conventions.
#[derive(Clone)]
pub struct HttpClient {
    inner: Client<Connector, Full<Bytes>>,
    base_url: Arc<str>,
    timeout: Duration,
    tokens: Option<Arc<dyn TokenSource>>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("has_token_source", &self.tokens.is_some())
            .finish()
    }
}

impl HttpClient {
    pub fn new(config: &ApiConfig) -> Self {
        let https = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .build();

        Self {
            inner: Client::builder(TokioExecutor::new()).build(https),
            base_url: Arc::from(config.resolved_base_url()),
            timeout: config.timeout(),
            tokens: None,
        }
    }

    pub fn with_token_source(mut self, tokens: Arc<dyn TokenSource>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Issue the request and decode a 2xx body as `T`.
    ///
    /// An empty 2xx body decodes as JSON `null`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        options: RequestOptions,
    ) -> Result<T, ClientError> {
        let body = self.send(&options).await?;
        decode(options.route(), &body)
    }

    /// Build the hyper request. Returns it with the token it carries.
    ///
    /// Defaults (`Accept`, `Content-Type`, `Authorization`) are skipped when
    /// the caller supplied the same header.
    fn build(
        &self,
        options: &RequestOptions,
    ) -> Result<(Request<Full<Bytes>>, Option<String>), ClientError> {
        let route = options.route();
        let uri: Uri = self.url(&options.path).parse().map_err(|e| {
            warn!(route = %route, "Invalid request URL: {}", e);
            ClientError::transport()
        })?;

        let mut builder = Request::builder().method(options.method.clone()).uri(uri);

        if !options.overrides(&ACCEPT) {
            builder = builder.header(ACCEPT, "application/json");
        }

        let body = match &options.body {
            RequestBody::Empty => Bytes::new(),
            RequestBody::Json(bytes) => bytes.clone(),
            RequestBody::Multipart(form) => form.encode(),
        };

        if !options.overrides(&CONTENT_TYPE) {
            builder = match &options.body {
                RequestBody::Multipart(form) => builder.header(CONTENT_TYPE, form.content_type()),
                _ => builder.header(CONTENT_TYPE, "application/json"),
            };
        }

        let token = if options.with_auth && !options.overrides(&AUTHORIZATION) {
            self.tokens.as_ref().and_then(|t| t.bearer_token())
        } else {
            None
        };
        if let Some(token) = &token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        for (name, value) in &options.headers {
            builder = builder.header(name.clone(), value.clone());
        }

        let request = builder.body(Full::new(body)).map_err(|e| {
            warn!(route = %route, "Failed to build request: {}", e);
            ClientError::transport()
        })?;
        Ok((request, token))
    }

    async fn send(&self, options: &RequestOptions) -> Result<Bytes, ClientError> {
        let route = options.route();
        let (request, token) = self.build(options)?;

        debug!(method = %options.method, route = %route, "Sending request");

        let exchange = async {
            let response = self.inner.request(request).await?;
            let status = response.status();
            let body = response.into_body().collect().await?.to_bytes();
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>((status, body))
        };

        let (status, body) = match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok(pair)) => pair,
            Ok(Err(e)) => {
                warn!(route = %route, "Request failed: {}", e);
                return Err(ClientError::transport());
            }
            Err(_) => {
                warn!(route = %route, "Request timed out after {:?}", self.timeout);
                return Err(ClientError::transport());
            }
        };

        if status.is_success() {
            debug!(route = %route, status = status.as_u16(), "Request succeeded");
            return Ok(body);
        }

        let err = error_from_response(status, &body);
        warn!(route = %route, status = status.as_u16(), "Request rejected: {}", err);

        if err.is_auth() {
            if let (Some(tokens), Some(token)) = (&self.tokens, &token) {
                tokens.reject(status, token);
            }
        }

        Err(err)
    }
}

// ---------------------------------------------------------------------------
// Response handling
// ---------------------------------------------------------------------------

fn decode<T: DeserializeOwned>(route: &str, body: &[u8]) -> Result<T, ClientError> {
    let body = body.trim_ascii();
    let result = if body.is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    result.map_err(|e| ClientError::unexpected_shape(route, e))
}

fn error_from_response(status: StatusCode, body: &[u8]) -> ClientError {
    let parsed: Option<ErrorResponse> = serde_json::from_slice(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|e| e.message())
        .map(str::to_string);
    let code = Some(status.as_u16());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return ClientError::Authentication {
            status: code,
            message: message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()),
        };
    }

    match (parsed, message) {
        (_, Some(message)) => ClientError::Application {
            status: code,
            message,
        },
        (Some(_), None) => ClientError::Application {
            status: code,
            message: FALLBACK_MESSAGE.to_string(),
        },
        (None, None) => ClientError::transport(),
    }
}
