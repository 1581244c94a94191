//! Request/response transport
//!
//! [`ApiTransport`] is the boundary to the backend: one JSON request in, one
//! JSON body (or a classified [`ConsoleError`]) out. [`HttpTransport`] is the
//! reqwest implementation; tests swap in fakes.

use async_trait::async_trait;
use console_core::{message_of, ApiConfig, AuthContext, ConsoleError, Result};
use reqwest::{header, Client};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// HTTP verbs the backend uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// List / fetch
    Get,
    /// Create
    Post,
    /// Full-object update
    Put,
    /// Remove
    Delete,
}

impl Method {
    fn as_reqwest(self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        })
    }
}

/// One backend request
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Verb
    pub method: Method,
    /// Path relative to the base URL, starting with `/`
    pub path: String,
    /// Query parameters in order
    pub query: Vec<(String, String)>,
    /// JSON body for POST/PUT
    pub body: Option<Value>,
}

impl ApiRequest {
    /// GET request
    #[inline]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST request with body
    #[inline]
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Post, path).with_body(body)
    }

    /// PUT request with body
    #[inline]
    pub fn put(path: impl Into<String>, body: Value) -> Self {
        Self::new(Method::Put, path).with_body(body)
    }

    /// DELETE request
    #[inline]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// With query parameters
    #[inline]
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// With body
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Value of a query parameter
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Backend boundary
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiTransport: Send + Sync {
    /// Send a request and return the raw (not yet normalized) JSON body
    ///
    /// # Errors
    /// - `ConsoleError::Network` if the request did not complete
    /// - `ConsoleError::NotFound` on 404
    /// - `ConsoleError::Server` on any other non-2xx status
    async fn send(&self, request: ApiRequest) -> Result<Value>;
}

/// reqwest-backed transport
///
/// Attaches `Authorization: Bearer <token>` from the injected
/// [`AuthContext`] on every request.
pub struct HttpTransport {
    base_url: String,
    client: Client,
    auth: Arc<AuthContext>,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.auth.get().is_some())
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build transport from config
    ///
    /// # Errors
    /// `ConsoleError::Config` if the HTTP client cannot be built
    pub fn new(config: &ApiConfig, auth: Arc<AuthContext>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ConsoleError::Config(format!("building HTTP client: {e}")))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
            auth,
        })
    }

    /// Base URL requests are sent to
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Shared auth context
    #[inline]
    #[must_use]
    pub fn auth(&self) -> &Arc<AuthContext> {
        &self.auth
    }
}

#[async_trait]
impl ApiTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let url = format!("{}{}", self.base_url, request.path);
        tracing::debug!(method = %request.method, %url, "sending request");

        let mut builder = self.client.request(request.method.as_reqwest(), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(bearer) = self.auth.bearer() {
            builder = builder.header(header::AUTHORIZATION, bearer);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| {
            tracing::warn!(method = %request.method, %url, error = %e, "request failed");
            ConsoleError::Network(e.to_string())
        })?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ConsoleError::Network(e.to_string()))?;

        interpret_response(status, &text, &request.path)
    }
}

/// Classify a completed HTTP exchange
///
/// Error bodies may be non-JSON; their text becomes the message.
pub fn interpret_response(status: u16, text: &str, path: &str) -> Result<Value> {
    let parsed = if text.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_json::from_str::<Value>(text)
    };

    if (200..300).contains(&status) {
        return parsed.map_err(|e| ConsoleError::InvalidResponse(format!("{path}: {e}")));
    }

    let message = match &parsed {
        Ok(body) => message_of(body),
        Err(_) => Some(text.trim().to_string()),
    }
    .filter(|m| !m.is_empty());

    if status == 404 {
        return Err(ConsoleError::NotFound(message.unwrap_or_else(|| path.to_string())));
    }

    tracing::warn!(status, path, "server returned an error");
    Err(ConsoleError::Server {
        status,
        message: message.unwrap_or_else(|| format!("request to {path} failed")),
    })
}
