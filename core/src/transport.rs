//! The seam between `Client` and the network.
//!
//! # Design
//! A `Transport` opens `Session`s; a session owns whatever pooled connection
//! state the HTTP stack keeps and stamps the client's default headers onto
//! every request. `Client` never talks to reqwest directly, so tests can
//! substitute a scripted transport and count how many sessions were opened.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// A reusable handle for issuing requests with shared default headers.
#[async_trait]
pub trait Session: Send + Sync + 'static {
    /// Perform one exchange. Non-2xx statuses are returned as data, not errors.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;

    fn is_closed(&self) -> bool;

    /// Mark the session closed. Later `send` calls fail with `SessionClosed`.
    fn close(&self);
}

/// Factory for sessions.
pub trait Transport: Send + Sync + 'static {
    type Session: Session;

    fn open(&self, default_headers: &[(String, String)]) -> Result<Self::Session>;
}

/// Transport backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    connect_timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            connect_timeout: config.connect_timeout,
        }
    }
}

impl Transport for ReqwestTransport {
    type Session = ReqwestSession;

    fn open(&self, default_headers: &[(String, String)]) -> Result<ReqwestSession> {
        let mut headers = HeaderMap::new();
        for (name, value) in default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ApiError::InvalidHeader(format!("{name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ApiError::InvalidHeader(format!("{name}: {e}")))?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(self.connect_timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        Ok(ReqwestSession {
            client,
            closed: AtomicBool::new(false),
        })
    }
}

/// Session wrapping a pooled `reqwest::Client`.
#[derive(Debug)]
pub struct ReqwestSession {
    client: reqwest::Client,
    closed: AtomicBool,
}

#[async_trait]
impl Session for ReqwestSession {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        if self.is_closed() {
            return Err(ApiError::SessionClosed);
        }

        let response = self
            .client
            .request(to_reqwest_method(request.method), &request.url)
            .query(&request.query)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(map_reqwest_error)?;
        Ok(HttpResponse { status, body })
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

fn to_reqwest_method(method: HttpMethod) -> reqwest::Method {
    match method {
        HttpMethod::Get => reqwest::Method::GET,
        HttpMethod::Post => reqwest::Method::POST,
        HttpMethod::Put => reqwest::Method::PUT,
        HttpMethod::Delete => reqwest::Method::DELETE,
    }
}

fn map_reqwest_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}
