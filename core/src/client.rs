//! Session-authenticated client for the game-board API.
//!
//! # Design
//! `Client` owns one lazily opened `Session` behind a `tokio::sync::Mutex`.
//! The first request opens it; later requests clone the cached `Arc`. The
//! lock is only held while checking or replacing the cached session, never
//! across the network exchange, so concurrent requests still run in parallel
//! while concurrent first calls agree on a single session.
//!
//! Every endpoint builds a `Route` and delegates to `request`, which maps
//! 2xx bodies to JSON and everything else to `ApiError::Http`.

use std::fmt;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::route::Route;
use crate::transport::{ReqwestTransport, Session, Transport};
use crate::types::{Direction, UserId};

/// Name of the header carrying `<user_id>.<token>`.
pub const AUTH_HEADER: &str = "Authentication";

/// Per-request query parameters and timeout override.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    query: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(mut self, name: &str, value: impl Display) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    /// Replace the configured request timeout for this call only.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Async client for the game-board API.
pub struct Client<T: Transport = ReqwestTransport> {
    config: ClientConfig,
    transport: T,
    auth_token: String,
    default_headers: Vec<(String, String)>,
    session: Mutex<Option<Arc<T::Session>>>,
}

impl Client {
    /// Client against the default base URL. Opens no connection.
    pub fn new(user_id: UserId, token: &str) -> Self {
        Self::with_config(user_id, token, ClientConfig::default())
    }

    pub fn with_config(user_id: UserId, token: &str, config: ClientConfig) -> Self {
        let transport = ReqwestTransport::new(&config);
        Self::with_transport(user_id, token, config, transport)
    }
}

impl<T: Transport> Client<T> {
    pub fn with_transport(user_id: UserId, token: &str, config: ClientConfig, transport: T) -> Self {
        let auth_token = format!("{user_id}.{token}");
        let default_headers = vec![(AUTH_HEADER.to_string(), auth_token.clone())];
        Self {
            config,
            transport,
            auth_token,
            default_headers,
            session: Mutex::new(None),
        }
    }

    pub fn auth_token(&self) -> &str {
        &self.auth_token
    }

    /// Headers stamped onto every request by the session.
    pub fn default_headers(&self) -> &[(String, String)] {
        &self.default_headers
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether a session is cached and still open.
    pub async fn is_connected(&self) -> bool {
        self.session
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| !session.is_closed())
    }

    /// Close and forget the cached session. The next request opens a new one.
    pub async fn close(&self) {
        if let Some(session) = self.session.lock().await.take() {
            session.close();
            tracing::debug!("session closed");
        }
    }

    /// Return the cached session, opening a new one if absent or closed.
    async fn session(&self) -> Result<Arc<T::Session>> {
        let mut slot = self.session.lock().await;
        if let Some(session) = slot.as_ref().filter(|s| !s.is_closed()) {
            return Ok(Arc::clone(session));
        }

        tracing::debug!(base_url = %self.config.base_url, "opening session");
        let session = Arc::new(self.transport.open(&self.default_headers)?);
        *slot = Some(Arc::clone(&session));
        Ok(session)
    }

    /// Send `route` with the given query pairs and return the JSON body.
    pub async fn request(&self, route: &Route, query: &[(&str, &str)]) -> Result<Value> {
        let options = query
            .iter()
            .fold(RequestOptions::new(), |options, (name, value)| options.query(name, value));
        self.request_with(route, options).await
    }

    pub async fn request_with(&self, route: &Route, options: RequestOptions) -> Result<Value> {
        self.request_as(route, options).await
    }

    /// Like `request_with`, deserializing the body into `D`.
    pub async fn request_as<D: DeserializeOwned>(&self, route: &Route, options: RequestOptions) -> Result<D> {
        let session = self.session().await?;
        let request = HttpRequest {
            method: route.method(),
            url: format!("{}{}", self.config.base_url, route.path()),
            query: options.query,
        };
        let timeout = options.timeout.unwrap_or(self.config.request_timeout);

        tracing::debug!(method = %request.method, path = route.path(), "dispatching request");
        let response = tokio::time::timeout(timeout, session.send(request))
            .await
            .map_err(|_| ApiError::Timeout)??;
        tracing::trace!(status = response.status, path = route.path(), "response received");

        parse_response(response)
    }

    /// Race the request against `cancel`. If `cancel` finishes first the
    /// in-flight exchange is dropped and `ApiError::Cancelled` returned.
    pub async fn request_until<F>(&self, route: &Route, options: RequestOptions, cancel: F) -> Result<Value>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.request_with(route, options) => result,
            () = cancel => {
                tracing::debug!(path = route.path(), "request cancelled");
                Err(ApiError::Cancelled)
            }
        }
    }

    pub async fn get_current_user(&self) -> Result<Value> {
        self.request(&Route::new(HttpMethod::Get, "/user/@me")?, &[]).await
    }

    pub async fn get_all_users(&self) -> Result<Value> {
        self.request(&Route::new(HttpMethod::Get, "/user/all")?, &[]).await
    }

    pub async fn get_user(&self, user_id: UserId) -> Result<Value> {
        let route = Route::get("/user/{user_id}").param("user_id", user_id).build()?;
        self.request(&route, &[]).await
    }

    /// Move one cell. Accepts a `Direction` or its wire name; an unknown
    /// name fails before a session is opened.
    pub async fn move_player<D>(&self, direction: D) -> Result<Value>
    where
        D: TryInto<Direction>,
        D::Error: Into<ApiError>,
    {
        let direction = direction.try_into().map_err(Into::into)?;
        let route = Route::post("/board/move/{direction}").param("direction", direction).build()?;
        self.request(&route, &[]).await
    }

    pub async fn dig(&self) -> Result<Value> {
        self.request(&Route::new(HttpMethod::Post, "/board/dig")?, &[]).await
    }

    pub async fn attack(&self, user_id: UserId) -> Result<Value> {
        let route = Route::post("/user/{user_id}/attack").param("user_id", user_id).build()?;
        self.request(&route, &[]).await
    }

    pub async fn gift(&self, user_id: UserId) -> Result<Value> {
        let route = Route::post("/user/{user_id}/gift").param("user_id", user_id).build()?;
        self.request(&route, &[]).await
    }

    pub async fn get_board(&self) -> Result<Value> {
        self.request(&Route::new(HttpMethod::Get, "/board")?, &[]).await
    }
}

impl<T: Transport> fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.config.base_url)
            .field("auth_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

/// Map a response to `D`, or to `ApiError::Http` outside `[200, 300)`.
/// An empty 2xx body is read as JSON `null`.
fn parse_response<D: DeserializeOwned>(response: HttpResponse) -> Result<D> {
    if !response.is_success() {
        return Err(ApiError::Http {
            status: response.status,
            body: response.body,
        });
    }
    let body = if response.body.trim().is_empty() { "null" } else { response.body.as_str() };
    Ok(serde_json::from_str(body)?)
}
