//! Error types for the blorp API client.
//!
//! # Design
//! One enum covers every failure a caller can see. Route construction errors
//! (`MissingParameter`, `UnusedParameter`, ...) surface before any I/O.
//! Non-2xx responses land in `Http` with the raw status code and body so the
//! caller can inspect the server's error payload; there is no silent success.

use std::convert::Infallible;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors returned by `Client` and `Route`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport could not complete the exchange (connection refused,
    /// DNS failure, broken pipe).
    #[error("transport failure: {0}")]
    Transport(String),

    /// The request did not complete within its timeout.
    #[error("request timed out")]
    Timeout,

    /// The caller's cancellation signal fired before the response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// A request was sent over a session that had already been closed.
    #[error("session is closed")]
    SessionClosed,

    /// The server answered with a status outside `[200, 300)`.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// A 2xx body was not valid JSON for the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// A template placeholder has no bound value.
    #[error("no value bound for placeholder `{{{0}}}`")]
    MissingParameter(String),

    /// A bound parameter matches no placeholder in the template.
    #[error("parameter `{0}` does not appear in the route template")]
    UnusedParameter(String),

    /// The same parameter name was bound more than once.
    #[error("parameter `{0}` bound more than once")]
    DuplicateParameter(String),

    /// The template itself is malformed.
    #[error("invalid route template `{0}`")]
    InvalidTemplate(String),

    /// A move direction outside `UP`, `DOWN`, `RIGHT`, `LEFT`.
    #[error("invalid direction `{0}`, expected one of UP, DOWN, RIGHT, LEFT")]
    InvalidDirection(String),

    /// A default header could not be encoded (e.g. a token containing a newline).
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// HTTP status carried by the error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

impl From<Infallible> for ApiError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}
