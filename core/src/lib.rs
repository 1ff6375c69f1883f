//! Async client for the blorp game-board HTTP API.
//!
//! # Overview
//! Every call is described by a `Route` (method plus percent-encoded path)
//! and dispatched by `Client::request` over a lazily opened, authenticated
//! session. Responses in `[200, 300)` come back as `serde_json::Value`;
//! anything else is an `ApiError::Http` carrying the status and body.
//!
//! # Design
//! - `Route` validates its template at construction: unbound placeholders
//!   and unused parameters are errors before any I/O happens.
//! - `Client` holds one session behind a mutex, so concurrent first calls
//!   share a single session. `Client::close` tears it down explicitly.
//! - The network sits behind the `Transport`/`Session` traits; the default
//!   `ReqwestTransport` uses a pooled `reqwest::Client`.
//!
//! ```rust,no_run
//! # async fn example() -> blorp::Result<()> {
//! use blorp::{Client, Direction};
//!
//! let client = Client::new(123, "secret");
//! let board = client.get_board().await?;
//! client.move_player(Direction::Up).await?;
//! println!("{board}");
//! client.close().await;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod route;
pub mod transport;
pub mod types;

pub use client::{Client, RequestOptions, AUTH_HEADER};
pub use config::ClientConfig;
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use route::{Route, RouteBuilder};
pub use transport::{ReqwestSession, ReqwestTransport, Session, Transport};
pub use types::{Direction, UserId};
