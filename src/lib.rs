//! `outbound-http` is an async client for calling remote HTTP APIs reliably.
//!
//! It wraps [`reqwest`] with:
//! - shared defaults (base URL, headers, whole-call timeout) via [`ClientBuilder`]
//! - verb helpers ([`HttpClient::get`], [`HttpClient::post`], ...) and JSON
//!   helpers ([`HttpClient::get_json`], [`HttpClient::post_json`], ...)
//! - a single retry loop with capped exponential backoff ([`RetryPolicy`])
//! - per-call cancellation and deadlines through [`CallContext`]

mod client;
mod context;
mod decode;
mod dispatch;
mod error;
mod options;
mod response;
mod retry;
mod types;

pub use client::HttpClient;
pub use context::CallContext;
pub use error::{CancelReason, HttpError};
pub use options::{ClientBuilder, ClientConfig, DEFAULT_TIMEOUT};
pub use response::Response;
pub use retry::{default_retryable, Outcome, RetryPolicy, RetryPredicate};
pub use types::{Envelope, Headers};

pub use reqwest::{Method, StatusCode};
pub use tokio_util::sync::CancellationToken;

pub type Result<T> = std::result::Result<T, HttpError>;
