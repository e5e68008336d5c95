use std::fmt;

use reqwest::StatusCode;

/// Why a call stopped before producing an outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CancelReason {
    /// The caller's cancellation token fired.
    Cancelled,
    /// The call deadline elapsed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled => f.write_str("cancelled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Request body could not be encoded as JSON. Never retried.
    #[error("serialize request body: {0}")]
    Serialization(#[source] serde_json::Error),
    /// Network or connection failure from `reqwest`.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
    /// The call's cancellation token or deadline fired.
    #[error("call {0}")]
    Cancelled(CancelReason),
    /// Non-success HTTP status code with raw response body.
    #[error("http error {status}: {body}")]
    Status { status: u16, body: String },
    /// Response body could not be decoded into the target type.
    #[error("decode error: {message}; body: {body}")]
    Decode { message: String, body: String },
    /// Every attempt failed at the transport level.
    #[error("request failed after {attempts} attempts: {source}")]
    RetryExhausted {
        /// Total attempts made, including the first one.
        attempts: usize,
        #[source]
        source: reqwest::Error,
    },
    /// URL, method or header could not be turned into a request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Builder input was rejected.
    #[error("invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl HttpError {
    /// Returns `true` for cancellation and deadline failures.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }

    /// Returns `true` when no response was obtained from the network.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RetryExhausted { .. })
    }

    /// HTTP status carried by a [`HttpError::Status`] error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => StatusCode::from_u16(*status).ok(),
            _ => None,
        }
    }

    /// Raw response body carried by status and decode errors.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } | Self::Decode { body, .. } => Some(body),
            _ => None,
        }
    }
}
