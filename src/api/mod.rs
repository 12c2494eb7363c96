//! REST client for the task-board backend.
//!
//! JSON over HTTP via reqwest. All calls carry a fixed client-side
//! timeout and a bearer token; a 401 triggers exactly one
//! refresh-and-replay (see `session`). There is no automatic retry
//! beyond that single auth replay.
//!
//! Modules:
//! - client: typed endpoint methods
//! - session: token pair persistence + serialized refresh

pub mod client;
pub mod session;

pub use client::ApiClient;
pub use session::Session;

use crate::error::MalformedTaskError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request timed out")]
    Timeout,
    #[error("API error {status}: {message}")]
    Status { status: u16, message: String },
    #[error("session expired; sign in again")]
    AuthExpired,
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("not signed in")]
    NotAuthenticated,
    #[error("malformed record: {0}")]
    Malformed(#[from] MalformedTaskError),
    #[error("invalid API base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    /// True when a plain retry of the same call can plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout => true,
            ApiError::Http(err) => err.is_timeout() || err.is_connect(),
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    /// True when the session is gone and the user must sign in again.
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            ApiError::AuthExpired | ApiError::NotAuthenticated | ApiError::RefreshFailed(_)
        )
    }
}
