use std::time::Duration;

use thiserror::Error;

/// Errors that can arise when calling an OpenAI-compatible API.
#[derive(Debug, Error)]
pub enum OpenAIError {
    /// Transport failure, including timeouts.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// HTTP 429.
    #[error("rate limited: {message}")]
    RateLimit {
        /// Body of the error response.
        message: String,
        /// Value of the `Retry-After` header, if present.
        retry_after: Option<Duration>,
    },
    /// HTTP 5xx.
    #[error("server error {status}: {message}")]
    Server {
        /// Status code.
        status: u16,
        /// Body of the error response.
        message: String,
    },
    /// Any other non-success status, such as a bad request or a rejected key.
    #[error("API error {status}: {message}")]
    Status {
        /// Status code.
        status: u16,
        /// Body of the error response.
        message: String,
    },
    /// Response body did not have the expected shape.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A successful response without the requested content.
    #[error("{0}")]
    Api(String),
}

impl OpenAIError {
    /// Whether repeating the same request may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::RateLimit { .. } | Self::Server { .. } => true,
            Self::Status { .. } | Self::Json(_) | Self::Api(_) => false,
        }
    }

    pub(crate) fn from_status(status: u16, message: String, retry_after: Option<Duration>) -> Self {
        match status {
            429 => Self::RateLimit {
                message,
                retry_after,
            },
            500..=599 => Self::Server { status, message },
            _ => Self::Status { status, message },
        }
    }
}
