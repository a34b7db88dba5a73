/*
[INPUT]:  Error sources (transport, backend responses, storage, serialization)
[OUTPUT]: Structured error types with user-facing messages
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::types::TaskStatus;

/// Message used when an error body carries neither `detail` nor `error`.
pub const GENERIC_FAILURE_MESSAGE: &str = "request failed";

/// Main error type for the dubbing adapter
#[derive(Error, Debug)]
pub enum VdubError {
    /// Backend refused to issue an upload descriptor
    #[error("failed to obtain upload signature: {message}")]
    Presign { message: String },

    /// Direct storage submission failed
    #[error("upload to storage failed: {message}")]
    Upload {
        status: Option<u16>,
        message: String,
    },

    /// Backend rejected task registration after a successful upload
    #[error("failed to create task: {message}")]
    TaskCreate { message: String },

    /// Request never produced a response
    #[error("unable to reach the backend, check that the backend service is running")]
    Network(#[source] reqwest::Error),

    /// Backend returned a non-success response
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Download links requested before the task completed
    #[error("task result not available while status is {status}")]
    ResultNotReady { status: TaskStatus },

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Local file access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Extract the human-readable message from a non-success response body.
///
/// Prefers a string `detail`, then a string `error`, then the generic fallback.
pub fn extract_error_message(body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    [parsed.detail, parsed.error]
        .into_iter()
        .flatten()
        .find_map(|value| match value {
            serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        })
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

impl VdubError {
    /// Check if the error is transient from the caller's point of view
    pub fn is_retryable(&self) -> bool {
        match self {
            VdubError::Network(_) => true,
            VdubError::Api { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// True when no response was received at all
    pub fn is_network(&self) -> bool {
        matches!(self, VdubError::Network(_))
    }

    /// HTTP status carried by the error, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            VdubError::Api { status, .. } => Some(*status),
            VdubError::Upload { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(StatusCode::NOT_FOUND.as_u16())
    }

    /// Create an API error from status code and response body
    pub fn api_error(status: StatusCode, body: &str) -> Self {
        VdubError::Api {
            status: status.as_u16(),
            message: extract_error_message(body),
        }
    }

    /// Classify a transport error: no response means `Network`.
    pub fn from_transport(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => VdubError::Api {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => VdubError::InvalidResponse(err.to_string()),
            None => VdubError::Network(err),
        }
    }

    /// Human-readable message without the variant prefix
    pub fn message(&self) -> String {
        match self {
            VdubError::Presign { message }
            | VdubError::Upload { message, .. }
            | VdubError::TaskCreate { message }
            | VdubError::Api { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, VdubError>;
