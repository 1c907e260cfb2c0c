//! Error types for the Refyne client.

use crate::transport::TransportError;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for Refyne operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Seconds reported on a [`Error::RateLimit`] when the server sent no usable
/// `Retry-After` header.
pub const DEFAULT_RATE_LIMIT_RETRY_AFTER: u64 = 60;

/// Error types for the Refyne client.
#[derive(Error, Debug)]
pub enum Error {
    /// Request validation failed (400).
    #[error("Validation error: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Field name to error message
        errors: HashMap<String, String>,
    },

    /// Authentication failed (401).
    #[error("Authentication failed: {message}")]
    Authentication {
        /// Error message
        message: String,
    },

    /// Access forbidden (403).
    #[error("Access forbidden: {message}")]
    Forbidden {
        /// Error message
        message: String,
    },

    /// Resource not found (404).
    #[error("Not found: {message}")]
    NotFound {
        /// Error message
        message: String,
    },

    /// Rate limit still exceeded after all retries (429).
    #[error("Rate limited: {message}. Retry after {retry_after} seconds")]
    RateLimit {
        /// Error message
        message: String,
        /// Seconds to wait before trying again
        retry_after: u64,
    },

    /// Any other error status.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
        /// Additional detail from the server
        detail: Option<String>,
    },

    /// The transport failed on every attempt, timed out, or was cancelled.
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    /// API version is incompatible with this SDK.
    #[error("Unsupported API version {api_version}. This SDK requires >= {min_version}")]
    UnsupportedApiVersion {
        /// The API version detected
        api_version: String,
        /// Minimum supported version
        min_version: String,
        /// Maximum known version
        max_known_version: String,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// HTTP status behind this error, if it came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Validation { .. } => Some(400),
            Error::Authentication { .. } => Some(401),
            Error::Forbidden { .. } => Some(403),
            Error::NotFound { .. } => Some(404),
            Error::RateLimit { .. } => Some(429),
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Server-suggested wait in seconds for rate limit errors.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Error::RateLimit { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Field-level validation errors, if any.
    pub fn field_errors(&self) -> Option<&HashMap<String, String>> {
        match self {
            Error::Validation { errors, .. } => Some(errors),
            _ => None,
        }
    }

    /// True if the caller cancelled the request.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Network(TransportError::Cancelled))
    }

    /// True if an attempt hit the per-request timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Network(TransportError::Timeout(_)) => true,
            Error::Network(TransportError::Http(e)) => e.is_timeout(),
            _ => false,
        }
    }
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    errors: Option<HashMap<String, Value>>,
}

// Servers send either a single message or a list of messages per field.
fn field_message(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Array(items) => items
            .into_iter()
            .map(field_message)
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Map a terminal error response to a typed [`Error`].
///
/// `body` may be empty or not JSON; the message then falls back to the
/// status code's reason phrase.
pub fn classify(status: StatusCode, retry_after: Option<&str>, body: &[u8]) -> Error {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();

    let message = parsed
        .error
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

    match status {
        StatusCode::BAD_REQUEST => Error::Validation {
            message,
            errors: parsed
                .errors
                .unwrap_or_default()
                .into_iter()
                .map(|(field, value)| (field, field_message(value)))
                .collect(),
        },
        StatusCode::UNAUTHORIZED => Error::Authentication { message },
        StatusCode::FORBIDDEN => Error::Forbidden { message },
        StatusCode::NOT_FOUND => Error::NotFound { message },
        StatusCode::TOO_MANY_REQUESTS => Error::RateLimit {
            message,
            retry_after: retry_after
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_RATE_LIMIT_RETRY_AFTER),
        },
        _ => Error::Api {
            status: status.as_u16(),
            message,
            detail: parsed.detail,
        },
    }
}
