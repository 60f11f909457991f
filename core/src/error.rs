//! Error types for the todo API client.
//!
//! # Design
//! Every non-success response is treated the same way: the `error` field of
//! the JSON body becomes the message, or `"Request failed"` when the body
//! has none. The status picks the variant so callers can still tell a
//! rejected title from a vanished record.

use serde::Deserialize;

pub const FALLBACK_MESSAGE: &str = "Request failed";

/// Errors returned by `TodoClient` parse methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The server returned 400: the request failed validation.
    #[error("{message}")]
    Validation { message: String },

    /// The server returned 404: the todo does not exist.
    #[error("{message}")]
    NotFound { message: String },

    /// Any other non-success status, including transport failures (status 0).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiError {
    /// Build the error for a non-success response.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.error)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        match status {
            400 => Self::Validation { message },
            404 => Self::NotFound { message },
            _ => Self::Http { status, message },
        }
    }

    /// The text to show the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation { message } | Self::NotFound { message } | Self::Http { message, .. } => {
                message.clone()
            }
            Self::Deserialization(_) | Self::Serialization(_) => FALLBACK_MESSAGE.to_string(),
        }
    }
}
