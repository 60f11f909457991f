//! Error taxonomy for the todo store and its mapping onto HTTP responses.
//!
//! # Design
//! `StoreError` has exactly three kinds: validation (400), not found (404)
//! and internal (500). Persistence failures arrive as `RepositoryError` and
//! are folded into `StoreError::Internal` by `?`. The HTTP layer never shows
//! an internal cause to the caller; it logs the cause and answers with a
//! fixed message for the operation that failed.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

pub const TODO_NOT_FOUND: &str = "Todo not found";

/// Failures of the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed data file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("repository lock poisoned")]
    Poisoned,

    #[error("blocking store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Errors returned by `TodoStore` operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{0}")]
    Validation(String),

    #[error("Todo not found")]
    NotFound,

    #[error("internal store error: {0}")]
    Internal(#[from] RepositoryError),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

/// The store operation a handler was performing. Selects the message shown
/// to callers when the operation fails internally.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Create,
    Update,
    Delete,
    ClearCompleted,
}

impl Operation {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::List => "Failed to fetch todos",
            Self::Create => "Failed to create todo",
            Self::Update => "Failed to update todo",
            Self::Delete => "Failed to delete todo",
            Self::ClearCompleted => "Failed to clear completed",
        }
    }
}

/// An error ready to be rendered as `{"error": <message>}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    source: Option<StoreError>,
}

impl ApiError {
    pub fn new(operation: Operation, err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => Self::bad_request(message),
            StoreError::NotFound => Self::not_found(),
            internal @ StoreError::Internal(_) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: operation.failure_message().to_string(),
                source: Some(internal),
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            source: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: TODO_NOT_FOUND.to_string(),
            source: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A body that is not JSON, or whose fields have the wrong JSON type, is a
/// validation failure.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    message = %self.message,
                    error = %source,
                    "request failed"
                ),
                None => tracing::error!(status = %self.status, message = %self.message, "request failed"),
            }
        }

        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}
