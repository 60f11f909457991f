//! Record and request types for the todo store.
//!
//! # Design
//! Request bodies are deserialized into explicit `*Request` structs and then
//! validated into typed values (`Title`, `TodoPatch`) before they reach the
//! store. The store only ever sees trimmed, non-empty titles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

pub const TITLE_REQUIRED: &str = "Title is required";
pub const TITLE_EMPTY: &str = "Title cannot be empty";

/// A persisted todo record, as returned by every read and write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Which records a list call returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    /// Lenient parse of the `status` query parameter. Unknown values list
    /// everything.
    pub fn from_query(value: Option<&str>) -> Self {
        match value {
            Some("active") => Self::Active,
            Some("completed") => Self::Completed,
            _ => Self::All,
        }
    }

    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            Self::All => true,
            Self::Active => !todo.completed,
            Self::Completed => todo.completed,
        }
    }
}

/// A title that has been trimmed and checked for emptiness.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// A validated partial update. Fields left as `None` are not touched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<Title>,
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn new(title: Option<&str>, completed: Option<bool>) -> Result<Self, StoreError> {
        let title = match title {
            Some(raw) => Some(Title::parse(raw).ok_or_else(|| StoreError::validation(TITLE_EMPTY))?),
            None => None,
        };
        Ok(Self { title, completed })
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    /// Apply every present field to `todo`. Returns whether anything was set.
    pub fn apply(self, todo: &mut Todo) -> bool {
        let touched = !self.is_empty();
        if let Some(title) = self.title {
            todo.title = title.into_inner();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        touched
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTodoRequest {
    pub title: Option<String>,
}

impl CreateTodoRequest {
    pub fn validate(self) -> Result<Title, StoreError> {
        self.title
            .as_deref()
            .and_then(Title::parse)
            .ok_or_else(|| StoreError::validation(TITLE_REQUIRED))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateTodoRequest {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl UpdateTodoRequest {
    pub fn validate(self) -> Result<TodoPatch, StoreError> {
        TodoPatch::new(self.title.as_deref(), self.completed)
    }
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearedCompleted {
    pub deleted_count: usize,
}
