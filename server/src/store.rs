//! The todo store: list, create, update, delete and clear-completed.
//!
//! # Design
//! `TodoStore` is built once at startup and handed to the router as state.
//! It owns validation and ordering; the repository behind it owns the
//! records. Concurrent calls on the same id are last-write-wins.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{RepositoryError, StoreError};
use crate::repository::{JsonFileRepository, MemoryRepository, TodoRepository};
use crate::todo::{StatusFilter, Title, Todo, TodoPatch, TITLE_REQUIRED};

#[derive(Clone)]
pub struct TodoStore {
    repo: Arc<dyn TodoRepository>,
}

impl std::fmt::Debug for TodoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TodoStore").finish_non_exhaustive()
    }
}

impl TodoStore {
    pub fn new(repo: impl TodoRepository + 'static) -> Self {
        Self { repo: Arc::new(repo) }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryRepository::new())
    }

    /// File-backed when `TODO_DATA_FILE` is configured, in-memory otherwise.
    pub fn from_config(config: &ServerConfig) -> Result<Self, RepositoryError> {
        match &config.data_file {
            Some(path) => {
                tracing::info!(path = %path.display(), "using JSON file persistence");
                Ok(Self::new(JsonFileRepository::open(path)?))
            }
            None => {
                tracing::info!("using in-memory persistence");
                Ok(Self::in_memory())
            }
        }
    }

    /// Records matching `filter`, newest first.
    pub fn list(&self, filter: StatusFilter) -> Result<Vec<Todo>, StoreError> {
        let mut rows = self.repo.load_all()?;
        rows.retain(|row| filter.matches(&row.todo));
        rows.sort_by(|a, b| {
            b.todo
                .created_at
                .cmp(&a.todo.created_at)
                .then_with(|| b.seq.cmp(&a.seq))
        });
        Ok(rows.into_iter().map(|row| row.todo).collect())
    }

    pub fn create(&self, title: &str) -> Result<Todo, StoreError> {
        let title = Title::parse(title).ok_or_else(|| StoreError::validation(TITLE_REQUIRED))?;
        self.insert(title)
    }

    pub fn insert(&self, title: Title) -> Result<Todo, StoreError> {
        let now = Utc::now();
        let todo = Todo {
            id: Uuid::new_v4(),
            title: title.into_inner(),
            completed: false,
            created_at: now,
            updated_at: now,
        };
        let stored = self.repo.insert(todo)?;
        tracing::debug!(id = %stored.todo.id, seq = stored.seq, "created todo");
        Ok(stored.todo)
    }

    pub fn update(&self, id: Uuid, patch: TodoPatch) -> Result<Todo, StoreError> {
        let mut patch = Some(patch);
        let updated = self.repo.update(id, &mut |todo: &mut Todo| {
            if let Some(patch) = patch.take() {
                if patch.apply(todo) {
                    todo.updated_at = Utc::now();
                }
            }
        })?;
        let todo = updated.ok_or(StoreError::NotFound)?;
        tracing::debug!(id = %todo.id, completed = todo.completed, "updated todo");
        Ok(todo)
    }

    pub fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        if !self.repo.remove(id)? {
            return Err(StoreError::NotFound);
        }
        tracing::debug!(%id, "deleted todo");
        Ok(())
    }

    /// Remove every completed record. Zero matches is not an error.
    pub fn delete_completed(&self) -> Result<usize, StoreError> {
        let removed = self.repo.remove_completed()?;
        tracing::debug!(removed, "cleared completed todos");
        Ok(removed)
    }
}
