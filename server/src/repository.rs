//! Persistence layer behind `TodoStore`.
//!
//! # Design
//! A repository owns the record set and provides whole-record primitives.
//! Each primitive runs under one lock acquisition, so a single update is
//! applied atomically; nothing coordinates across calls. Both
//! implementations share `TodoTable` for the in-memory representation.
//! `JsonFileRepository` mutates a copy of the table, writes it out, and only
//! then swaps it in, so a failed write leaves the previous state intact.

use std::{
    collections::HashMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RepositoryError;
use crate::todo::Todo;

/// A record plus its insertion sequence, used to break `createdAt` ties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTodo {
    pub seq: u64,
    #[serde(flatten)]
    pub todo: Todo,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoTable {
    next_seq: u64,
    todos: HashMap<Uuid, StoredTodo>,
}

impl TodoTable {
    fn rows(&self) -> Vec<StoredTodo> {
        self.todos.values().cloned().collect()
    }

    fn insert(&mut self, todo: Todo) -> StoredTodo {
        let stored = StoredTodo {
            seq: self.next_seq,
            todo,
        };
        self.next_seq += 1;
        self.todos.insert(stored.todo.id, stored.clone());
        stored
    }

    fn update(&mut self, id: Uuid, apply: &mut dyn FnMut(&mut Todo)) -> Option<Todo> {
        let stored = self.todos.get_mut(&id)?;
        apply(&mut stored.todo);
        Some(stored.todo.clone())
    }

    fn remove(&mut self, id: Uuid) -> bool {
        self.todos.remove(&id).is_some()
    }

    fn remove_completed(&mut self) -> usize {
        let before = self.todos.len();
        self.todos.retain(|_, stored| !stored.todo.completed);
        before - self.todos.len()
    }
}

/// Storage primitives used by `TodoStore`.
pub trait TodoRepository: Send + Sync {
    fn load_all(&self) -> Result<Vec<StoredTodo>, RepositoryError>;

    fn insert(&self, todo: Todo) -> Result<StoredTodo, RepositoryError>;

    /// Apply `apply` to the record with `id` under a single lock. Returns the
    /// updated record, or `None` if no record has that id.
    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut Todo)) -> Result<Option<Todo>, RepositoryError>;

    /// Returns whether a record was removed.
    fn remove(&self, id: Uuid) -> Result<bool, RepositoryError>;

    /// Returns the number of records removed.
    fn remove_completed(&self) -> Result<usize, RepositoryError>;
}

#[derive(Debug, Default)]
pub struct MemoryRepository {
    table: RwLock<TodoTable>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, TodoTable>, RepositoryError> {
        self.table.read().map_err(|_| RepositoryError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, TodoTable>, RepositoryError> {
        self.table.write().map_err(|_| RepositoryError::Poisoned)
    }
}

impl TodoRepository for MemoryRepository {
    fn load_all(&self) -> Result<Vec<StoredTodo>, RepositoryError> {
        Ok(self.read()?.rows())
    }

    fn insert(&self, todo: Todo) -> Result<StoredTodo, RepositoryError> {
        Ok(self.write()?.insert(todo))
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut Todo)) -> Result<Option<Todo>, RepositoryError> {
        Ok(self.write()?.update(id, apply))
    }

    fn remove(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.write()?.remove(id))
    }

    fn remove_completed(&self) -> Result<usize, RepositoryError> {
        Ok(self.write()?.remove_completed())
    }
}

/// Keeps the table in memory and writes it through to a JSON file after
/// every mutation.
#[derive(Debug)]
pub struct JsonFileRepository {
    path: PathBuf,
    table: RwLock<TodoTable>,
}

impl JsonFileRepository {
    /// Open `path`, starting empty if the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();
        let table = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => TodoTable::default(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, table: &TodoTable) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(table)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut TodoTable) -> T) -> Result<T, RepositoryError> {
        let mut guard = self.table.write().map_err(|_| RepositoryError::Poisoned)?;
        let mut next = guard.clone();
        let out = f(&mut next);
        self.flush(&next)?;
        *guard = next;
        Ok(out)
    }
}

impl TodoRepository for JsonFileRepository {
    fn load_all(&self) -> Result<Vec<StoredTodo>, RepositoryError> {
        let guard = self.table.read().map_err(|_| RepositoryError::Poisoned)?;
        Ok(guard.rows())
    }

    fn insert(&self, todo: Todo) -> Result<StoredTodo, RepositoryError> {
        self.mutate(|table| table.insert(todo))
    }

    fn update(&self, id: Uuid, apply: &mut dyn FnMut(&mut Todo)) -> Result<Option<Todo>, RepositoryError> {
        self.mutate(|table| table.update(id, apply))
    }

    fn remove(&self, id: Uuid) -> Result<bool, RepositoryError> {
        self.mutate(|table| table.remove(id))
    }

    fn remove_completed(&self) -> Result<usize, RepositoryError> {
        self.mutate(TodoTable::remove_completed)
    }
}
