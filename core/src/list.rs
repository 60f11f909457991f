//! Client-side todo list with optimistic mutations.
//!
//! # Design
//! `TodoList` owns the displayed snapshot, the active filter, the input text
//! and the last surfaced error. Mutations are two-phase:
//!
//! 1. `begin_*` captures the current snapshot in a `Rollback`, applies the
//!    change locally, and returns a `PendingMutation` holding the request.
//! 2. The host executes the request and hands the response to `settle`,
//!    which either commits or restores the captured snapshot.
//!
//! Overlapping mutations are not queued or merged. Each one restores the
//! snapshot it captured if it fails, and whichever response settles last
//! wins.

use uuid::Uuid;

use crate::client::TodoClient;
use crate::edit::ItemEditor;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::types::{Counts, CreateTodo, StatusFilter, Todo, UpdateTodo};

/// The snapshot as it was before an optimistic change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollback {
    snapshot: Vec<Todo>,
}

impl Rollback {
    fn capture(todos: &[Todo]) -> Self {
        Self {
            snapshot: todos.to_vec(),
        }
    }

    pub fn snapshot(&self) -> &[Todo] {
        &self.snapshot
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Toggle,
    Rename,
    Delete,
    ClearCompleted,
}

/// An optimistic change that has been applied locally and awaits the
/// store's answer.
#[derive(Debug)]
#[must_use = "a pending mutation must be settled with the store's response"]
pub struct PendingMutation {
    kind: MutationKind,
    request: HttpRequest,
    rollback: Rollback,
}

impl PendingMutation {
    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn rollback(&self) -> &Rollback {
        &self.rollback
    }
}

#[derive(Debug, Clone)]
pub struct TodoList {
    client: TodoClient,
    todos: Vec<Todo>,
    filter: StatusFilter,
    input: String,
    loading: bool,
    error: Option<String>,
}

impl TodoList {
    pub fn new(client: TodoClient) -> Self {
        Self {
            client,
            todos: Vec::new(),
            filter: StatusFilter::All,
            input: String::new(),
            loading: false,
            error: None,
        }
    }

    pub fn client(&self) -> &TodoClient {
        &self.client
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn get(&self, id: Uuid) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn filter(&self) -> StatusFilter {
        self.filter
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn counts(&self) -> Counts {
        Counts::of(&self.todos)
    }

    // --- load ---

    /// Switch filters. Every change issues a fresh load.
    pub fn set_filter(&mut self, filter: StatusFilter) -> HttpRequest {
        self.filter = filter;
        self.begin_load()
    }

    pub fn begin_load(&mut self) -> HttpRequest {
        self.loading = true;
        self.error = None;
        self.client.build_list_todos(self.filter)
    }

    /// Replace the snapshot wholesale, or keep it and surface the error.
    pub fn finish_load(&mut self, response: HttpResponse) -> Result<(), ApiError> {
        self.loading = false;
        match self.client.parse_list_todos(response) {
            Ok(todos) => {
                self.todos = todos;
                Ok(())
            }
            Err(err) => Err(self.surface(err)),
        }
    }

    // --- add ---

    /// Request creation of `title`. Blank titles are ignored. Nothing is
    /// added locally until the store assigns an id.
    pub fn begin_add(&mut self, title: &str) -> Option<HttpRequest> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let input = CreateTodo {
            title: title.to_string(),
        };
        match self.client.build_create_todo(&input) {
            Ok(request) => Some(request),
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    /// `begin_add` with the current input text.
    pub fn submit_input(&mut self) -> Option<HttpRequest> {
        let title = self.input.clone();
        self.begin_add(&title)
    }

    /// Prepend the store's record and clear the input.
    pub fn finish_add(&mut self, response: HttpResponse) -> Result<Todo, ApiError> {
        match self.client.parse_create_todo(response) {
            Ok(todo) => {
                self.input.clear();
                self.todos.insert(0, todo.clone());
                Ok(todo)
            }
            Err(err) => Err(self.surface(err)),
        }
    }

    // --- optimistic mutations ---

    pub fn begin_toggle(&mut self, id: Uuid, completed: bool) -> Option<PendingMutation> {
        let update = UpdateTodo {
            title: None,
            completed: Some(completed),
        };
        let request = self.build_update(id, &update)?;
        let rollback = Rollback::capture(&self.todos);
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.completed = completed;
        }
        Some(PendingMutation {
            kind: MutationKind::Toggle,
            request,
            rollback,
        })
    }

    /// Blank titles are ignored.
    pub fn begin_rename(&mut self, id: Uuid, title: &str) -> Option<PendingMutation> {
        let title = title.trim();
        if title.is_empty() {
            return None;
        }
        let update = UpdateTodo {
            title: Some(title.to_string()),
            completed: None,
        };
        let request = self.build_update(id, &update)?;
        let rollback = Rollback::capture(&self.todos);
        if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
            todo.title = title.to_string();
        }
        Some(PendingMutation {
            kind: MutationKind::Rename,
            request,
            rollback,
        })
    }

    /// Commit an item's edit and rename with the draft, if any.
    pub fn commit_edit(&mut self, id: Uuid, editor: &mut ItemEditor) -> Option<PendingMutation> {
        let draft = editor.commit()?;
        self.begin_rename(id, &draft)
    }

    pub fn begin_delete(&mut self, id: Uuid) -> PendingMutation {
        let rollback = Rollback::capture(&self.todos);
        self.todos.retain(|t| t.id != id);
        PendingMutation {
            kind: MutationKind::Delete,
            request: self.client.build_delete_todo(id),
            rollback,
        }
    }

    pub fn begin_clear_completed(&mut self) -> PendingMutation {
        let rollback = Rollback::capture(&self.todos);
        self.todos.retain(|t| !t.completed);
        PendingMutation {
            kind: MutationKind::ClearCompleted,
            request: self.client.build_delete_completed(),
            rollback,
        }
    }

    /// Reconcile a pending mutation with the store's response. On failure
    /// the snapshot captured by `begin_*` is restored in full and the error
    /// is surfaced.
    pub fn settle(&mut self, pending: PendingMutation, response: HttpResponse) -> Result<(), ApiError> {
        let outcome = match pending.kind {
            MutationKind::Toggle | MutationKind::Rename => {
                self.client.parse_update_todo(response).map(|canonical| {
                    if let Some(local) = self.todos.iter_mut().find(|t| t.id == canonical.id) {
                        *local = canonical;
                    }
                })
            }
            MutationKind::Delete => self.client.parse_delete_todo(response),
            MutationKind::ClearCompleted => self.client.parse_delete_completed(response).map(|_| ()),
        };

        outcome.map_err(|err| {
            tracing::warn!(
                kind = ?pending.kind,
                method = pending.request.method.as_str(),
                request = %pending.request.path,
                error = %err,
                "rolling back optimistic change"
            );
            self.todos = pending.rollback.snapshot;
            self.surface(err)
        })
    }

    fn build_update(&mut self, id: Uuid, update: &UpdateTodo) -> Option<HttpRequest> {
        match self.client.build_update_todo(id, update) {
            Ok(request) => Some(request),
            Err(err) => {
                self.surface(err);
                None
            }
        }
    }

    fn surface(&mut self, err: ApiError) -> ApiError {
        self.error = Some(err.user_message());
        err
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::http::HttpMethod;

    fn todo(n: u128, title: &str, completed: bool) -> Todo {
        let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(n as i64);
        Todo {
            id: Uuid::from_u128(n),
            title: title.to_string(),
            completed,
            created_at: created,
            updated_at: created,
        }
    }

    fn respond(status: u16, body: impl Into<String>) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    fn json<T: serde::Serialize>(value: &T) -> String {
        serde_json::to_string(value).unwrap()
    }

    fn loaded(todos: Vec<Todo>) -> TodoList {
        let mut list = TodoList::new(TodoClient::new("http://localhost:4000"));
        let _ = list.begin_load();
        list.finish_load(respond(200, json(&todos))).unwrap();
        list
    }

    #[test]
    fn load_replaces_snapshot() {
        let mut list = loaded(vec![todo(1, "A", false)]);
        assert!(!list.is_loading());

        let req = list.begin_load();
        assert!(list.is_loading());
        assert_eq!(req.path, "http://localhost:4000/api/todos?status=all");

        list.finish_load(respond(200, json(&vec![todo(2, "B", true)]))).unwrap();
        assert_eq!(list.todos(), &[todo(2, "B", true)]);
    }

    #[test]
    fn failed_load_keeps_previous_snapshot() {
        let mut list = loaded(vec![todo(1, "A", false)]);
        let _ = list.begin_load();
        let err = list
            .finish_load(respond(500, r#"{"error":"Failed to fetch todos"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::Http { status: 500, .. }));
        assert_eq!(list.todos(), &[todo(1, "A", false)]);
        assert_eq!(list.error(), Some("Failed to fetch todos"));
        assert!(!list.is_loading());
    }

    #[test]
    fn filter_change_issues_fresh_load() {
        let mut list = loaded(vec![]);
        let req = list.set_filter(StatusFilter::Completed);
        assert_eq!(list.filter(), StatusFilter::Completed);
        assert!(req.path.ends_with("?status=completed"));

        let again = list.set_filter(StatusFilter::Completed);
        assert_eq!(again, req);
    }

    #[test]
    fn blank_add_issues_no_request() {
        let mut list = loaded(vec![todo(1, "A", false)]);
        assert!(list.begin_add("   ").is_none());
        assert!(list.begin_add("").is_none());
        assert_eq!(list.todos().len(), 1);
        assert!(list.error().is_none());
    }

    #[test]
    fn add_prepends_store_record_and_clears_input() {
        let mut list = loaded(vec![todo(1, "A", false)]);
        list.set_input("  B  ");
        let req = list.submit_input().unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.body.as_deref(), Some(r#"{"title":"B"}"#));
        assert_eq!(list.todos().len(), 1);

        let canonical = todo(2, "B", false);
        let added = list.finish_add(respond(201, json(&canonical))).unwrap();
        assert_eq!(added, canonical);
        assert_eq!(list.todos()[0], canonical);
        assert_eq!(list.todos().len(), 2);
        assert_eq!(list.input(), "");
    }

    #[test]
    fn failed_add_keeps_snapshot_and_input() {
        let mut list = loaded(vec![todo(1, "A", false)]);
        list.set_input("B");
        let _ = list.submit_input().unwrap();
        list.finish_add(respond(500, "")).unwrap_err();
        assert_eq!(list.todos(), &[todo(1, "A", false)]);
        assert_eq!(list.input(), "B");
        assert_eq!(list.error(), Some("Request failed"));
    }

    #[test]
    fn toggle_applies_immediately_and_rolls_back_on_failure() {
        let a = todo(1, "A", false);
        let mut list = loaded(vec![a.clone()]);

        let pending = list.begin_toggle(a.id, true).unwrap();
        assert_eq!(pending.kind(), MutationKind::Toggle);
        assert_eq!(pending.request().method, HttpMethod::Patch);
        assert!(list.get(a.id).unwrap().completed);
        assert_eq!(list.counts().completed, 1);

        let err = list
            .settle(pending, respond(500, r#"{"error":"Failed to update todo"}"#))
            .unwrap_err();
        assert_eq!(err.user_message(), "Failed to update todo");
        assert_eq!(list.todos(), &[a]);
        assert_eq!(list.error(), Some("Failed to update todo"));
    }

    #[test]
    fn toggle_success_adopts_canonical_record() {
        let a = todo(1, "A", false);
        let mut list = loaded(vec![a.clone()]);

        let pending = list.begin_toggle(a.id, true).unwrap();
        let mut canonical = a.clone();
        canonical.completed = true;
        canonical.updated_at = a.updated_at + Duration::seconds(5);
        list.settle(pending, respond(200, json(&canonical))).unwrap();

        assert_eq!(list.todos(), &[canonical]);
        assert!(list.error().is_none());
    }

    #[test]
    fn rollback_restores_entire_prior_snapshot() {
        let a = todo(1, "A", false);
        let b = todo(2, "B", false);
        let mut list = loaded(vec![b.clone(), a.clone()]);

        let pending = list.begin_rename(a.id, "  A2 ").unwrap();
        assert_eq!(list.get(a.id).unwrap().title, "A2");
        assert_eq!(pending.rollback().snapshot(), &[b.clone(), a.clone()]);

        list.settle(pending, respond(404, r#"{"error":"Todo not found"}"#))
            .unwrap_err();
        assert_eq!(list.todos(), &[b, a]);
    }

    #[test]
    fn blank_rename_is_ignored() {
        let a = todo(1, "A", false);
        let mut list = loaded(vec![a.clone()]);
        assert!(list.begin_rename(a.id, " ").is_none());
        assert_eq!(list.todos(), &[a]);
    }

    #[test]
    fn delete_removes_optimistically_and_restores_on_failure() {
        let a = todo(1, "A", false);
        let b = todo(2, "B", true);
        let mut list = loaded(vec![b.clone(), a.clone()]);

        let pending = list.begin_delete(a.id);
        assert_eq!(list.todos(), &[b.clone()]);
        list.settle(pending, HttpResponse::transport_failure("connection refused"))
            .unwrap_err();
        assert_eq!(list.todos(), &[b.clone(), a.clone()]);
        assert_eq!(list.error(), Some("connection refused"));

        let pending = list.begin_delete(a.id);
        list.settle(pending, respond(200, r#"{"ok":true}"#)).unwrap();
        assert_eq!(list.todos(), &[b]);
    }

    #[test]
    fn clear_completed_is_optimistic() {
        let a = todo(1, "A", false);
        let b = todo(2, "B", true);
        let mut list = loaded(vec![b.clone(), a.clone()]);

        let pending = list.begin_clear_completed();
        assert_eq!(list.todos(), &[a.clone()]);
        list.settle(pending, respond(500, "")).unwrap_err();
        assert_eq!(list.todos(), &[b, a.clone()]);

        let pending = list.begin_clear_completed();
        list.settle(pending, respond(200, r#"{"deletedCount":1}"#)).unwrap();
        assert_eq!(list.todos(), &[a]);
    }

    #[test]
    fn rename_after_concurrent_delete_restores_stale_snapshot() {
        let a = todo(1, "A", false);
        let mut list = loaded(vec![a.clone()]);

        let rename = list.begin_rename(a.id, "New").unwrap();
        let delete = list.begin_delete(a.id);
        list.settle(delete, respond(200, r#"{"ok":true}"#)).unwrap();
        assert!(list.todos().is_empty());

        let err = list
            .settle(rename, respond(404, r#"{"error":"Todo not found"}"#))
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound { .. }));
        // Last write wins: the rename's pre-state comes back.
        assert_eq!(list.todos(), &[a]);
    }

    #[test]
    fn counts_follow_snapshot() {
        let mut list = loaded(vec![todo(3, "C", true), todo(2, "B", false), todo(1, "A", false)]);
        assert_eq!(
            list.counts(),
            Counts {
                all: 3,
                active: 2,
                completed: 1
            }
        );

        let _pending = list.begin_toggle(Uuid::from_u128(2), true).unwrap();
        assert_eq!(list.counts().get(StatusFilter::Active), 1);
        assert_eq!(list.counts().get(StatusFilter::Completed), 2);
    }

    #[test]
    fn commit_edit_renames_with_draft() {
        let a = todo(1, "A", false);
        let mut list = loaded(vec![a.clone()]);
        let mut editor = ItemEditor::new(&a);

        editor.begin_edit();
        editor.set_draft("Edited");
        let pending = list.commit_edit(a.id, &mut editor).unwrap();
        assert!(!editor.is_editing());
        assert_eq!(list.get(a.id).unwrap().title, "Edited");
        assert_eq!(pending.kind(), MutationKind::Rename);

        editor.begin_edit();
        editor.set_draft("");
        assert!(list.commit_edit(a.id, &mut editor).is_none());
    }

    #[test]
    fn dismiss_error_clears_message() {
        let mut list = loaded(vec![]);
        let _ = list.begin_load();
        list.finish_load(respond(500, "")).unwrap_err();
        assert!(list.error().is_some());
        list.dismiss_error();
        assert!(list.error().is_none());
    }
}
