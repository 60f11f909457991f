//! HTTP handlers for `/api/health` and `/api/todos`.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, patch},
    Json, Router,
};
use uuid::Uuid;

use crate::error::{ApiError, Operation, RepositoryError, StoreError};
use crate::store::TodoStore;
use crate::todo::{
    ClearedCompleted, CreateTodoRequest, Deleted, Health, ListQuery, StatusFilter, Todo, UpdateTodoRequest,
};

pub fn router(store: TodoStore) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/todos", get(list_todos).post(create_todo).delete(clear_completed))
        .route("/api/todos/{id}", patch(update_todo).delete(delete_todo))
        .with_state(store)
}

async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn list_todos(
    State(store): State<TodoStore>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let status = query.ok().and_then(|Query(q)| q.status);
    let filter = StatusFilter::from_query(status.as_deref());
    let todos = blocking(store, Operation::List, move |store| store.list(filter)).await?;
    Ok(Json(todos))
}

async fn create_todo(
    State(store): State<TodoStore>,
    payload: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(input) = payload?;
    let title = input
        .validate()
        .map_err(|err| ApiError::new(Operation::Create, err))?;
    let todo = blocking(store, Operation::Create, move |store| store.insert(title)).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

async fn update_todo(
    State(store): State<TodoStore>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTodoRequest>, JsonRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Json(input) = payload?;
    let patch = input
        .validate()
        .map_err(|err| ApiError::new(Operation::Update, err))?;
    let id = parse_id(&id)?;
    let todo = blocking(store, Operation::Update, move |store| store.update(id, patch)).await?;
    Ok(Json(todo))
}

async fn delete_todo(State(store): State<TodoStore>, Path(id): Path<String>) -> Result<Json<Deleted>, ApiError> {
    let id = parse_id(&id)?;
    blocking(store, Operation::Delete, move |store| store.delete(id)).await?;
    Ok(Json(Deleted { ok: true }))
}

async fn clear_completed(State(store): State<TodoStore>) -> Result<Json<ClearedCompleted>, ApiError> {
    let deleted_count = blocking(store, Operation::ClearCompleted, |store| store.delete_completed()).await?;
    Ok(Json(ClearedCompleted { deleted_count }))
}

/// Run a store call on the blocking pool. Repositories do synchronous I/O
/// while holding their lock, which must stay off the async workers.
async fn blocking<T, F>(store: TodoStore, operation: Operation, call: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&TodoStore) -> Result<T, StoreError> + Send + 'static,
{
    tokio::task::spawn_blocking(move || call(&store))
        .await
        .map_err(|err| StoreError::from(RepositoryError::from(err)))
        .and_then(|result| result)
        .map_err(|err| ApiError::new(operation, err))
}

/// An id that is not a UUID cannot name any record.
fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::not_found())
}
