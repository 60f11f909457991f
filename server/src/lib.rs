//! Todo store service: persisted todo records behind a small JSON/HTTP API.
//!
//! # Overview
//! `TodoStore` validates and orders records; a `TodoRepository` keeps them
//! (in memory, or written through to a JSON file). `routes` maps the store
//! onto `/api/todos`, and `error` maps store failures onto status codes with
//! an `{"error": ...}` body.
//!
//! # Design
//! - The store is constructed once at startup and passed to handlers as
//!   router state; there is no global.
//! - Request bodies are validated into typed values at the boundary.
//! - No cross-request locking beyond the repository's per-call lock;
//!   concurrent writes to one record are last-write-wins.

pub mod config;
pub mod error;
pub mod repository;
pub mod routes;
pub mod store;
pub mod todo;

use std::future::Future;

use axum::{http::Method, Router};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, RepositoryError, StoreError};
pub use repository::{JsonFileRepository, MemoryRepository, TodoRepository};
pub use store::TodoStore;
pub use todo::{StatusFilter, Todo, TodoPatch};

pub fn app(store: TodoStore, config: &ServerConfig) -> Router {
    routes::router(store)
        .layer(cors_layer(config))
        .layer(TraceLayer::new_for_http())
}

pub async fn run(listener: TcpListener, store: TodoStore, config: &ServerConfig) -> Result<(), std::io::Error> {
    run_until(listener, store, config, std::future::pending()).await
}

/// Serve until `shutdown` resolves, then finish in-flight requests.
pub async fn run_until(
    listener: TcpListener,
    store: TodoStore,
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), std::io::Error> {
    axum::serve(listener, app(store, config))
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(config: &ServerConfig) -> CorsLayer {
    let origin = if config.cors_origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(config.cors_origins.iter().cloned())
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
}
