//! Client core for the todo service.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that stateless
//! client, `TodoList` keeps the displayed snapshot and reconciles optimistic
//! local changes with the store's answers, and `ItemEditor` tracks per-item
//! edit mode.
//!
//! # Design
//! - `TodoClient` is stateless; it holds only `base_url`.
//! - Each operation is split into `build_*` (produces request) and
//!   `parse_*` (consumes response), so the I/O boundary is explicit.
//! - Optimistic mutations return a `PendingMutation` carrying an explicit
//!   `Rollback` token; `TodoList::settle` commits or restores it.
//! - DTOs are defined independently from the server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod edit;
pub mod error;
pub mod http;
pub mod list;
pub mod types;

pub use client::TodoClient;
pub use edit::{EditState, ItemEditor};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use list::{MutationKind, PendingMutation, Rollback, TodoList};
pub use types::{Counts, CreateTodo, DeleteCompleted, Health, StatusFilter, Todo, UpdateTodo};
