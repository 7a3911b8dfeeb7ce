//! expensectl-server: HTTP API over SQLite
//!
//! Persists users, sessions, expenses and Kanban boards, and serves them
//! as a JSON API scoped to the authenticated user.

pub mod auth;
pub mod db;
pub mod http;

pub use db::{create_memory_pool, create_pool, migrations, DbError};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
