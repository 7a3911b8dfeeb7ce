//! Database layer - connection pool, schema and repositories
//!
//! - One `SqlitePool` shared by all handlers
//! - Every repository method is scoped by `user_id`
//! - Multi-step writes run in a single transaction

pub mod migrations;
pub mod pool;
pub mod repos;

pub use pool::{create_memory_pool, create_pool, create_pool_with_options};
pub use repos::*;
