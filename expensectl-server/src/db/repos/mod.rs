//! Repository implementations for database access
//!
//! Each repository borrows the pool and scopes every query by the owning
//! user. A record belonging to someone else is reported as not found.

pub mod boards;
pub mod cards;
pub mod columns;
pub mod expenses;
pub mod sessions;
pub mod users;

pub use boards::BoardRepo;
pub use cards::{CardPatch, CardRepo, NewCard};
pub use columns::ColumnRepo;
pub use expenses::ExpenseRepo;
pub use sessions::{Session, SessionRepo};
pub use users::{Credentials, UserRepo};

use expensectl_core::models::ValidationError;
use expensectl_core::reorder::ReorderError;

/// Database error type
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("not found: {resource} '{id}'")]
    NotFound { resource: &'static str, id: String },

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("stored {field} is unreadable: '{value}'")]
    Corrupt { field: &'static str, value: String },
}

impl DbError {
    pub(crate) fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// Map a unique-constraint violation onto `Conflict`
    pub(crate) fn unique_or(e: sqlx::Error, message: impl Into<String>) -> Self {
        match e.as_database_error() {
            Some(db) if db.is_unique_violation() => Self::Conflict(message.into()),
            _ => Self::Sqlx(e),
        }
    }
}

impl From<ReorderError> for DbError {
    fn from(e: ReorderError) -> Self {
        match e {
            ReorderError::UnknownCard(id) => Self::not_found("card", id),
            ReorderError::UnknownColumn(id) => Self::not_found("column", id),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use sqlx::SqlitePool;
    use uuid::Uuid;

    use super::UserRepo;
    use crate::db::{create_memory_pool, migrations};
    use expensectl_core::models::{Email, UserName};

    /// Migrated in-memory pool with one registered user
    pub async fn setup() -> (SqlitePool, Uuid) {
        let pool = create_memory_pool().await.unwrap();
        migrations::run(&pool).await.unwrap();
        let user = UserRepo::new(&pool)
            .create(
                &Email::new("ada@example.com").unwrap(),
                &UserName::new("Ada").unwrap(),
                "hash",
            )
            .await
            .unwrap();
        (pool, user.id)
    }
}
