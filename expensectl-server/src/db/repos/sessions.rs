//! Session repository
//!
//! Only the SHA-256 of a bearer token is stored; see `crate::auth`.

use chrono::{DateTime, Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use super::DbError;

/// Session record from database
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct Session {
    pub token_hash: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session repository
pub struct SessionRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        token_hash: &str,
        ttl: Duration,
    ) -> Result<Session, DbError> {
        let now = Utc::now();
        let session: Session = sqlx::query_as(
            r#"
            INSERT INTO sessions (token_hash, user_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING token_hash, user_id, created_at, expires_at
            "#,
        )
        .bind(token_hash)
        .bind(user_id)
        .bind(now)
        .bind(now + ttl)
        .fetch_one(self.pool)
        .await?;

        Ok(session)
    }

    /// Session for a token hash, if it exists and hasn't expired
    pub async fn find_active(&self, token_hash: &str) -> Result<Option<Session>, DbError> {
        let session: Option<Session> = sqlx::query_as(
            r#"
            SELECT token_hash, user_id, created_at, expires_at
            FROM sessions
            WHERE token_hash = ?
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;

        Ok(session.filter(|s| s.expires_at > Utc::now()))
    }

    /// Returns whether a session was removed
    pub async fn delete(&self, token_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(token_hash)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drop expired sessions, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::UserRepo;
    use crate::db::{create_memory_pool, migrations};
    use expensectl_core::models::{Email, UserName};

    async fn setup() -> (SqlitePool, Uuid) {
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

    #[tokio::test]
    async fn active_session_is_found() {
        let (pool, user_id) = setup().await;
        let repo = SessionRepo::new(&pool);
        repo.create(user_id, "abc", Duration::hours(1)).await.unwrap();

        let found = repo.find_active("abc").await.unwrap().unwrap();
        assert_eq!(found.user_id, user_id);
        assert!(repo.find_active("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_session_is_ignored_and_purged() {
        let (pool, user_id) = setup().await;
        let repo = SessionRepo::new(&pool);
        repo.create(user_id, "old", Duration::hours(-1)).await.unwrap();
        repo.create(user_id, "new", Duration::hours(1)).await.unwrap();

        assert!(repo.find_active("old").await.unwrap().is_none());
        assert_eq!(repo.purge_expired().await.unwrap(), 1);
        assert!(repo.find_active("new").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn delete_reports_removal() {
        let (pool, user_id) = setup().await;
        let repo = SessionRepo::new(&pool);
        repo.create(user_id, "abc", Duration::hours(1)).await.unwrap();

        assert!(repo.delete("abc").await.unwrap());
        assert!(!repo.delete("abc").await.unwrap());
    }
}
