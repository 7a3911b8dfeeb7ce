//! User repository

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use expensectl_core::models::{Email, User, UserName};

use super::DbError;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

/// User along with its stored password hash, for login
#[derive(Debug)]
pub struct Credentials {
    pub user: User,
    pub password_hash: String,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a user. A taken email is a `Conflict`.
    pub async fn create(
        &self,
        email: &Email,
        name: &UserName,
        password_hash: &str,
    ) -> Result<User, DbError> {
        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id, email, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.as_str())
        .bind(name.as_str())
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(self.pool)
        .await
        .map_err(|e| DbError::unique_or(e, format!("email '{}' is already registered", email.as_str())))?;

        Ok(row.into())
    }

    pub async fn get(&self, id: Uuid) -> Result<User, DbError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(User::from)
            .ok_or_else(|| DbError::not_found("user", id))
    }

    pub async fn find_by_email(&self, email: &Email) -> Result<Option<User>, DbError> {
        let row: Option<UserRow> =
            sqlx::query_as("SELECT id, email, name, created_at FROM users WHERE email = ?")
                .bind(email.as_str())
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(User::from))
    }

    /// Look up a user and password hash for login
    pub async fn credentials(&self, email: &Email) -> Result<Option<Credentials>, DbError> {
        #[derive(FromRow)]
        struct Row {
            #[sqlx(flatten)]
            user: UserRow,
            password_hash: String,
        }

        let row: Option<Row> = sqlx::query_as(
            "SELECT id, email, name, created_at, password_hash FROM users WHERE email = ?",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| Credentials {
            user: r.user.into(),
            password_hash: r.password_hash,
        }))
    }

    /// All users, oldest first
    pub async fn list(&self) -> Result<Vec<User>, DbError> {
        let rows: Vec<UserRow> =
            sqlx::query_as("SELECT id, email, name, created_at FROM users ORDER BY created_at ASC")
                .fetch_all(self.pool)
                .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_memory_pool, migrations};

    async fn pool() -> SqlitePool {
        let pool = create_memory_pool().await.unwrap();
        migrations::run(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn create_and_lookup() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let email = Email::new("ada@example.com").unwrap();
        let user = repo
            .create(&email, &UserName::new("Ada").unwrap(), "hash")
            .await
            .unwrap();

        assert_eq!(repo.get(user.id).await.unwrap(), user);
        assert_eq!(repo.find_by_email(&email).await.unwrap(), Some(user.clone()));

        let creds = repo.credentials(&email).await.unwrap().unwrap();
        assert_eq!(creds.password_hash, "hash");
        assert_eq!(creds.user.id, user.id);
    }

    #[tokio::test]
    async fn duplicate_email_conflicts() {
        let pool = pool().await;
        let repo = UserRepo::new(&pool);
        let email = Email::new("ada@example.com").unwrap();
        let name = UserName::new("Ada").unwrap();
        repo.create(&email, &name, "h").await.unwrap();

        let err = repo.create(&email, &name, "h").await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let pool = pool().await;
        let err = UserRepo::new(&pool).get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "user", .. }));
    }
}
