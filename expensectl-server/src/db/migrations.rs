//! Schema creation
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so `run` is safe on
//! every startup.

use sqlx::SqlitePool;

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BLOB PRIMARY KEY NOT NULL,
        email TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sessions (
        token_hash TEXT PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS expenses (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        category TEXT NOT NULL,
        amount_cents INTEGER NOT NULL CHECK (amount_cents > 0),
        currency TEXT NOT NULL,
        date TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL DEFAULT 'logged',
        kanban_card_id BLOB REFERENCES cards(id) ON DELETE SET NULL,
        search_text TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS boards (
        id BLOB PRIMARY KEY NOT NULL,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS columns (
        id BLOB PRIMARY KEY NOT NULL,
        board_id BLOB NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        sort_order INTEGER NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS cards (
        id BLOB PRIMARY KEY NOT NULL,
        board_id BLOB NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
        column_id BLOB NOT NULL REFERENCES columns(id) ON DELETE CASCADE,
        user_id BLOB NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        title TEXT NOT NULL,
        description TEXT NOT NULL DEFAULT '',
        labels TEXT NOT NULL DEFAULT '[]',
        sort_order INTEGER NOT NULL,
        due_date TEXT,
        expense_id BLOB REFERENCES expenses(id) ON DELETE SET NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_created ON expenses(user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_date ON expenses(user_id, date)",
    "CREATE INDEX IF NOT EXISTS idx_expenses_user_category ON expenses(user_id, category)",
    "CREATE INDEX IF NOT EXISTS idx_boards_user ON boards(user_id, created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_columns_board ON columns(board_id, sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_cards_column ON cards(column_id, sort_order)",
    "CREATE INDEX IF NOT EXISTS idx_cards_board ON cards(board_id)",
];

/// Create all tables and indexes
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    let mut tx = pool.begin().await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&mut *tx).await?;
    }
    tx.commit().await?;

    tracing::info!(statements = SCHEMA.len(), "Migrations complete");
    Ok(())
}
