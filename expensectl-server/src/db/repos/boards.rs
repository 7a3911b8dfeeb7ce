//! Board repository
//!
//! - get_with_data: three queries (board, columns, cards), grouped in memory
//! - delete: cards, then columns, then the board, in one transaction

use chrono::{DateTime, Utc};
use sqlx::{Executor, FromRow, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use expensectl_core::models::{
    Board, BoardName, BoardWithColumns, Column, DEFAULT_BOARD_NAME, DEFAULT_COLUMNS,
};

use super::cards::board_cards;
use super::columns::{board_columns, insert_column};
use super::DbError;

#[derive(Debug, FromRow)]
struct BoardRow {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<BoardRow> for Board {
    fn from(r: BoardRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            name: r.name,
            created_at: r.created_at,
        }
    }
}

pub(crate) async fn fetch_board<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<Board, DbError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row: Option<BoardRow> = sqlx::query_as(
        "SELECT id, user_id, name, created_at FROM boards WHERE id = ? AND user_id = ?",
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    row.map(Board::from)
        .ok_or_else(|| DbError::not_found("board", id))
}

/// Add whichever default columns the board lacks, after the existing ones.
pub(crate) async fn ensure_default_columns(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<Vec<Column>, DbError> {
    let mut columns = board_columns(conn, user_id, board_id).await?;
    for (name, _) in DEFAULT_COLUMNS {
        if columns.iter().any(|c| c.name == name) {
            continue;
        }
        let order = columns.len() as u32;
        columns.push(insert_column(conn, user_id, board_id, name, order).await?);
    }
    Ok(columns)
}

/// Board repository
pub struct BoardRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> BoardRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a board, optionally with the default workflow columns.
    pub async fn create(
        &self,
        user_id: Uuid,
        name: &BoardName,
        default_columns: bool,
    ) -> Result<BoardWithColumns, DbError> {
        let mut tx = self.pool.begin().await?;

        let row: BoardRow = sqlx::query_as(
            r#"
            INSERT INTO boards (id, user_id, name, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, user_id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(name.as_str())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;
        let board = Board::from(row);

        let mut columns = Vec::new();
        if default_columns {
            for (name, order) in DEFAULT_COLUMNS {
                columns.push(insert_column(&mut tx, user_id, board.id, name, order).await?);
            }
        }

        tx.commit().await?;
        tracing::debug!(board_id = %board.id, columns = columns.len(), "Created board");
        Ok(BoardWithColumns::assemble(board, columns, Vec::new()))
    }

    /// Board named "Expense Tracker" with To Log, Verify, Paid, Reimburse
    pub async fn initialize_default(&self, user_id: Uuid) -> Result<BoardWithColumns, DbError> {
        let name = BoardName::new(DEFAULT_BOARD_NAME)?;
        self.create(user_id, &name, true).await
    }

    /// The user's boards, newest first
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<Board>, DbError> {
        let rows: Vec<BoardRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, name, created_at
            FROM boards
            WHERE user_id = ?
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Board::from).collect())
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Board, DbError> {
        fetch_board(self.pool, user_id, id).await
    }

    /// Board with its columns and every column's cards, all by order
    pub async fn get_with_data(&self, user_id: Uuid, id: Uuid) -> Result<BoardWithColumns, DbError> {
        let mut conn = self.pool.acquire().await?;
        let board = fetch_board(&mut *conn, user_id, id).await?;
        let columns = board_columns(&mut conn, user_id, id).await?;
        let cards = board_cards(&mut conn, user_id, id).await?;

        Ok(BoardWithColumns::assemble(board, columns, cards))
    }

    /// Delete a board with its columns and cards. Linked expenses are kept
    /// and unlinked.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        fetch_board(&mut *tx, user_id, id).await?;

        sqlx::query(
            r#"
            UPDATE expenses SET kanban_card_id = NULL, updated_at = ?
            WHERE user_id = ?
              AND kanban_card_id IN (SELECT id FROM cards WHERE board_id = ?)
            "#,
        )
        .bind(Utc::now())
        .bind(user_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let cards = sqlx::query("DELETE FROM cards WHERE board_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        sqlx::query("DELETE FROM columns WHERE board_id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM boards WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(board_id = %id, cards, "Deleted board");
        Ok(())
    }
}
