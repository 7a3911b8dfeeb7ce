//! Column repository
//!
//! Column `sort_order` within a board stays dense; inserting or moving a
//! column rewrites the orders of its siblings in the same transaction.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use expensectl_core::models::{Column, ColumnName};
use expensectl_core::reorder::plan_column_move;

use super::boards::fetch_board;
use super::DbError;

#[derive(Debug, FromRow)]
pub(crate) struct ColumnRow {
    id: Uuid,
    board_id: Uuid,
    user_id: Uuid,
    name: String,
    sort_order: i64,
    created_at: DateTime<Utc>,
}

impl From<ColumnRow> for Column {
    fn from(r: ColumnRow) -> Self {
        Self {
            id: r.id,
            board_id: r.board_id,
            user_id: r.user_id,
            name: r.name,
            order: u32::try_from(r.sort_order).unwrap_or(0),
            created_at: r.created_at,
        }
    }
}

/// A board's columns by order
pub(crate) async fn board_columns(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<Vec<Column>, DbError> {
    let rows: Vec<ColumnRow> = sqlx::query_as(
        r#"
        SELECT id, board_id, user_id, name, sort_order, created_at
        FROM columns
        WHERE board_id = ? AND user_id = ?
        ORDER BY sort_order ASC, rowid ASC
        "#,
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows.into_iter().map(Column::from).collect())
}

pub(crate) async fn fetch_column(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Column, DbError> {
    let row: Option<ColumnRow> = sqlx::query_as(
        r#"
        SELECT id, board_id, user_id, name, sort_order, created_at
        FROM columns
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Column::from)
        .ok_or_else(|| DbError::not_found("column", id))
}

pub(crate) async fn insert_column(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
    name: &str,
    order: u32,
) -> Result<Column, DbError> {
    let row: ColumnRow = sqlx::query_as(
        r#"
        INSERT INTO columns (id, board_id, user_id, name, sort_order, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, board_id, user_id, name, sort_order, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(board_id)
    .bind(user_id)
    .bind(name)
    .bind(i64::from(order))
    .bind(Utc::now())
    .fetch_one(&mut *conn)
    .await?;

    Ok(row.into())
}

/// Move a column to `position` and write the orders that changed
async fn reposition(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
    column_id: Uuid,
    position: usize,
) -> Result<(), DbError> {
    let current: Vec<(Uuid, u32)> = board_columns(conn, user_id, board_id)
        .await?
        .into_iter()
        .map(|c| (c.id, c.order))
        .collect();

    for (id, order) in plan_column_move(&current, column_id, position)? {
        sqlx::query("UPDATE columns SET sort_order = ? WHERE id = ? AND user_id = ?")
            .bind(i64::from(order))
            .bind(id)
            .bind(user_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Column repository
pub struct ColumnRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ColumnRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a column, appended unless `order` is given.
    pub async fn create(
        &self,
        user_id: Uuid,
        board_id: Uuid,
        name: &ColumnName,
        order: Option<u32>,
    ) -> Result<Column, DbError> {
        let mut tx = self.pool.begin().await?;
        fetch_board(&mut *tx, user_id, board_id).await?;

        let len = board_columns(&mut tx, user_id, board_id).await?.len();
        let column = insert_column(&mut tx, user_id, board_id, name.as_str(), len as u32).await?;
        if let Some(order) = order {
            reposition(&mut tx, user_id, board_id, column.id, order as usize).await?;
        }
        let column = fetch_column(&mut tx, user_id, column.id).await?;

        tx.commit().await?;
        Ok(column)
    }

    pub async fn list(&self, user_id: Uuid, board_id: Uuid) -> Result<Vec<Column>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_board(&mut *conn, user_id, board_id).await?;
        board_columns(&mut conn, user_id, board_id).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Column, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_column(&mut conn, user_id, id).await
    }

    /// Move a column and return the board's columns in their new order.
    pub async fn update_order(
        &self,
        user_id: Uuid,
        column_id: Uuid,
        order: u32,
    ) -> Result<Vec<Column>, DbError> {
        let mut tx = self.pool.begin().await?;
        let column = fetch_column(&mut tx, user_id, column_id).await?;
        reposition(&mut tx, user_id, column.board_id, column_id, order as usize).await?;
        let columns = board_columns(&mut tx, user_id, column.board_id).await?;
        tx.commit().await?;
        Ok(columns)
    }

    pub async fn rename(&self, user_id: Uuid, column_id: Uuid, name: &ColumnName) -> Result<Column, DbError> {
        let mut tx = self.pool.begin().await?;
        fetch_column(&mut tx, user_id, column_id).await?;
        sqlx::query("UPDATE columns SET name = ? WHERE id = ? AND user_id = ?")
            .bind(name.as_str())
            .bind(column_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        let column = fetch_column(&mut tx, user_id, column_id).await?;
        tx.commit().await?;
        Ok(column)
    }
}
