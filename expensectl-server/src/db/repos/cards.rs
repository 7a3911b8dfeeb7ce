//! Card repository
//!
//! Moves and deletes plan against a snapshot of the board taken inside the
//! transaction, then write only the cards whose column or order changed.
//! A card linked to an expense keeps the expense's status in step with the
//! column it lands in.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use expensectl_core::models::{
    Card, CardTitle, Description, Expense, ExpenseStatus, Label, Labels, DEFAULT_COLUMNS,
};
use expensectl_core::reorder::{
    plan_move, plan_removal, resolve_drop, BoardLayout, MovePlan, Placement,
};

use super::boards::{ensure_default_columns, fetch_board};
use super::columns::fetch_column;
use super::expenses::{fetch_expense, set_card_link, set_status};
use super::DbError;

const CARD_COLUMNS: &str = "id, board_id, column_id, user_id, title, description, labels, \
     sort_order, due_date, expense_id, created_at, updated_at";

#[derive(Debug, FromRow)]
struct CardRow {
    id: Uuid,
    board_id: Uuid,
    column_id: Uuid,
    user_id: Uuid,
    title: String,
    description: String,
    labels: String,
    sort_order: i64,
    due_date: Option<NaiveDate>,
    expense_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = DbError;

    fn try_from(r: CardRow) -> Result<Self, DbError> {
        let labels: Vec<String> = serde_json::from_str(&r.labels).map_err(|_| DbError::Corrupt {
            field: "labels",
            value: r.labels.clone(),
        })?;

        Ok(Self {
            id: r.id,
            board_id: r.board_id,
            column_id: r.column_id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            labels,
            order: u32::try_from(r.sort_order).unwrap_or(0),
            due_date: r.due_date,
            expense_id: r.expense_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Validated input for a new card
#[derive(Debug, Clone)]
pub struct NewCard {
    pub column_id: Uuid,
    pub title: CardTitle,
    pub description: Description,
    pub labels: Labels,
    /// Position in the column; appended when `None`
    pub order: Option<u32>,
    pub due_date: Option<NaiveDate>,
    pub expense_id: Option<Uuid>,
}

/// Partial card update; column and order change through `move_card`
#[derive(Debug, Clone, Default)]
pub struct CardPatch {
    pub title: Option<CardTitle>,
    pub description: Option<Description>,
    pub labels: Option<Labels>,
    /// `Some(None)` clears the due date
    pub due_date: Option<Option<NaiveDate>>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.labels.is_none()
            && self.due_date.is_none()
    }
}

fn labels_json(labels: &[String]) -> String {
    serde_json::to_string(labels).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) async fn board_cards(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<Vec<Card>, DbError> {
    let sql = format!(
        "SELECT {CARD_COLUMNS} FROM cards WHERE board_id = ? AND user_id = ? \
         ORDER BY sort_order ASC, rowid ASC"
    );
    let rows: Vec<CardRow> = sqlx::query_as(&sql)
        .bind(board_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

    rows.into_iter().map(Card::try_from).collect()
}

async fn fetch_card(conn: &mut SqliteConnection, user_id: Uuid, id: Uuid) -> Result<Card, DbError> {
    let sql = format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ? AND user_id = ?");
    let row: Option<CardRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("card", id))?
        .try_into()
}

/// Snapshot of a board's columns and card orders
async fn load_layout(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<BoardLayout, DbError> {
    let columns: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM columns WHERE board_id = ? AND user_id = ? ORDER BY sort_order ASC, rowid ASC",
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let cards: Vec<(Uuid, Uuid, i64)> = sqlx::query_as(
        "SELECT id, column_id, sort_order FROM cards WHERE board_id = ? AND user_id = ? \
         ORDER BY sort_order ASC, rowid ASC",
    )
    .bind(board_id)
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut layout = BoardLayout::new();
    for (column_id,) in columns {
        layout.push_column(
            column_id,
            cards
                .iter()
                .filter(|(_, col, _)| *col == column_id)
                .map(|(id, _, order)| (*id, u32::try_from(*order).unwrap_or(0))),
        );
    }
    Ok(layout)
}

async fn write_placements(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    placements: &[Placement],
) -> Result<(), DbError> {
    let now = Utc::now();
    for p in placements {
        sqlx::query(
            "UPDATE cards SET column_id = ?, sort_order = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(p.column)
        .bind(i64::from(p.order))
        .bind(now)
        .bind(p.card)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Insert a card at the end of its column, then move it into place.
async fn insert_card(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    board_id: Uuid,
    new: &NewCard,
) -> Result<Card, DbError> {
    let column = fetch_column(conn, user_id, new.column_id).await?;
    if column.board_id != board_id {
        return Err(DbError::not_found("column", new.column_id));
    }

    let (len,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM cards WHERE column_id = ? AND user_id = ?")
            .bind(column.id)
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO cards
            (id, board_id, column_id, user_id, title, description, labels,
             sort_order, due_date, expense_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING {CARD_COLUMNS}
        "#
    );
    let row: CardRow = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(board_id)
        .bind(column.id)
        .bind(user_id)
        .bind(new.title.as_str())
        .bind(new.description.as_str())
        .bind(labels_json(new.labels.as_slice()))
        .bind(len)
        .bind(new.due_date)
        .bind(new.expense_id)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;
    let card = Card::try_from(row)?;

    match new.order {
        Some(order) if i64::from(order) < len => {
            let layout = load_layout(conn, user_id, board_id).await?;
            let plan = plan_move(&layout, card.id, column.id, order as usize)?;
            write_placements(conn, user_id, &plan.updates).await?;
            fetch_card(conn, user_id, card.id).await
        }
        _ => Ok(card),
    }
}

/// An expense sits on at most one card
fn ensure_unlinked(expense: &Expense) -> Result<(), DbError> {
    match expense.kanban_card_id {
        Some(existing) => Err(DbError::Conflict(format!(
            "expense '{}' is already linked to card '{}'",
            expense.id, existing
        ))),
        None => Ok(()),
    }
}

/// Card repository
pub struct CardRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CardRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add a card to a column of `board_id`. A given `expense_id` is linked
    /// both ways.
    pub async fn create(&self, user_id: Uuid, board_id: Uuid, new: &NewCard) -> Result<Card, DbError> {
        let mut tx = self.pool.begin().await?;
        fetch_board(&mut *tx, user_id, board_id).await?;
        if let Some(expense_id) = new.expense_id {
            let expense = fetch_expense(&mut *tx, user_id, expense_id).await?;
            ensure_unlinked(&expense)?;
        }

        let card = insert_card(&mut tx, user_id, board_id, new).await?;
        if let Some(expense_id) = new.expense_id {
            set_card_link(&mut *tx, user_id, expense_id, Some(card.id)).await?;
        }

        tx.commit().await?;
        Ok(card)
    }

    pub async fn list(&self, user_id: Uuid, board_id: Uuid) -> Result<Vec<Card>, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_board(&mut *conn, user_id, board_id).await?;
        board_cards(&mut conn, user_id, board_id).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Card, DbError> {
        let mut conn = self.pool.acquire().await?;
        fetch_card(&mut conn, user_id, id).await
    }

    pub async fn update(&self, user_id: Uuid, id: Uuid, patch: &CardPatch) -> Result<Card, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut card = fetch_card(&mut tx, user_id, id).await?;
        if patch.is_empty() {
            return Ok(card);
        }

        if let Some(title) = &patch.title {
            card.title = title.as_str().to_owned();
        }
        if let Some(description) = &patch.description {
            card.description = description.as_str().to_owned();
        }
        if let Some(labels) = &patch.labels {
            card.labels = labels.as_slice().to_vec();
        }
        if let Some(due_date) = patch.due_date {
            card.due_date = due_date;
        }
        card.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE cards
            SET title = ?, description = ?, labels = ?, due_date = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&card.title)
        .bind(&card.description)
        .bind(labels_json(&card.labels))
        .bind(card.due_date)
        .bind(card.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(card)
    }

    /// Move a card to `position` in `column_id` (appended when `None`),
    /// reindexing both columns and syncing a linked expense's status.
    pub async fn move_card(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        column_id: Uuid,
        position: Option<usize>,
    ) -> Result<(Card, MovePlan), DbError> {
        let mut tx = self.pool.begin().await?;
        let card = fetch_card(&mut tx, user_id, card_id).await?;
        let layout = load_layout(&mut tx, user_id, card.board_id).await?;

        let plan = plan_move(&layout, card_id, column_id, position.unwrap_or(usize::MAX))?;
        write_placements(&mut tx, user_id, &plan.updates).await?;

        if let Some(expense_id) = card.expense_id {
            let column = fetch_column(&mut tx, user_id, column_id).await?;
            match ExpenseStatus::from_column_name(&column.name) {
                Some(status) => set_status(&mut *tx, user_id, expense_id, status).await?,
                None => tracing::debug!(column = %column.name, "Column has no status mapping"),
            }
        }

        let card = fetch_card(&mut tx, user_id, card_id).await?;
        tx.commit().await?;

        tracing::debug!(
            %card_id,
            from = %plan.from_column,
            to = %plan.to_column,
            order = plan.order,
            updated = plan.updates.len(),
            "Moved card"
        );
        Ok((card, plan))
    }

    /// Move a card to wherever it was released: over a column appends, over
    /// a card takes that card's slot.
    pub async fn drop_card(
        &self,
        user_id: Uuid,
        card_id: Uuid,
        over_id: Uuid,
    ) -> Result<(Card, MovePlan), DbError> {
        let target = {
            let mut conn = self.pool.acquire().await?;
            let card = fetch_card(&mut conn, user_id, card_id).await?;
            let layout = load_layout(&mut conn, user_id, card.board_id).await?;
            resolve_drop(&layout, card_id, over_id)
                .ok_or_else(|| DbError::not_found("drop target", over_id))?
        };

        self.move_card(user_id, card_id, target.column, Some(target.position))
            .await
    }

    /// Delete a card, unlink its expense and close the gap in its column.
    pub async fn delete(&self, user_id: Uuid, card_id: Uuid) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;
        let card = fetch_card(&mut tx, user_id, card_id).await?;
        let layout = load_layout(&mut tx, user_id, card.board_id).await?;
        let updates = plan_removal(&layout, card_id)?;

        if let Some(expense_id) = card.expense_id {
            set_card_link(&mut *tx, user_id, expense_id, None).await?;
        }
        sqlx::query("DELETE FROM cards WHERE id = ? AND user_id = ?")
            .bind(card_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        write_placements(&mut tx, user_id, &updates).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Put an expense on a board as a card in the column matching its status.
    pub async fn link_expense(
        &self,
        user_id: Uuid,
        expense_id: Uuid,
        board_id: Uuid,
    ) -> Result<Card, DbError> {
        let mut tx = self.pool.begin().await?;
        fetch_board(&mut *tx, user_id, board_id).await?;
        let expense = fetch_expense(&mut *tx, user_id, expense_id).await?;
        ensure_unlinked(&expense)?;

        let columns = ensure_default_columns(&mut tx, user_id, board_id).await?;
        let fallback = DEFAULT_COLUMNS[0].0;
        let column = columns
            .iter()
            .find(|c| c.name == expense.status.column_name())
            .or_else(|| columns.iter().find(|c| c.name == fallback))
            .ok_or_else(|| DbError::not_found("column", fallback))?;

        let label: String = expense.category.chars().take(Label::MAX_LEN).collect();
        let new = NewCard {
            column_id: column.id,
            title: CardTitle::new(&expense.title)?,
            description: Description::new(&format!(
                "{} {} - {}",
                expense.amount, expense.currency, expense.category
            ))?,
            labels: Labels::new([label])?,
            order: None,
            due_date: None,
            expense_id: Some(expense_id),
        };
        let card = insert_card(&mut tx, user_id, board_id, &new).await?;
        set_card_link(&mut *tx, user_id, expense_id, Some(card.id)).await?;

        tx.commit().await?;
        tracing::info!(%expense_id, card_id = %card.id, column = %column.name, "Linked expense to board");
        Ok(card)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::test_support::setup;
    use crate::db::repos::{BoardRepo, ExpenseRepo};
    use expensectl_core::models::{BoardWithColumns, Money, NewExpense};

    fn new_card(column_id: Uuid, title: &str) -> NewCard {
        NewCard {
            column_id,
            title: CardTitle::new(title).unwrap(),
            description: Description::new("").unwrap(),
            labels: Labels::default(),
            order: None,
            due_date: None,
            expense_id: None,
        }
    }

    fn titles(board: &BoardWithColumns, column: &str) -> Vec<String> {
        board
            .column_named(column)
            .unwrap()
            .cards
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }

    fn orders(board: &BoardWithColumns, column: &str) -> Vec<u32> {
        board
            .column_named(column)
            .unwrap()
            .cards
            .iter()
            .map(|c| c.order)
            .collect()
    }

    async fn expense(pool: &SqlitePool, user: Uuid, status: Option<ExpenseStatus>) -> Uuid {
        ExpenseRepo::new(pool)
            .create(
                user,
                &NewExpense::new(
                    "Hotel",
                    "Travel",
                    Money::from_cents(12050),
                    "USD",
                    "2024-05-01".parse().unwrap(),
                    None,
                    status,
                )
                .unwrap(),
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn create_appends_or_inserts() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let to_log = board.column_named("To Log").unwrap().column.id;
        let repo = CardRepo::new(&pool);

        let a = repo.create(user, board.board.id, &new_card(to_log, "a")).await.unwrap();
        let b = repo.create(user, board.board.id, &new_card(to_log, "b")).await.unwrap();
        assert_eq!((a.order, b.order), (0, 1));

        let mut front = new_card(to_log, "front");
        front.order = Some(0);
        let front = repo.create(user, board.board.id, &front).await.unwrap();
        assert_eq!(front.order, 0);

        let board = BoardRepo::new(&pool).get_with_data(user, board.board.id).await.unwrap();
        assert_eq!(titles(&board, "To Log"), ["front", "a", "b"]);
        assert_eq!(orders(&board, "To Log"), [0, 1, 2]);
    }

    #[tokio::test]
    async fn create_rejects_column_of_other_board() {
        let (pool, user) = setup().await;
        let boards = BoardRepo::new(&pool);
        let first = boards.initialize_default(user).await.unwrap();
        let second = boards.initialize_default(user).await.unwrap();
        let foreign = second.columns[0].column.id;

        let err = CardRepo::new(&pool)
            .create(user, first.board.id, &new_card(foreign, "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "column", .. }));
    }

    #[tokio::test]
    async fn move_reindexes_and_syncs_status() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let to_log = board.column_named("To Log").unwrap().column.id;
        let paid = board.column_named("Paid").unwrap().column.id;
        let repo = CardRepo::new(&pool);

        let expense_id = expense(&pool, user, None).await;
        let linked = repo.link_expense(user, expense_id, board_id).await.unwrap();
        repo.create(user, board_id, &new_card(to_log, "other")).await.unwrap();
        repo.create(user, board_id, &new_card(paid, "paid-1")).await.unwrap();

        let (moved, plan) = repo.move_card(user, linked.id, paid, Some(0)).await.unwrap();
        assert_eq!(moved.column_id, paid);
        assert_eq!(moved.order, 0);
        assert!(plan.changes_column());

        let board = BoardRepo::new(&pool).get_with_data(user, board_id).await.unwrap();
        assert_eq!(titles(&board, "To Log"), ["other"]);
        assert_eq!(orders(&board, "To Log"), [0]);
        assert_eq!(titles(&board, "Paid"), ["Hotel", "paid-1"]);
        assert_eq!(orders(&board, "Paid"), [0, 1]);

        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.status, ExpenseStatus::Cleared);
    }

    #[tokio::test]
    async fn custom_column_leaves_status_alone() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let custom = crate::db::repos::ColumnRepo::new(&pool)
            .create(
                user,
                board_id,
                &expensectl_core::models::ColumnName::new("Someday").unwrap(),
                None,
            )
            .await
            .unwrap();
        let repo = CardRepo::new(&pool);
        let expense_id = expense(&pool, user, Some(ExpenseStatus::Pending)).await;
        let card = repo.link_expense(user, expense_id, board_id).await.unwrap();

        repo.move_card(user, card.id, custom.id, None).await.unwrap();
        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.status, ExpenseStatus::Pending);
    }

    #[tokio::test]
    async fn same_column_move_and_drop() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let to_log = board.column_named("To Log").unwrap().column.id;
        let verify = board.column_named("Verify").unwrap().column.id;
        let repo = CardRepo::new(&pool);

        let a = repo.create(user, board_id, &new_card(to_log, "a")).await.unwrap();
        repo.create(user, board_id, &new_card(to_log, "b")).await.unwrap();
        let c = repo.create(user, board_id, &new_card(to_log, "c")).await.unwrap();

        repo.move_card(user, a.id, to_log, Some(2)).await.unwrap();
        let view = BoardRepo::new(&pool).get_with_data(user, board_id).await.unwrap();
        assert_eq!(titles(&view, "To Log"), ["b", "c", "a"]);

        // over a column: append
        repo.drop_card(user, c.id, verify).await.unwrap();
        // over a card: take its slot
        let (dropped, _) = repo.drop_card(user, a.id, c.id).await.unwrap();
        assert_eq!(dropped.column_id, verify);
        assert_eq!(dropped.order, 0);

        let view = BoardRepo::new(&pool).get_with_data(user, board_id).await.unwrap();
        assert_eq!(titles(&view, "To Log"), ["b"]);
        assert_eq!(titles(&view, "Verify"), ["a", "c"]);
        assert_eq!(orders(&view, "Verify"), [0, 1]);

        let err = repo.drop_card(user, a.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { resource: "drop target", .. }));
    }

    #[tokio::test]
    async fn delete_unlinks_and_reindexes() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let repo = CardRepo::new(&pool);

        let expense_id = expense(&pool, user, None).await;
        let linked = repo.link_expense(user, expense_id, board_id).await.unwrap();
        let to_log = linked.column_id;
        repo.create(user, board_id, &new_card(to_log, "after")).await.unwrap();

        repo.delete(user, linked.id).await.unwrap();

        let view = BoardRepo::new(&pool).get_with_data(user, board_id).await.unwrap();
        assert_eq!(titles(&view, "To Log"), ["after"]);
        assert_eq!(orders(&view, "To Log"), [0]);
        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.kanban_card_id, None);
    }

    #[tokio::test]
    async fn link_expense_uses_status_column() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool)
            .create(user, &expensectl_core::models::BoardName::new("Bare").unwrap(), false)
            .await
            .unwrap();
        let repo = CardRepo::new(&pool);
        let expense_id = expense(&pool, user, Some(ExpenseStatus::Reimbursable)).await;

        let card = repo.link_expense(user, expense_id, board.board.id).await.unwrap();
        assert_eq!(card.title, "Hotel");
        assert_eq!(card.description, "120.50 USD - Travel");
        assert_eq!(card.labels, ["Travel"]);
        assert_eq!(card.expense_id, Some(expense_id));

        let view = BoardRepo::new(&pool).get_with_data(user, board.board.id).await.unwrap();
        assert_eq!(view.columns.len(), 4);
        assert_eq!(titles(&view, "Reimburse"), ["Hotel"]);

        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.kanban_card_id, Some(card.id));

        let err = repo.link_expense(user, expense_id, board.board.id).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));
    }

    #[tokio::test]
    async fn create_rejects_already_linked_expense() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let to_log = board.column_named("To Log").unwrap().column.id;
        let repo = CardRepo::new(&pool);
        let expense_id = expense(&pool, user, None).await;
        let first = repo.link_expense(user, expense_id, board_id).await.unwrap();

        let mut second = new_card(to_log, "duplicate");
        second.expense_id = Some(expense_id);
        let err = repo.create(user, board_id, &second).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict(_)));

        let view = BoardRepo::new(&pool).get_with_data(user, board_id).await.unwrap();
        assert_eq!(titles(&view, "To Log"), ["Hotel"]);
        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.kanban_card_id, Some(first.id));
    }

    #[tokio::test]
    async fn same_column_move_resyncs_status() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let board_id = board.board.id;
        let to_log = board.column_named("To Log").unwrap().column.id;
        let repo = CardRepo::new(&pool);
        let expense_id = expense(&pool, user, None).await;
        let card = repo.link_expense(user, expense_id, board_id).await.unwrap();
        repo.create(user, board_id, &new_card(to_log, "other")).await.unwrap();

        let patch = expensectl_core::models::ExpensePatch {
            status: Some(ExpenseStatus::Pending),
            ..Default::default()
        };
        ExpenseRepo::new(&pool).update(user, expense_id, &patch).await.unwrap();

        let (_, plan) = repo.move_card(user, card.id, to_log, Some(1)).await.unwrap();
        assert!(!plan.changes_column());
        let expense = ExpenseRepo::new(&pool).get(user, expense_id).await.unwrap();
        assert_eq!(expense.status, ExpenseStatus::Logged);
    }

    #[tokio::test]
    async fn update_applies_patch() {
        let (pool, user) = setup().await;
        let board = BoardRepo::new(&pool).initialize_default(user).await.unwrap();
        let to_log = board.columns[0].column.id;
        let repo = CardRepo::new(&pool);
        let card = repo.create(user, board.board.id, &new_card(to_log, "a")).await.unwrap();

        let patch = CardPatch {
            labels: Some(Labels::new(["urgent"]).unwrap()),
            due_date: Some("2024-06-30".parse().ok()),
            ..Default::default()
        };
        let updated = repo.update(user, card.id, &patch).await.unwrap();
        assert_eq!(updated.labels, ["urgent"]);
        assert_eq!(updated.due_date, "2024-06-30".parse().ok());
        assert_eq!(repo.get(user, card.id).await.unwrap().labels, ["urgent"]);

        let cleared = repo
            .update(
                user,
                card.id,
                &CardPatch {
                    due_date: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.due_date, None);
    }
}
