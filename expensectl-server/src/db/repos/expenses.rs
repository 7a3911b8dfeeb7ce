//! Expense repository
//!
//! - list: filters pushed into SQL, `COUNT(*) OVER()` for the total
//! - search: matches `search_text`, lower-cased in Rust at write time since
//!   SQLite's `LOWER` only folds ASCII
//! - bulk create: one transaction, all or nothing

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Executor, FromRow, QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

use expensectl_core::models::{
    Expense, ExpensePatch, ExpenseStatus, Money, NewExpense, Paginated, Pagination,
};
use expensectl_core::reports::ExpenseFilter;

use super::DbError;

pub(crate) const EXPENSE_COLUMNS: &str = "id, user_id, title, category, amount_cents, currency, \
     date, description, status, kanban_card_id, created_at, updated_at";

#[derive(Debug, FromRow)]
pub(crate) struct ExpenseRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    category: String,
    amount_cents: i64,
    currency: String,
    date: NaiveDate,
    description: String,
    status: String,
    kanban_card_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ExpenseRow> for Expense {
    type Error = DbError;

    fn try_from(r: ExpenseRow) -> Result<Self, DbError> {
        let status = ExpenseStatus::from_str(&r.status).map_err(|_| DbError::Corrupt {
            field: "status",
            value: r.status.clone(),
        })?;

        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            category: r.category,
            amount: Money::from_cents(r.amount_cents),
            currency: r.currency,
            date: r.date,
            description: r.description,
            status,
            kanban_card_id: r.kanban_card_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ListedRow {
    #[sqlx(flatten)]
    expense: ExpenseRow,
    total: i64,
}

/// Escape LIKE wildcards; pairs with `ESCAPE '\'`
fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Folded title and description, separated so a term cannot span both
fn search_text(title: &str, description: &str) -> String {
    format!("{}\u{1f}{}", title.to_lowercase(), description.to_lowercase())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &ExpenseFilter) {
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", escape_like(&term.to_lowercase()));
        qb.push(" AND search_text LIKE ")
            .push_bind(pattern)
            .push(" ESCAPE '\\'");
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = &filter.category {
        qb.push(" AND category = ").push_bind(category.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND date >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND date <= ").push_bind(to);
    }
}

pub(crate) async fn fetch_expense<'e, E>(
    executor: E,
    user_id: Uuid,
    id: Uuid,
) -> Result<Expense, DbError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {EXPENSE_COLUMNS} FROM expenses WHERE id = ? AND user_id = ?");
    let row: Option<ExpenseRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    row.ok_or_else(|| DbError::not_found("expense", id))?
        .try_into()
}

async fn insert_expense<'e, E>(
    executor: E,
    user_id: Uuid,
    new: &NewExpense,
) -> Result<Expense, DbError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let now = Utc::now();
    let sql = format!(
        r#"
        INSERT INTO expenses
            (id, user_id, title, category, amount_cents, currency, date,
             description, status, kanban_card_id, search_text, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?)
        RETURNING {EXPENSE_COLUMNS}
        "#
    );
    let row: ExpenseRow = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(new.title.as_str())
        .bind(new.category.as_str())
        .bind(new.amount.cents())
        .bind(new.currency.as_str())
        .bind(new.date)
        .bind(new.description.as_str())
        .bind(new.status.as_str())
        .bind(search_text(new.title.as_str(), new.description.as_str()))
        .bind(now)
        .bind(now)
        .fetch_one(executor)
        .await?;

    row.try_into()
}

/// Point an expense at a card, or clear the link
pub(crate) async fn set_card_link<'e, E>(
    executor: E,
    user_id: Uuid,
    expense_id: Uuid,
    card_id: Option<Uuid>,
) -> Result<(), DbError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE expenses SET kanban_card_id = ?, updated_at = ? WHERE id = ? AND user_id = ?",
    )
    .bind(card_id)
    .bind(Utc::now())
    .bind(expense_id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn set_status<'e, E>(
    executor: E,
    user_id: Uuid,
    expense_id: Uuid,
    status: ExpenseStatus,
) -> Result<(), DbError>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE expenses SET status = ?, updated_at = ? WHERE id = ? AND user_id = ?")
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(expense_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Expense repository
pub struct ExpenseRepo<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ExpenseRepo<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// One page of matching expenses, newest first.
    pub async fn list(
        &self,
        user_id: Uuid,
        filter: &ExpenseFilter,
        page: Pagination,
    ) -> Result<Paginated<Expense>, DbError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EXPENSE_COLUMNS}, COUNT(*) OVER() AS total FROM expenses WHERE user_id = "
        ));
        qb.push_bind(user_id);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC LIMIT ")
            .push_bind(page.limit() as i64)
            .push(" OFFSET ")
            .push_bind(page.offset() as i64);

        let rows: Vec<ListedRow> = qb.build_query_as().fetch_all(self.pool).await?;

        let total = rows.first().map(|r| r.total).unwrap_or(0);
        let items = rows
            .into_iter()
            .map(|r| Expense::try_from(r.expense))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Paginated {
            items,
            total,
            page: page.page,
            per_page: page.per_page,
        })
    }

    /// Every matching expense, newest first
    pub async fn list_all(&self, user_id: Uuid, filter: &ExpenseFilter) -> Result<Vec<Expense>, DbError> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {EXPENSE_COLUMNS} FROM expenses WHERE user_id = "
        ));
        qb.push_bind(user_id);
        push_filter(&mut qb, filter);
        qb.push(" ORDER BY created_at DESC, rowid DESC");

        let rows: Vec<ExpenseRow> = qb.build_query_as().fetch_all(self.pool).await?;
        rows.into_iter().map(Expense::try_from).collect()
    }

    pub async fn by_category(&self, user_id: Uuid, category: &str) -> Result<Vec<Expense>, DbError> {
        let filter = ExpenseFilter {
            category: Some(category.to_owned()),
            ..Default::default()
        };
        self.list_all(user_id, &filter).await
    }

    /// Expenses dated within `from..=to`
    pub async fn by_date_range(
        &self,
        user_id: Uuid,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Expense>, DbError> {
        let filter = ExpenseFilter {
            from: Some(from),
            to: Some(to),
            ..Default::default()
        };
        self.list_all(user_id, &filter).await
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<Expense, DbError> {
        fetch_expense(self.pool, user_id, id).await
    }

    pub async fn create(&self, user_id: Uuid, new: &NewExpense) -> Result<Expense, DbError> {
        insert_expense(self.pool, user_id, new).await
    }

    /// Insert a batch in one transaction; nothing is stored if any insert fails.
    pub async fn create_many(
        &self,
        user_id: Uuid,
        batch: &[NewExpense],
    ) -> Result<Vec<Expense>, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(batch.len());
        for new in batch {
            created.push(insert_expense(&mut *tx, user_id, new).await?);
        }
        tx.commit().await?;

        tracing::info!(%user_id, count = created.len(), "Imported expenses");
        Ok(created)
    }

    /// Apply a partial update. An empty patch returns the stored expense.
    pub async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        patch: &ExpensePatch,
    ) -> Result<Expense, DbError> {
        let mut tx = self.pool.begin().await?;
        let mut expense = fetch_expense(&mut *tx, user_id, id).await?;
        if patch.is_empty() {
            return Ok(expense);
        }

        patch.apply(&mut expense);
        expense.updated_at = Utc::now();

        sqlx::query(
            r#"
            UPDATE expenses
            SET title = ?, category = ?, amount_cents = ?, currency = ?, date = ?,
                description = ?, status = ?, search_text = ?, updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&expense.title)
        .bind(&expense.category)
        .bind(expense.amount.cents())
        .bind(&expense.currency)
        .bind(expense.date)
        .bind(&expense.description)
        .bind(expense.status.as_str())
        .bind(search_text(&expense.title, &expense.description))
        .bind(expense.updated_at)
        .bind(id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(expense)
    }

    /// Delete an expense. A linked card stays on its board, unlinked.
    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("expense", id));
        }
        Ok(())
    }
}
