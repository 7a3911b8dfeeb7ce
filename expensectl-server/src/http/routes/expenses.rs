//! Expense endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use expensectl_core::models::{
    Card, Category, CurrencyCode, Description, Expense, ExpensePatch, ExpenseStatus,
    ExpenseTitle, Money, NewExpense, Paginated, Pagination, PaginationParams,
};
use expensectl_core::reports::ExpenseFilter;

use crate::db::repos::{CardRepo, ExpenseRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;

/// Create expense request
#[derive(Deserialize)]
pub struct CreateExpenseRequest {
    pub title: String,
    pub category: String,
    pub amount: Money,
    /// Falls back to the server's default currency
    pub currency: Option<String>,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub status: Option<ExpenseStatus>,
}

/// Partial expense update
#[derive(Deserialize, Default)]
pub struct UpdateExpenseRequest {
    pub title: Option<String>,
    pub category: Option<String>,
    pub amount: Option<Money>,
    pub currency: Option<String>,
    pub date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: Option<ExpenseStatus>,
}

impl UpdateExpenseRequest {
    fn into_patch(self) -> Result<ExpensePatch, ApiError> {
        Ok(ExpensePatch {
            title: self.title.as_deref().map(ExpenseTitle::new).transpose()?,
            category: self.category.as_deref().map(Category::new).transpose()?,
            amount: self.amount.map(Money::require_positive).transpose()?,
            currency: self.currency.as_deref().map(CurrencyCode::new).transpose()?,
            date: self.date,
            description: self.description.as_deref().map(Description::new).transpose()?,
            status: self.status,
        })
    }
}

#[derive(Deserialize)]
pub struct LinkCardRequest {
    pub board_id: Uuid,
}

/// GET /expenses - filtered, paginated, newest first
async fn list_expenses(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(filter): Query<ExpenseFilter>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<Expense>>, ApiError> {
    let page = Pagination::from(params);
    let result = ExpenseRepo::new(&state.pool)
        .list(auth.user.id, &filter, page)
        .await?;
    Ok(Json(result))
}

/// POST /expenses - record an expense
async fn create_expense(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let new = NewExpense::new(
        &req.title,
        &req.category,
        req.amount,
        req.currency.as_deref().unwrap_or(&state.default_currency),
        req.date,
        req.description.as_deref(),
        req.status,
    )?;
    let expense = ExpenseRepo::new(&state.pool).create(auth.user.id, &new).await?;

    Ok((StatusCode::CREATED, Json(expense)))
}

/// GET /expenses/{id}
async fn get_expense(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Expense>, ApiError> {
    let expense = ExpenseRepo::new(&state.pool).get(auth.user.id, id).await?;
    Ok(Json(expense))
}

/// PATCH /expenses/{id} - update the given fields only
async fn update_expense(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UpdateExpenseRequest>,
) -> Result<Json<Expense>, ApiError> {
    let patch = req.into_patch()?;
    let expense = ExpenseRepo::new(&state.pool)
        .update(auth.user.id, id, &patch)
        .await?;
    Ok(Json(expense))
}

/// DELETE /expenses/{id}
async fn delete_expense(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    ExpenseRepo::new(&state.pool).delete(auth.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /expenses/{id}/card - put the expense on a board
async fn link_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<LinkCardRequest>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let card = CardRepo::new(&state.pool)
        .link_expense(auth.user.id, id, req.board_id)
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Expense routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses", get(list_expenses).post(create_expense))
        .route(
            "/expenses/{id}",
            get(get_expense).patch(update_expense).delete(delete_expense),
        )
        .route("/expenses/{id}/card", post(link_card))
}
