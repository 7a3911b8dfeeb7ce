//! Board endpoints
//!
//! Columns and cards are created under their board; everything else about
//! them lives in `columns` and `cards`.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use expensectl_core::models::{
    Board, BoardName, BoardWithColumns, Card, CardTitle, Column, ColumnName, Description, Labels,
};

use crate::db::repos::{BoardRepo, CardRepo, ColumnRepo, NewCard};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;

/// Create board request
#[derive(Deserialize)]
pub struct CreateBoardRequest {
    pub name: String,
    /// Seed the To Log, Verify, Paid and Reimburse columns
    #[serde(default)]
    pub default_columns: bool,
}

#[derive(Deserialize)]
pub struct CreateColumnRequest {
    pub name: String,
    pub order: Option<u32>,
}

#[derive(Deserialize)]
pub struct CreateCardRequest {
    pub column_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub order: Option<u32>,
    pub due_date: Option<NaiveDate>,
    pub expense_id: Option<Uuid>,
}

impl CreateCardRequest {
    fn into_new_card(self) -> Result<NewCard, ApiError> {
        Ok(NewCard {
            column_id: self.column_id,
            title: CardTitle::new(&self.title)?,
            description: Description::new(self.description.as_deref().unwrap_or(""))?,
            labels: Labels::new(&self.labels)?,
            order: self.order,
            due_date: self.due_date,
            expense_id: self.expense_id,
        })
    }
}

/// GET /boards - the user's boards, newest first
async fn list_boards(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<Board>>, ApiError> {
    let boards = BoardRepo::new(&state.pool).list(auth.user.id).await?;
    Ok(Json(boards))
}

/// POST /boards - create a board
async fn create_board(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(req): Json<CreateBoardRequest>,
) -> Result<(StatusCode, Json<BoardWithColumns>), ApiError> {
    let name = BoardName::new(&req.name)?;
    let board = BoardRepo::new(&state.pool)
        .create(auth.user.id, &name, req.default_columns)
        .await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// POST /boards/default - the "Expense Tracker" board with workflow columns
async fn create_default_board(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<(StatusCode, Json<BoardWithColumns>), ApiError> {
    let board = BoardRepo::new(&state.pool)
        .initialize_default(auth.user.id)
        .await?;
    Ok((StatusCode::CREATED, Json(board)))
}

/// GET /boards/{id} - board with its columns and cards
async fn get_board(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<BoardWithColumns>, ApiError> {
    let board = BoardRepo::new(&state.pool)
        .get_with_data(auth.user.id, id)
        .await?;
    Ok(Json(board))
}

/// DELETE /boards/{id}
async fn delete_board(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    BoardRepo::new(&state.pool).delete(auth.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /boards/{id}/columns
async fn list_columns(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<Column>>, ApiError> {
    let columns = ColumnRepo::new(&state.pool).list(auth.user.id, id).await?;
    Ok(Json(columns))
}

/// POST /boards/{id}/columns - appended unless `order` is given
async fn create_column(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<Column>), ApiError> {
    let name = ColumnName::new(&req.name)?;
    let column = ColumnRepo::new(&state.pool)
        .create(auth.user.id, id, &name, req.order)
        .await?;
    Ok((StatusCode::CREATED, Json(column)))
}

/// GET /boards/{id}/cards
async fn list_cards(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<Json<Vec<Card>>, ApiError> {
    let cards = CardRepo::new(&state.pool).list(auth.user.id, id).await?;
    Ok(Json(cards))
}

/// POST /boards/{id}/cards - appended to its column unless `order` is given
async fn create_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), ApiError> {
    let new = req.into_new_card()?;
    let card = CardRepo::new(&state.pool)
        .create(auth.user.id, id, &new)
        .await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// Board routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/boards", get(list_boards).post(create_board))
        .route("/boards/default", post(create_default_board))
        .route("/boards/{id}", get(get_board).delete(delete_board))
        .route("/boards/{id}/columns", get(list_columns).post(create_column))
        .route("/boards/{id}/cards", get(list_cards).post(create_card))
}
