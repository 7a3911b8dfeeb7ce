//! Card endpoints: edit, delete, move and drop

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use expensectl_core::models::{Card, CardTitle, Description, Labels};
use expensectl_core::reorder::MovePlan;

use crate::db::repos::{CardPatch, CardRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;

/// Tell an explicit `null` apart from a missing field
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial card update; `"due_date": null` clears the date
#[derive(Deserialize, Default)]
pub struct UpdateCardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub labels: Option<Vec<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl UpdateCardRequest {
    fn into_patch(self) -> Result<CardPatch, ApiError> {
        Ok(CardPatch {
            title: self.title.as_deref().map(CardTitle::new).transpose()?,
            description: self.description.as_deref().map(Description::new).transpose()?,
            labels: self.labels.map(Labels::new).transpose()?,
            due_date: self.due_date,
        })
    }
}

#[derive(Deserialize)]
pub struct MoveCardRequest {
    pub column_id: Uuid,
    /// Position in the target column; appended when absent
    pub order: Option<usize>,
}

#[derive(Deserialize)]
pub struct DropCardRequest {
    /// Column or card the card was released over
    pub over_id: Uuid,
}

/// Moved card plus every placement that was written
#[derive(Serialize)]
pub struct MoveResponse {
    pub card: Card,
    pub plan: MovePlan,
}

/// PATCH /cards/{id}
async fn update_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UpdateCardRequest>,
) -> Result<Json<Card>, ApiError> {
    let patch = req.into_patch()?;
    let card = CardRepo::new(&state.pool)
        .update(auth.user.id, id, &patch)
        .await?;
    Ok(Json(card))
}

/// DELETE /cards/{id} - a linked expense is kept and unlinked
async fn delete_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
) -> Result<StatusCode, ApiError> {
    CardRepo::new(&state.pool).delete(auth.user.id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /cards/{id}/move
async fn move_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<MoveCardRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let (card, plan) = CardRepo::new(&state.pool)
        .move_card(auth.user.id, id, req.column_id, req.order)
        .await?;
    Ok(Json(MoveResponse { card, plan }))
}

/// POST /cards/{id}/drop
async fn drop_card(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<DropCardRequest>,
) -> Result<Json<MoveResponse>, ApiError> {
    let (card, plan) = CardRepo::new(&state.pool)
        .drop_card(auth.user.id, id, req.over_id)
        .await?;
    Ok(Json(MoveResponse { card, plan }))
}

/// Card routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/cards/{id}", patch(update_card).delete(delete_card))
        .route("/cards/{id}/move", post(move_card))
        .route("/cards/{id}/drop", post(drop_card))
}
