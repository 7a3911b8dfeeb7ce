//! Column endpoints

use std::sync::Arc;

use axum::{extract::State, routing::patch, Json, Router};
use serde::Deserialize;

use expensectl_core::models::{Column, ColumnName};

use crate::db::repos::ColumnRepo;
use crate::http::error::ApiError;
use crate::http::extractors::{AuthUser, ValidUuid};
use crate::http::server::AppState;

#[derive(Deserialize)]
pub struct UpdateColumnRequest {
    pub name: Option<String>,
    /// New position among the board's columns, clamped to the end
    pub order: Option<u32>,
}

/// PATCH /columns/{id} - rename and/or move a column
async fn update_column(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    ValidUuid(id): ValidUuid,
    Json(req): Json<UpdateColumnRequest>,
) -> Result<Json<Column>, ApiError> {
    let name = req.name.as_deref().map(ColumnName::new).transpose()?;
    let repo = ColumnRepo::new(&state.pool);

    if let Some(name) = &name {
        repo.rename(auth.user.id, id, name).await?;
    }
    if let Some(order) = req.order {
        repo.update_order(auth.user.id, id, order).await?;
    }

    Ok(Json(repo.get(auth.user.id, id).await?))
}

/// Column routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/columns/{id}", patch(update_column))
}
