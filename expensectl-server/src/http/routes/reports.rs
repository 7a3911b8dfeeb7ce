//! Dashboard report endpoint

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use chrono::Utc;

use expensectl_core::reports::{summarize, ExpenseFilter, Summary};

use crate::db::repos::ExpenseRepo;
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;

/// GET /reports/summary - stats and chart breakdowns for the filtered set.
///
/// Monthly growth always compares against the user's full history.
async fn summary(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(filter): Query<ExpenseFilter>,
) -> Result<Json<Summary>, ApiError> {
    let expenses = ExpenseRepo::new(&state.pool)
        .list_all(auth.user.id, &ExpenseFilter::default())
        .await?;

    let today = Utc::now().date_naive();
    Ok(Json(summarize(&expenses, &filter, today)))
}

/// Report routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/reports/summary", get(summary))
}
