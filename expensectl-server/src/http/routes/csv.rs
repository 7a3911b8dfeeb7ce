//! CSV export, import and template endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use expensectl_core::csv::{import_expenses, template, to_csv};
use expensectl_core::reports::{ExpenseFilter, Period};

use crate::db::repos::ExpenseRepo;
use crate::http::error::ApiError;
use crate::http::extractors::AuthUser;
use crate::http::server::AppState;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

#[derive(Deserialize, Default)]
pub struct ExportParams {
    #[serde(default)]
    pub period: Period,
}

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: usize,
}

fn csv_attachment(filename: &str, body: String) -> Result<Response, ApiError> {
    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))
        .map_err(|e| ApiError::internal(format!("bad export filename {filename:?}: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(CSV_CONTENT_TYPE));
    headers.insert(header::CONTENT_DISPOSITION, disposition);
    Ok((headers, body).into_response())
}

/// GET /expenses/export - matching expenses as a CSV download
async fn export_csv(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(mut filter): Query<ExpenseFilter>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ApiError> {
    let today = Utc::now().date_naive();
    params.period.restrict(&mut filter, today);

    let expenses = ExpenseRepo::new(&state.pool)
        .list_all(auth.user.id, &filter)
        .await?;
    tracing::debug!(user_id = %auth.user.id, count = expenses.len(), "Exporting expenses");

    csv_attachment(&params.period.filename(today), to_csv(&expenses))
}

/// POST /expenses/import - all rows are stored, or none
async fn import_csv(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    body: String,
) -> Result<(StatusCode, Json<ImportResponse>), ApiError> {
    let drafts = import_expenses(&body)?;
    let created = ExpenseRepo::new(&state.pool)
        .create_many(auth.user.id, &drafts)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ImportResponse {
            imported: created.len(),
        }),
    ))
}

/// GET /expenses/template - header plus one sample row
async fn csv_template() -> Result<Response, ApiError> {
    csv_attachment("expense_template.csv", template())
}

/// CSV routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/expenses/export", get(export_csv))
        .route("/expenses/import", post(import_csv))
        .route("/expenses/template", get(csv_template))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn template_is_a_download() {
        let response = csv_template().await.unwrap();
        assert_eq!(response.headers()[header::CONTENT_TYPE], CSV_CONTENT_TYPE);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"expense_template.csv\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.starts_with("title,category,amount,currency,date,description"));
    }

    #[test]
    fn export_period_defaults_to_all() {
        let params: ExportParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.period, Period::All);
    }
}
