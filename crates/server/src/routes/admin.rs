use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use db::schema::{TableReport, table_report};
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

/// GET /api/admin/tables - Compare the live schema with the expected tables
pub async fn check_tables(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<TableReport>>, ApiError> {
    let report = table_report(state.pool()).await?;
    if !report.all_present {
        tracing::warn!(missing = ?report.missing, "Schema is missing tables");
    }
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/admin/tables", get(check_tables))
}
