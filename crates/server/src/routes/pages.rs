use axum::{
    Json, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::page::{Page, UpsertPage};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

const DEFAULT_PAGE: &str = "about";

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub slug: Option<String>,
}

/// GET /api/pages - Page content for the editor; `null` when not written yet
pub async fn get_page(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<ResponseJson<ApiResponse<Option<Page>>>, ApiError> {
    let slug = query.slug.as_deref().unwrap_or(DEFAULT_PAGE);
    let page = Page::find(state.pool(), slug).await?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

/// PUT /api/pages - Create or replace a page
pub async fn put_page(
    State(state): State<AppState>,
    Json(payload): Json<UpsertPage>,
) -> Result<ResponseJson<ApiResponse<Page>>, ApiError> {
    if payload.slug.trim().is_empty() {
        return Err(ApiError::BadRequest("slug is required".to_string()));
    }
    let page = Page::upsert(state.pool(), &payload.slug, &payload.content).await?;
    tracing::info!(slug = %page.slug, "Saved page");
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/pages", get(get_page).put(put_page))
}
