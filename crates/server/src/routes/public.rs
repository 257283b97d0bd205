//! Read-only endpoints for the public site. No auth.

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::{
    Collection,
    models::{media::Media, page::Page, story::Story},
};
use serde::Serialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use super::stories::StoryWithImages;
use crate::{AppState, error::ApiError};

/// Everything the home page renders, each list in curated order.
#[derive(Debug, Serialize, TS)]
pub struct HomeView {
    pub masthead: Vec<Media>,
    pub featured: Vec<Media>,
    pub featured_stories: Vec<Story>,
}

/// GET /api/public/home
pub async fn home(
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<HomeView>>, ApiError> {
    let pool = state.pool();
    let view = HomeView {
        masthead: Media::find_in_collection(pool, Collection::Masthead).await?,
        featured: Media::find_in_collection(pool, Collection::FeaturedMedia).await?,
        featured_stories: Story::find_all(pool, true).await?,
    };
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// GET /api/public/stories/{slug}
pub async fn story_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<StoryWithImages>>, ApiError> {
    let story = Story::find_by_slug(state.pool(), &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Story \"{slug}\" not found")))?;
    let view = StoryWithImages::load(state.pool(), story).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// GET /api/public/pages/{slug}
pub async fn page_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<ResponseJson<ApiResponse<Page>>, ApiError> {
    let page = Page::find(state.pool(), &slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page \"{slug}\" not found")))?;
    Ok(ResponseJson(ApiResponse::success(page)))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/home", get(home))
        .route("/stories/{slug}", get(story_by_slug))
        .route("/pages/{slug}", get(page_by_slug))
}
