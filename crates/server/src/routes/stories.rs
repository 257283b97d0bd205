use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::{
    Collection, Member,
    models::{
        story::{CreateStory, Story, UpdateStory},
        story_image::StoryImage,
    },
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use ts_rs::TS;
use utils::response::ApiResponse;

use super::{AffectedRows, IdList, require_ids, story_images};
use crate::{AppState, error::ApiError, middleware::load_story_middleware};

#[derive(Debug, Deserialize, TS)]
pub struct StoryQuery {
    #[serde(default)]
    pub is_featured: Option<bool>,
}

#[derive(Debug, Deserialize, TS)]
pub struct ReorderStories {
    #[serde(alias = "storyIds")]
    pub story_ids: Vec<i64>,
}

/// A story together with its image sequence in display order.
#[derive(Debug, Serialize, TS)]
pub struct StoryWithImages {
    #[serde(flatten)]
    pub story: Story,
    pub images: Vec<StoryImage>,
}

impl StoryWithImages {
    pub async fn load(pool: &SqlitePool, story: Story) -> Result<Self, sqlx::Error> {
        let images = StoryImage::find_by_story(pool, story.id).await?;
        Ok(Self { story, images })
    }
}

/// GET /api/stories - List stories; `?is_featured=true` gives the featured order
pub async fn list_stories(
    State(state): State<AppState>,
    Query(params): Query<StoryQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Story>>>, ApiError> {
    let stories = Story::find_all(state.pool(), params.is_featured.unwrap_or(false)).await?;
    Ok(ResponseJson(ApiResponse::success(stories)))
}

/// POST /api/stories - Create a story; the slug comes from the title
pub async fn create_story(
    State(state): State<AppState>,
    Json(payload): Json<CreateStory>,
) -> Result<ResponseJson<ApiResponse<Story>>, ApiError> {
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".to_string()));
    }
    let story = Story::create(state.pool(), &payload).await?;
    tracing::info!(story_id = story.id, slug = %story.slug, "Created story");
    Ok(ResponseJson(ApiResponse::success(story)))
}

/// DELETE /api/stories - Delete several stories
pub async fn delete_stories(
    State(state): State<AppState>,
    Json(payload): Json<IdList>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    require_ids(&payload.ids, "ids")?;
    let affected = Story::delete_many(state.pool(), &payload.ids).await?;
    tracing::info!(requested = payload.ids.len(), affected, "Deleted story batch");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

/// PUT /api/stories/reorder - Rewrite the featured-stories order
pub async fn reorder_stories(
    State(state): State<AppState>,
    Json(payload): Json<ReorderStories>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    require_ids(&payload.story_ids, "story_ids")?;
    let members = Collection::FeaturedStories
        .reorder(state.pool(), &payload.story_ids)
        .await?;
    tracing::info!(collection = %Collection::FeaturedStories, count = members.len(), "Reordered collection");
    Ok(ResponseJson(ApiResponse::success(members)))
}

/// GET /api/stories/{id} - Story with ordered images
pub async fn get_story(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<StoryWithImages>>, ApiError> {
    let view = StoryWithImages::load(state.pool(), story).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// PUT /api/stories/{id} - Partial update
pub async fn update_story(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateStory>,
) -> Result<ResponseJson<ApiResponse<Story>>, ApiError> {
    if payload.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::BadRequest("title must not be blank".to_string()));
    }
    let updated = Story::update(state.pool(), story.id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Story {} not found", story.id)))?;
    tracing::debug!(
        story_id = updated.id,
        is_featured = updated.is_featured,
        featured_order = ?updated.featured_order,
        "Updated story"
    );
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/stories/{id} - Images go with the story; media are unlinked
pub async fn delete_story(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Story::delete(state.pool(), story.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::Database(sqlx::Error::RowNotFound));
    }
    tracing::info!(story_id = story.id, "Deleted story");
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let story_router = Router::new()
        .route("/", get(get_story).put(update_story).delete(delete_story))
        .nest("/images", story_images::router())
        .layer(from_fn_with_state(state.clone(), load_story_middleware));

    let inner = Router::new()
        .route(
            "/",
            get(list_stories).post(create_story).delete(delete_stories),
        )
        .route("/reorder", put(reorder_stories))
        .nest("/{id}", story_router);

    Router::new().nest("/stories", inner)
}
