use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{delete, post, put},
};
use db::{
    Collection, Direction, Member, MoveOutcome,
    models::{
        story::Story,
        story_image::{CreateStoryImage, StoryImage, StoryImageUpdate},
    },
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use super::{AffectedRows, require_ids};
use crate::{AppState, error::ApiError};

/// `/stories/{id}/images/{image_id}`
#[derive(Debug, Deserialize)]
pub struct ImagePath {
    pub id: i64,
    pub image_id: i64,
}

#[derive(Debug, Deserialize, TS)]
pub struct CreateStoryImages {
    pub images: Vec<CreateStoryImage>,
}

#[derive(Debug, Deserialize, TS)]
pub struct UpdateStoryImages {
    pub images: Vec<StoryImageUpdate>,
}

#[derive(Debug, Deserialize, TS)]
pub struct ImageIdList {
    #[serde(alias = "imageIds")]
    pub image_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, TS)]
pub struct MoveStoryImage {
    pub direction: Direction,
}

fn sequence(story: &Story) -> Collection {
    Collection::StoryImages { story_id: story.id }
}

/// POST /api/stories/{id}/images - Append one image
pub async fn create_image(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<CreateStoryImage>,
) -> Result<ResponseJson<ApiResponse<StoryImage>>, ApiError> {
    if payload.cloudinary_public_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "cloudinary_public_id is required".to_string(),
        ));
    }
    let image = StoryImage::create(state.pool(), story.id, &payload).await?;
    tracing::info!(
        story_id = story.id,
        image_id = image.id,
        order_index = image.order_index,
        "Added story image"
    );
    Ok(ResponseJson(ApiResponse::success(image)))
}

/// POST /api/stories/{id}/images/batch - Append several images in request order
pub async fn create_images(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<CreateStoryImages>,
) -> Result<ResponseJson<ApiResponse<Vec<StoryImage>>>, ApiError> {
    if payload.images.is_empty() {
        return Err(ApiError::BadRequest("images must not be empty".to_string()));
    }
    if payload
        .images
        .iter()
        .any(|image| image.cloudinary_public_id.trim().is_empty())
    {
        return Err(ApiError::BadRequest(
            "every image needs a cloudinary_public_id".to_string(),
        ));
    }
    let images = StoryImage::create_many(state.pool(), story.id, &payload.images).await?;
    tracing::info!(story_id = story.id, count = images.len(), "Added story images");
    Ok(ResponseJson(ApiResponse::success(images)))
}

/// PUT /api/stories/{id}/images - Explicit position and caption writes
pub async fn update_images(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateStoryImages>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    if payload.images.is_empty() {
        return Err(ApiError::BadRequest("images must not be empty".to_string()));
    }
    let affected = StoryImage::update_many(state.pool(), story.id, &payload.images).await?;
    tracing::debug!(story_id = story.id, affected, "Updated story images");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

/// DELETE /api/stories/{id}/images - Remove several images from the story
pub async fn delete_images(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<ImageIdList>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    require_ids(&payload.image_ids, "image_ids")?;
    let affected = StoryImage::delete_many(state.pool(), story.id, &payload.image_ids).await?;
    tracing::info!(story_id = story.id, affected, "Deleted story images");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

/// PUT /api/stories/{id}/images/reorder
pub async fn reorder_images(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Json(payload): Json<ImageIdList>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    require_ids(&payload.image_ids, "image_ids")?;
    let collection = sequence(&story);
    let members = collection.reorder(state.pool(), &payload.image_ids).await?;
    tracing::info!(%collection, count = members.len(), "Reordered collection");
    Ok(ResponseJson(ApiResponse::success(members)))
}

/// POST /api/stories/{id}/images/{image_id}/move
pub async fn move_image(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Path(path): Path<ImagePath>,
    Json(payload): Json<MoveStoryImage>,
) -> Result<ResponseJson<ApiResponse<MoveOutcome>>, ApiError> {
    let collection = sequence(&story);
    let outcome = collection
        .move_adjacent(state.pool(), path.image_id, payload.direction)
        .await?;
    tracing::debug!(%collection, image_id = path.image_id, direction = %payload.direction, ?outcome, "Moved story image");
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

/// DELETE /api/stories/{id}/images/{image_id}
pub async fn delete_image(
    Extension(story): Extension<Story>,
    State(state): State<AppState>,
    Path(path): Path<ImagePath>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = StoryImage::delete(state.pool(), story.id, path.image_id).await?;
    if rows_affected == 0 {
        return Err(ApiError::NotFound(format!(
            "Image {} not found in story {}",
            path.image_id, path.id
        )));
    }
    tracing::info!(story_id = story.id, image_id = path.image_id, "Deleted story image");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Mounted under `/stories/{id}/images`, inside the story loader.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            post(create_image).put(update_images).delete(delete_images),
        )
        .route("/batch", post(create_images))
        .route("/reorder", put(reorder_images))
        .route("/{image_id}/move", post(move_image))
        .route("/{image_id}", delete(delete_image))
}
