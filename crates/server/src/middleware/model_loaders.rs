use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use db::models::{media::Media, story::Story};
use serde::Deserialize;

use crate::{AppState, error::ApiError};

/// The `{id}` segment of a resource route. Other captured segments, such as
/// `{image_id}`, are ignored.
#[derive(Debug, Deserialize)]
pub struct ResourceId {
    pub id: i64,
}

pub async fn load_media_middleware(
    State(state): State<AppState>,
    Path(ResourceId { id }): Path<ResourceId>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let media = Media::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Media {} not found", id)))?;

    request.extensions_mut().insert(media);
    Ok(next.run(request).await)
}

pub async fn load_story_middleware(
    State(state): State<AppState>,
    Path(ResourceId { id }): Path<ResourceId>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let story = Story::find_by_id(state.pool(), id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Story {} not found", id)))?;

    request.extensions_mut().insert(story);
    Ok(next.run(request).await)
}
