use axum::{
    Extension, Json, Router,
    extract::{Query, State},
    middleware::from_fn_with_state,
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::{
    Collection, CollectionKind, Direction, Member, MoveOutcome,
    models::media::{CreateMedia, Media, MediaFilter, UpdateMedia},
};
use serde::Deserialize;
use ts_rs::TS;
use utils::response::ApiResponse;

use super::{AffectedRows, IdList, require_ids};
use crate::{AppState, error::ApiError, middleware::load_media_middleware};

#[derive(Debug, Deserialize, TS)]
pub struct BatchUpdateMedia {
    pub ids: Vec<i64>,
    pub updates: UpdateMedia,
}

#[derive(Debug, Deserialize, TS)]
pub struct ReorderMedia {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    #[serde(alias = "mediaIds")]
    pub media_ids: Vec<i64>,
}

#[derive(Debug, Deserialize, TS)]
pub struct MoveMedia {
    #[serde(rename = "type")]
    pub kind: CollectionKind,
    pub direction: Direction,
}

/// Media only belongs to the masthead and featured collections.
fn media_collection(kind: CollectionKind) -> Result<Collection, ApiError> {
    match kind {
        CollectionKind::Masthead => Ok(Collection::Masthead),
        CollectionKind::FeaturedMedia => Ok(Collection::FeaturedMedia),
        other => Err(ApiError::BadRequest(format!(
            "type must be \"masthead\" or \"featured\", got \"{other}\""
        ))),
    }
}

/// GET /api/media - List media, optionally filtered
pub async fn list_media(
    State(state): State<AppState>,
    Query(filter): Query<MediaFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<Media>>>, ApiError> {
    let media = Media::find_all(state.pool(), &filter).await?;
    Ok(ResponseJson(ApiResponse::success(media)))
}

/// POST /api/media - Register an uploaded asset
pub async fn create_media(
    State(state): State<AppState>,
    Json(payload): Json<CreateMedia>,
) -> Result<ResponseJson<ApiResponse<Media>>, ApiError> {
    let media = Media::create(state.pool(), &payload).await?;
    tracing::info!(
        media_id = media.id,
        public_id = %media.cloudinary_public_id,
        masthead_order = ?media.masthead_order,
        featured_order = ?media.featured_order,
        "Created media"
    );
    Ok(ResponseJson(ApiResponse::success(media)))
}

/// DELETE /api/media - Delete several media rows
pub async fn delete_media_batch(
    State(state): State<AppState>,
    Json(payload): Json<IdList>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    require_ids(&payload.ids, "ids")?;
    let affected = Media::delete_many(state.pool(), &payload.ids).await?;
    tracing::info!(requested = payload.ids.len(), affected, "Deleted media batch");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

/// PUT /api/media/batch - Apply one update to several rows
pub async fn update_media_batch(
    State(state): State<AppState>,
    Json(payload): Json<BatchUpdateMedia>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    require_ids(&payload.ids, "ids")?;
    if payload.updates.is_empty() {
        return Err(ApiError::BadRequest("updates must not be empty".to_string()));
    }
    let affected = Media::update_many(state.pool(), &payload.ids, &payload.updates).await?;
    tracing::info!(requested = payload.ids.len(), affected, "Updated media batch");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

/// PUT /api/media/reorder - Rewrite masthead or featured order
pub async fn reorder_media(
    State(state): State<AppState>,
    Json(payload): Json<ReorderMedia>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    let collection = media_collection(payload.kind)?;
    require_ids(&payload.media_ids, "media_ids")?;

    let members = collection.reorder(state.pool(), &payload.media_ids).await?;
    tracing::info!(%collection, count = members.len(), "Reordered collection");
    Ok(ResponseJson(ApiResponse::success(members)))
}

/// GET /api/media/{id}
pub async fn get_media(
    Extension(media): Extension<Media>,
) -> Result<ResponseJson<ApiResponse<Media>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(media)))
}

/// PUT /api/media/{id} - Partial update; flag toggles append or clear
pub async fn update_media(
    Extension(media): Extension<Media>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateMedia>,
) -> Result<ResponseJson<ApiResponse<Media>>, ApiError> {
    let updated = Media::update(state.pool(), media.id, &payload)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Media {} not found", media.id)))?;
    tracing::debug!(
        media_id = updated.id,
        is_masthead = updated.is_masthead,
        is_featured = updated.is_featured,
        "Updated media"
    );
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// DELETE /api/media/{id}
pub async fn delete_media(
    Extension(media): Extension<Media>,
    State(state): State<AppState>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let rows_affected = Media::delete(state.pool(), media.id).await?;
    if rows_affected == 0 {
        return Err(ApiError::Database(sqlx::Error::RowNotFound));
    }
    tracing::info!(media_id = media.id, "Deleted media");
    Ok(ResponseJson(ApiResponse::success(())))
}

/// POST /api/media/{id}/move - Swap with the neighbour in one collection
pub async fn move_media(
    Extension(media): Extension<Media>,
    State(state): State<AppState>,
    Json(payload): Json<MoveMedia>,
) -> Result<ResponseJson<ApiResponse<MoveOutcome>>, ApiError> {
    let collection = media_collection(payload.kind)?;
    let outcome = collection
        .move_adjacent(state.pool(), media.id, payload.direction)
        .await?;
    tracing::debug!(%collection, media_id = media.id, direction = %payload.direction, ?outcome, "Moved media");
    Ok(ResponseJson(ApiResponse::success(outcome)))
}

pub fn router(state: &AppState) -> Router<AppState> {
    let media_router = Router::new()
        .route("/", get(get_media).put(update_media).delete(delete_media))
        .route("/move", post(move_media))
        .layer(from_fn_with_state(state.clone(), load_media_middleware));

    let inner = Router::new()
        .route(
            "/",
            get(list_media).post(create_media).delete(delete_media_batch),
        )
        .route("/batch", put(update_media_batch))
        .route("/reorder", put(reorder_media))
        .nest("/{id}", media_router);

    Router::new().nest("/media", inner)
}
