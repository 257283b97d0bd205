use std::str::FromStr;

use axum::{
    Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::{Collection, CollectionKind, Member};
use utils::response::ApiResponse;

use super::AffectedRows;
use crate::{AppState, error::ApiError};

/// Resolve a flagged collection from its path segment. Story image sequences
/// are reached through their story instead.
fn flagged_collection(kind: &str) -> Result<Collection, ApiError> {
    let parsed = CollectionKind::from_str(kind)
        .map_err(|_| ApiError::BadRequest(format!("Unknown collection \"{kind}\"")))?;
    match Collection::from_kind(parsed, None) {
        Some(collection) => Ok(collection),
        None => Err(ApiError::BadRequest(format!(
            "\"{kind}\" is managed under /stories/{{id}}/images"
        ))),
    }
}

/// GET /api/collections/{kind} - Members in reader order
pub async fn list_collection(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    let collection = flagged_collection(&kind)?;
    let members = collection.list_ordered(state.pool()).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

/// POST /api/collections/{kind}/compact - Renumber positions to 0..n
pub async fn compact_collection(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    let collection = flagged_collection(&kind)?;
    let members = collection.compact(state.pool()).await?;
    tracing::info!(%collection, count = members.len(), "Compacted collection");
    Ok(ResponseJson(ApiResponse::success(members)))
}

/// POST /api/collections/{kind}/backfill - Rank members that have no position
pub async fn backfill_collection(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<ResponseJson<ApiResponse<AffectedRows>>, ApiError> {
    let collection = flagged_collection(&kind)?;
    let affected = collection.backfill_positions(state.pool()).await?;
    tracing::info!(%collection, affected, "Backfilled positions");
    Ok(ResponseJson(ApiResponse::success(AffectedRows { affected })))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/collections/{kind}", get(list_collection))
        .route("/collections/{kind}/compact", post(compact_collection))
        .route("/collections/{kind}/backfill", post(backfill_collection))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flagged_collections_resolve_by_wire_name() {
        assert_eq!(flagged_collection("masthead").unwrap(), Collection::Masthead);
        assert_eq!(flagged_collection("featured").unwrap(), Collection::FeaturedMedia);
        assert_eq!(
            flagged_collection("featured_stories").unwrap(),
            Collection::FeaturedStories
        );
    }

    #[test]
    fn story_images_and_unknown_names_are_rejected() {
        assert!(matches!(
            flagged_collection("story_images"),
            Err(ApiError::BadRequest(_))
        ));
        assert!(matches!(
            flagged_collection("carousel"),
            Err(ApiError::BadRequest(_))
        ));
    }
}
