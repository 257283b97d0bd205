use axum::{
    Json, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::setting::{Setting, UpsertSetting};
use serde::Deserialize;
use utils::response::ApiResponse;

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct SettingQuery {
    pub key: Option<String>,
}

/// GET /api/settings - All settings, or the one named by `?key=`
pub async fn get_settings(
    State(state): State<AppState>,
    Query(query): Query<SettingQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<Setting>>>, ApiError> {
    let settings = match query.key.as_deref() {
        Some(key) => {
            let setting = Setting::find(state.pool(), key)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("Setting \"{key}\" not found")))?;
            vec![setting]
        }
        None => Setting::find_all(state.pool()).await?,
    };
    Ok(ResponseJson(ApiResponse::success(settings)))
}

/// PUT /api/settings - Create or replace one setting
pub async fn put_setting(
    State(state): State<AppState>,
    Json(payload): Json<UpsertSetting>,
) -> Result<ResponseJson<ApiResponse<Setting>>, ApiError> {
    if payload.key.trim().is_empty() {
        return Err(ApiError::BadRequest("key is required".to_string()));
    }
    let setting = Setting::upsert(state.pool(), &payload.key, &payload.value).await?;
    tracing::info!(key = %setting.key, "Saved setting");
    Ok(ResponseJson(ApiResponse::success(setting)))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(put_setting))
}
