use axum::{
    Router,
    http::{Request, header::HeaderName},
    middleware::from_fn_with_state,
    routing::get,
};
use serde::Deserialize;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::{DefaultOnFailure, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, field};
use ts_rs::TS;

use crate::{AppState, error::ApiError, middleware::require_admin};

pub mod admin;
pub mod collections;
pub mod health;
pub mod media;
pub mod pages;
pub mod public;
pub mod settings;
pub mod stories;
pub mod story_images;

/// Body of batch deletes: `{ "ids": [..] }`.
#[derive(Debug, Deserialize, TS)]
pub struct IdList {
    pub ids: Vec<i64>,
}

#[derive(Debug, serde::Serialize, TS)]
pub struct AffectedRows {
    pub affected: u64,
}

/// Batch endpoints refuse an empty id list instead of silently doing nothing.
pub(crate) fn require_ids(ids: &[i64], field: &str) -> Result<(), ApiError> {
    if ids.is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            let request_id = request
                .extensions()
                .get::<RequestId>()
                .and_then(|id| id.header_value().to_str().ok());
            let span = tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id = field::Empty
            );
            if let Some(request_id) = request_id {
                span.record("request_id", field::display(request_id));
            }
            span
        })
        .on_response(DefaultOnResponse::new().level(Level::INFO))
        .on_failure(DefaultOnFailure::new().level(Level::ERROR));

    let admin_routes = Router::<AppState>::new()
        .merge(media::router(&state))
        .merge(stories::router(&state))
        .merge(collections::router())
        .merge(settings::router())
        .merge(pages::router())
        .merge(admin::router())
        .layer(from_fn_with_state(state.clone(), require_admin));

    let api = Router::<AppState>::new()
        .route("/health", get(health::health_check))
        .nest("/public", public::router())
        .merge(admin_routes);

    Router::<AppState>::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(trace_layer)
        .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
            "x-request-id",
        )))
        .layer(SetRequestIdLayer::new(
            HeaderName::from_static("x-request-id"),
            MakeRequestUuid {},
        ))
        .with_state(state)
}
