use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use db::{OrderingError, models::story::StoryError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Story(#[from] StoryError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
}

impl ApiError {
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Ordering(err) => ordering_status(err),
            ApiError::Story(StoryError::EmptySlug) => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Story(StoryError::Ordering(err)) => ordering_status(err),
            ApiError::Story(StoryError::Database(err)) => database_status(err),
            ApiError::Database(err) => database_status(err),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        }
    }
}

fn ordering_status(err: &OrderingError) -> (StatusCode, String) {
    match err {
        OrderingError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        OrderingError::NotMember { .. }
        | OrderingError::DuplicateId { .. }
        | OrderingError::ImplicitMembership(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        OrderingError::Database(db_err) => database_status(db_err),
    }
}

fn database_status(err: &sqlx::Error) -> (StatusCode, String) {
    match err {
        sqlx::Error::RowNotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            (StatusCode::CONFLICT, "A record with that value already exists".to_string())
        }
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => (
            StatusCode::BAD_REQUEST,
            "Referenced record does not exist".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        } else {
            tracing::debug!(%status, error = %self, "request rejected");
        }
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use db::Collection;

    use super::*;

    #[test]
    fn ordering_preconditions_are_bad_requests() {
        let cases = [
            OrderingError::NotMember {
                collection: Collection::Masthead,
                id: 1,
            },
            OrderingError::DuplicateId {
                collection: Collection::FeaturedMedia,
                id: 2,
            },
            OrderingError::ImplicitMembership(Collection::StoryImages { story_id: 3 }),
        ];
        for err in cases {
            let (status, _) = ApiError::from(err).status_and_message();
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn missing_rows_are_not_found() {
        let err = ApiError::from(OrderingError::NotFound {
            collection: Collection::FeaturedStories,
            id: 9,
        });
        assert_eq!(err.status_and_message().0, StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound)
                .status_and_message()
                .0,
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn store_failures_hide_details() {
        let err = ApiError::Database(sqlx::Error::PoolTimedOut);
        let (status, message) = err.status_and_message();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(message, "Internal server error");
    }

    #[test]
    fn empty_slug_is_bad_request() {
        let (status, message) = ApiError::from(StoryError::EmptySlug).status_and_message();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(message.contains("title"));
    }
}
