use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure of an in-progress NDJSON stream. Every variant is fatal to the stream.
#[derive(Debug, thiserror::Error)]
pub enum NdjsonError {
    #[error("failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("failed to write to response sink: {0}")]
    SinkWrite(#[from] std::io::Error),
    #[error("record source failed: {0}")]
    Source(#[source] axum::Error),
}

impl From<NdjsonError> for axum::Error {
    fn from(err: NdjsonError) -> Self {
        match err {
            NdjsonError::Source(source) => source,
            other => axum::Error::new(other),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("repository query failed: {0}")]
    Query(String),
    #[error("blocking repository task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<RepositoryError> for axum::Error {
    fn from(err: RepositoryError) -> Self {
        axum::Error::new(err)
    }
}

/// Errors of the buffered REST endpoints.
///
/// A missing author is an empty result, not a failure: it renders as 200 with no body.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("author {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound(id) => {
                tracing::debug!(id, "author not found");
                StatusCode::OK.into_response()
            }
            AppError::Repository(err) => {
                tracing::error!(error = %err, "repository failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": err.to_string() })),
                )
                    .into_response()
            }
        }
    }
}
