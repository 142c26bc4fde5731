//! Author routes in two flavours.
//!
//! `/basic/...` routes sit on a [`BlockingAuthorRepository`], `/reactive/...` routes on a
//! [`ReactiveAuthorRepository`]. Each flavour has buffered REST routes (a JSON array or
//! a single object) and one NDJSON streaming route.

use crate::config::ServerConfig;
use crate::data_generator::generate_authors;
use crate::error::{AppError, RepositoryError};
use crate::record_source::RecordSource;
use crate::repository::{
    BlockingAuthorRepository, InMemoryAuthorRepository, ReactiveAuthorRepository,
};
use crate::stream_body_as::StreamBodyAsOptions;
use crate::{Author, StreamBodyAs};
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use futures::TryStreamExt;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    blocking: Arc<dyn BlockingAuthorRepository>,
    reactive: Arc<dyn ReactiveAuthorRepository>,
    stream_options: StreamBodyAsOptions,
}

impl AppState {
    pub fn new(
        blocking: Arc<dyn BlockingAuthorRepository>,
        reactive: Arc<dyn ReactiveAuthorRepository>,
    ) -> Self {
        Self {
            blocking,
            reactive,
            stream_options: StreamBodyAsOptions::new(),
        }
    }

    pub fn in_memory(repository: InMemoryAuthorRepository) -> Self {
        Self::new(Arc::new(repository.clone()), Arc::new(repository))
    }

    pub fn stream_options(mut self, stream_options: StreamBodyAsOptions) -> Self {
        self.stream_options = stream_options;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/basic/rest/authors", get(basic_all_authors))
        .route("/basic/rest/authors/{id}", get(basic_author))
        .route("/basic/stream/authors", get(basic_stream_authors))
        .route("/reactive/rest/authors", get(reactive_all_authors))
        .route("/reactive/rest/authors/{id}", get(reactive_author))
        .route("/reactive/stream/authors", get(reactive_stream_authors))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn basic_all_authors(State(state): State<AppState>) -> Result<Json<Vec<Author>>, AppError> {
    let repository = state.blocking.clone();
    let authors = tokio::task::spawn_blocking(move || -> Result<Vec<Author>, RepositoryError> {
        repository.find_all()?.collect()
    })
    .await
    .map_err(RepositoryError::from)??;
    Ok(Json(authors))
}

async fn basic_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, AppError> {
    let repository = state.blocking.clone();
    tokio::task::spawn_blocking(move || repository.find_by_id(id))
        .await
        .map_err(RepositoryError::from)??
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

async fn basic_stream_authors(State(state): State<AppState>) -> StreamBodyAs<'static> {
    tracing::debug!("streaming authors from the blocking repository");
    let repository = state.blocking.clone();
    state
        .stream_options
        .clone()
        .ndjson_records(RecordSource::blocking(move || repository.find_all()))
}

async fn reactive_all_authors(
    State(state): State<AppState>,
) -> Result<Json<Vec<Author>>, AppError> {
    let authors = state.reactive.find_all().try_collect::<Vec<_>>().await?;
    Ok(Json(authors))
}

async fn reactive_author(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, AppError> {
    state
        .reactive
        .find_by_id(id)
        .await?
        .map(Json)
        .ok_or(AppError::NotFound(id))
}

async fn reactive_stream_authors(State(state): State<AppState>) -> StreamBodyAs<'static> {
    tracing::debug!("streaming authors from the reactive repository");
    state
        .stream_options
        .clone()
        .ndjson_records(RecordSource::streaming(state.reactive.find_all()))
}

/// Seed the in-memory repository, bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let repository = InMemoryAuthorRepository::new(generate_authors(config.seed_count, config.seed))
        .with_delay(config.reactive_delay());
    let state = AppState::in_memory(repository).stream_options(config.stream_options());

    let listener = TcpListener::bind(config.listen).await?;
    tracing::info!(
        addr = %listener.local_addr()?,
        authors = config.seed_count,
        "author service listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
