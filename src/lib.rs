#![allow(unused_parens, clippy::new_without_default, clippy::needless_lifetimes)]
#![forbid(unsafe_code)]

//! # Author records over HTTP, buffered and as NDJSON streams
//!
//! The same author table is served two ways:
//! - conventional REST: a JSON array of all authors, or a single author by id;
//! - [NDJSON](https://github.com/ndjson/ndjson-spec) streaming: one JSON object per line,
//!   written to the response body as records arrive, never holding the whole result set.
//!
//! Records come from a [`RecordSource`], which is either a blocking query (run on tokio's
//! blocking pool) or an async stream. The same source can be written to an HTTP body with
//! [`StreamBodyAs`] or onto any byte sink with [`NdjsonWriter`].
//!
//! # Example
//!
//! ```rust
//! use axum::{Router, routing::get, response::IntoResponse};
//! use author_streams::*;
//!
//! fn my_authors() -> Vec<Author> {
//!     vec![Author::new(1, "Ada", "Lovelace", 1815)]
//! }
//!
//! async fn stream_authors() -> impl IntoResponse {
//!     StreamBodyAs::ndjson_records(RecordSource::from_records(my_authors()))
//! }
//!
//! async fn stream_authors_buffered() -> impl IntoResponse {
//!     StreamBodyAsOptions::new()
//!         .buffering_bytes(8 * 1024)
//!         .ndjson(futures::stream::iter(my_authors()))
//! }
//!
//! let app: Router = Router::new()
//!     .route("/authors.ndjson", get(stream_authors))
//!     .route("/authors-buffered.ndjson", get(stream_authors_buffered));
//! ```

mod author;
pub use author::Author;

mod error;
pub use error::{AppError, NdjsonError, RepositoryError};

mod record_source;
pub use record_source::{BlockingRecords, RecordSource, DEFAULT_CHANNEL_CAPACITY};

mod ndjson_writer;
pub use ndjson_writer::{encode_record, FlushPolicy, NdjsonWriteSummary, NdjsonWriter};

mod stream_format;
pub use stream_format::*;

mod stream_body_as;
pub use self::stream_body_as::HttpHeaderValue;
pub use self::stream_body_as::StreamBodyAs;
pub use self::stream_body_as::StreamBodyAsOptions;

mod json_formats;
pub use json_formats::{JsonNewLineStreamFormat, NDJSON_CONTENT_TYPE};

mod repository;
pub use repository::{
    AuthorRecords, BlockingAuthorRepository, InMemoryAuthorRepository, ReactiveAuthorRepository,
};

pub mod data_generator;

pub mod config;
pub use config::ServerConfig;

pub mod server;

#[cfg(test)]
mod test_client;
