use crate::ndjson_writer::encode_record;
use crate::record_source::{RecordSource, DEFAULT_CHANNEL_CAPACITY};
use crate::stream_body_as::StreamBodyAsOptions;
use crate::stream_format::StreamingFormat;
use crate::StreamBodyAs;
use bytes::BytesMut;
use futures::stream::BoxStream;
use futures::Stream;
use futures::StreamExt;
use http::HeaderMap;
use serde::Serialize;

pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// Newline-delimited JSON: every record is a standalone object followed by `\n`,
/// with no enclosing array and no separators.
pub struct JsonNewLineStreamFormat;

impl JsonNewLineStreamFormat {
    pub fn new() -> Self {
        Self {}
    }
}

impl<T> StreamingFormat<T> for JsonNewLineStreamFormat
where
    T: Serialize + Send + Sync + 'static,
{
    fn to_bytes_stream<'a, 'b>(
        &'a self,
        stream: BoxStream<'b, Result<T, axum::Error>>,
        _: &'a StreamBodyAsOptions,
    ) -> BoxStream<'b, Result<axum::body::Bytes, axum::Error>> {
        Box::pin({
            stream.map(|obj_res| -> Result<axum::body::Bytes, axum::Error> {
                let obj = obj_res?;
                let mut buf = BytesMut::new();
                encode_record(&obj, &mut buf)?;
                Ok(buf.freeze())
            })
        })
    }

    fn http_response_headers(&self, options: &StreamBodyAsOptions) -> Option<HeaderMap> {
        let mut header_map = HeaderMap::new();
        header_map.insert(
            http::header::CONTENT_TYPE,
            options
                .content_type
                .clone()
                .unwrap_or_else(|| http::header::HeaderValue::from_static(NDJSON_CONTENT_TYPE)),
        );
        Some(header_map)
    }
}

impl<'a> crate::StreamBodyAs<'a> {
    pub fn ndjson<S, T>(stream: S) -> Self
    where
        T: Serialize + Send + Sync + 'static,
        S: Stream<Item = T> + 'a + Send,
    {
        Self::new(
            JsonNewLineStreamFormat::new(),
            stream.map(Ok::<T, axum::Error>),
        )
    }

    pub fn ndjson_with_errors<S, T, E>(stream: S) -> Self
    where
        T: Serialize + Send + Sync + 'static,
        S: Stream<Item = Result<T, E>> + 'a + Send,
        E: Into<axum::Error>,
    {
        Self::new(JsonNewLineStreamFormat::new(), stream)
    }

    /// Stream a [`RecordSource`] regardless of whether it is blocking or async.
    pub fn ndjson_records<T>(source: RecordSource<T>) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        StreamBodyAsOptions::new().ndjson_records(source)
    }
}

impl StreamBodyAsOptions {
    pub fn ndjson<'a, S, T>(self, stream: S) -> StreamBodyAs<'a>
    where
        T: Serialize + Send + Sync + 'static,
        S: Stream<Item = T> + 'a + Send,
    {
        StreamBodyAs::with_options(
            JsonNewLineStreamFormat::new(),
            stream.map(Ok::<T, axum::Error>),
            self,
        )
    }

    pub fn ndjson_with_errors<'a, S, T, E>(self, stream: S) -> StreamBodyAs<'a>
    where
        T: Serialize + Send + Sync + 'static,
        S: Stream<Item = Result<T, E>> + 'a + Send,
        E: Into<axum::Error>,
    {
        StreamBodyAs::with_options(JsonNewLineStreamFormat::new(), stream, self)
    }

    pub fn ndjson_records<T>(self, source: RecordSource<T>) -> StreamBodyAs<'static>
    where
        T: Serialize + Send + Sync + 'static,
    {
        let capacity = self
            .record_channel_capacity
            .unwrap_or(DEFAULT_CHANNEL_CAPACITY);
        StreamBodyAs::with_options(
            JsonNewLineStreamFormat::new(),
            source.into_stream(capacity),
            self,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_client::*;
    use crate::{Author, StreamBodyAs};
    use axum::{routing::*, Router};
    use futures::stream;
    use std::time::Duration;

    fn test_authors() -> Vec<Author> {
        (1..=7)
            .map(|id| Author::new(id, format!("First{id}"), format!("Last{id}"), 1900 + id as i32))
            .collect()
    }

    fn expected_ndjson(authors: &[Author]) -> String {
        authors
            .iter()
            .map(|item| serde_json::to_string(item).unwrap() + "\n")
            .collect()
    }

    #[tokio::test]
    async fn serialize_ndjson_stream_format() {
        let test_stream_vec = test_authors();
        let test_stream = Box::pin(stream::iter(test_stream_vec.clone()));

        let app = Router::new().route(
            "/",
            get(|| async {
                StreamBodyAs::new(
                    JsonNewLineStreamFormat::new(),
                    test_stream.map(Ok::<_, axum::Error>),
                )
            }),
        );

        let client = TestClient::new(app).await;

        let res = client.get("/").send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(
            res.headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok()),
            Some("application/x-ndjson")
        );

        let body = res.text().await.unwrap();

        assert_eq!(body, expected_ndjson(&test_stream_vec));
    }

    #[tokio::test]
    async fn serialize_ndjson_with_custom_content_type() {
        let app = Router::new().route(
            "/",
            get(|| async {
                StreamBodyAsOptions::new()
                    .content_type(http::HeaderValue::from_static("application/jsonl"))
                    .ndjson(stream::iter(test_authors()))
            }),
        );

        let client = TestClient::new(app).await;
        let res = client.get("/").send().await.unwrap();
        assert_eq!(
            res.headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok()),
            Some("application/jsonl")
        );
        assert_eq!(res.text().await.unwrap(), expected_ndjson(&test_authors()));
    }

    #[tokio::test]
    async fn serialize_empty_ndjson_stream() {
        let app = Router::new().route(
            "/",
            get(|| async { StreamBodyAs::ndjson_records(RecordSource::<Author>::from_records(vec![])) }),
        );

        let client = TestClient::new(app).await;
        let res = client.get("/").send().await.unwrap();
        assert_eq!(res.status(), reqwest::StatusCode::OK);
        assert_eq!(
            res.headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok()),
            Some(NDJSON_CONTENT_TYPE)
        );
        assert_eq!(res.text().await.unwrap(), "");
    }

    #[tokio::test]
    async fn serialize_blocking_and_streaming_sources_identically() {
        let app = Router::new()
            .route(
                "/blocking",
                get(|| async { StreamBodyAs::ndjson_records(RecordSource::from_records(test_authors())) }),
            )
            .route(
                "/streaming",
                get(|| async {
                    StreamBodyAs::ndjson_records(RecordSource::streaming(
                        tokio_stream::StreamExt::throttle(
                            stream::iter(test_authors()).map(Ok::<_, axum::Error>),
                            Duration::from_millis(5),
                        ),
                    ))
                }),
            );

        let client = TestClient::new(app).await;
        let blocking = client.get("/blocking").send().await.unwrap().text().await.unwrap();
        let streaming = client.get("/streaming").send().await.unwrap().text().await.unwrap();
        assert_eq!(blocking, expected_ndjson(&test_authors()));
        assert_eq!(streaming, blocking);
    }

    #[tokio::test]
    async fn ndjson_stream_is_truncated_on_source_error() {
        let app = Router::new().route(
            "/",
            get(|| async {
                StreamBodyAs::ndjson_with_errors(stream::iter(vec![
                    Ok(Author::new(1, "Ada", "Lovelace", 1815)),
                    Ok(Author::new(2, "Alan", "Turing", 1912)),
                    Ok(Author::new(3, "Grace", "Hopper", 1906)),
                    Err(axum::Error::new("database went away")),
                    Ok(Author::new(4, "Edsger", "Dijkstra", 1930)),
                ]))
            }),
        );

        let client = TestClient::new(app).await;
        for _ in 0..5 {
            let res = client.get("/").send().await.unwrap();
            assert_eq!(res.status(), reqwest::StatusCode::OK);

            let mut received = Vec::new();
            let mut body = Box::pin(res.bytes_stream());
            let mut failed = false;
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => received.extend_from_slice(&bytes),
                    Err(_) => {
                        failed = true;
                        break;
                    }
                }
            }
            assert!(failed);
            let received = String::from_utf8(received).unwrap();
            let ids: Vec<i64> = received
                .lines()
                .map(|line| serde_json::from_str::<Author>(line).unwrap().id)
                .collect();
            assert_eq!(ids, vec![1, 2, 3]);
            assert!(received.ends_with('\n'));
        }
    }
}
