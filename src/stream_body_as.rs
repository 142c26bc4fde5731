use crate::stream_format::StreamingFormat;
use axum::body::{Body, HttpBody};
use axum::response::{IntoResponse, Response};
use bytes::BytesMut;
use futures::stream::BoxStream;
use futures::StreamExt;
use futures::{Stream, TryStreamExt};
use http::{HeaderMap, HeaderValue};
use http_body::Frame;
use std::fmt::Formatter;
use std::pin::Pin;
use std::task::{Context, Poll};

type FrameResult = Result<Frame<axum::body::Bytes>, axum::Error>;

/// Streamed HTTP response body.
///
/// A failing item ends the body with an error once everything encoded before it
/// has been emitted, which makes hyper abort the connection mid-stream.
pub struct StreamBodyAs<'a> {
    stream: BoxStream<'a, FrameResult>,
    headers: Option<HeaderMap>,
    // Held back for one poll so the transport flushes the frames before it.
    deferred_error: Option<axum::Error>,
}

impl<'a> std::fmt::Debug for StreamBodyAs<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "StreamBodyAs")
    }
}

impl<'a> StreamBodyAs<'a> {
    /// Create a new `StreamBodyAs` providing a stream of your objects in the specified format.
    pub fn new<S, T, FMT, E>(stream_format: FMT, stream: S) -> Self
    where
        FMT: StreamingFormat<T>,
        S: Stream<Item = Result<T, E>> + 'a + Send,
        E: Into<axum::Error>,
    {
        Self::with_options(stream_format, stream, StreamBodyAsOptions::new())
    }

    pub fn with_options<S, T, FMT, E>(
        stream_format: FMT,
        stream: S,
        options: StreamBodyAsOptions,
    ) -> Self
    where
        FMT: StreamingFormat<T>,
        S: Stream<Item = Result<T, E>> + 'a + Send,
        E: Into<axum::Error>,
    {
        Self {
            stream: Self::create_stream_frames(&stream_format, stream, &options),
            headers: stream_format.http_response_headers(&options),
            deferred_error: None,
        }
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: http::header::IntoHeaderName,
        V: Into<HeaderValue>,
    {
        let current_headers = self.headers.get_or_insert(HeaderMap::new());
        current_headers.append(key, value.into());
        self
    }

    fn create_stream_frames<S, T, FMT, E>(
        stream_format: &FMT,
        stream: S,
        options: &StreamBodyAsOptions,
    ) -> BoxStream<'a, FrameResult>
    where
        FMT: StreamingFormat<T>,
        S: Stream<Item = Result<T, E>> + 'a + Send,
        E: Into<axum::Error>,
    {
        let boxed_stream = Box::pin(stream.map_err(|e| e.into()));
        let bytes_stream = stop_after_first_error(stream_format.to_bytes_stream(boxed_stream, options))
            .inspect_err(|e| tracing::warn!(error = %e, "aborting streamed response body"));

        match (options.buffering_ready_items, options.buffering_bytes) {
            (Some(buffering_ready_items), _) => bytes_stream
                .ready_chunks(buffering_ready_items.max(1))
                .flat_map(|chunks| {
                    let mut buf = BytesMut::new();
                    let mut frames = Vec::with_capacity(2);
                    for chunk in chunks {
                        match chunk {
                            Ok(bytes) => buf.extend_from_slice(&bytes),
                            Err(e) => {
                                frames.extend(drain_buffer(&mut buf));
                                frames.push(Err(e));
                            }
                        }
                    }
                    frames.extend(drain_buffer(&mut buf));
                    futures::stream::iter(frames)
                })
                .boxed(),
            (_, Some(buffering_bytes)) => {
                let buffering_bytes = buffering_bytes.max(1);
                // An empty chunk marks the end of the source; records never encode to zero bytes.
                let bytes_stream = bytes_stream.chain(futures::stream::once(
                    futures::future::ready(Ok(bytes::Bytes::new())),
                ));

                bytes_stream
                    .scan(
                        BytesMut::with_capacity(buffering_bytes),
                        move |current_buffer, maybe_bytes| {
                            futures::future::ready(match maybe_bytes {
                                Ok(bytes) if bytes.is_empty() => {
                                    Some(drain_buffer(current_buffer).into_iter().collect())
                                }
                                Ok(bytes) => {
                                    let mut frames = Vec::new();
                                    current_buffer.extend_from_slice(&bytes);
                                    while current_buffer.len() >= buffering_bytes {
                                        let buffer =
                                            current_buffer.split_to(buffering_bytes).freeze();
                                        frames.push(Ok(Frame::data(buffer)));
                                    }
                                    Some(frames)
                                }
                                Err(e) => {
                                    let mut frames: Vec<FrameResult> =
                                        drain_buffer(current_buffer).into_iter().collect();
                                    frames.push(Err(e));
                                    Some(frames)
                                }
                            })
                        },
                    )
                    .flat_map(futures::stream::iter)
                    .boxed()
            }
            (None, None) => bytes_stream.map(|res| res.map(Frame::data)).boxed(),
        }
    }
}

fn drain_buffer(buf: &mut BytesMut) -> Option<FrameResult> {
    if buf.is_empty() {
        None
    } else {
        Some(Ok(Frame::data(buf.split().freeze())))
    }
}

fn stop_after_first_error<'a, I>(
    stream: BoxStream<'a, Result<I, axum::Error>>,
) -> BoxStream<'a, Result<I, axum::Error>>
where
    I: Send + 'a,
{
    stream
        .scan(false, |failed, item| {
            futures::future::ready(if *failed {
                None
            } else {
                *failed = item.is_err();
                Some(item)
            })
        })
        .boxed()
}

impl IntoResponse for StreamBodyAs<'static> {
    fn into_response(mut self) -> Response {
        let maybe_headers = self.headers.take();
        let mut response: Response<Body> = Response::new(Body::new(self));
        if let Some(headers) = maybe_headers {
            *response.headers_mut() = headers;
        }
        response
    }
}

impl<'a> HttpBody for StreamBodyAs<'a> {
    type Data = axum::body::Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        if let Some(e) = self.deferred_error.take() {
            return Poll::Ready(Some(Err(e)));
        }
        match Pin::new(&mut self.stream).poll_next(cx) {
            // hyper discards its unflushed write buffer when a body fails, so yield
            // once to let the records already handed over reach the client.
            Poll::Ready(Some(Err(e))) => {
                self.deferred_error = Some(e);
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            other => other,
        }
    }
}

pub type HttpHeaderValue = http::header::HeaderValue;

/// Transport-level cadence of a streamed body: by default every record becomes its
/// own data frame; `buffering_ready_items` and `buffering_bytes` coalesce them.
#[derive(Debug, Clone)]
pub struct StreamBodyAsOptions {
    pub buffering_ready_items: Option<usize>,
    pub buffering_bytes: Option<usize>,
    pub content_type: Option<HttpHeaderValue>,
    pub record_channel_capacity: Option<usize>,
}

impl StreamBodyAsOptions {
    pub fn new() -> Self {
        Self {
            buffering_ready_items: None,
            buffering_bytes: None,
            content_type: None,
            record_channel_capacity: None,
        }
    }

    pub fn buffering_ready_items(mut self, ready_items: usize) -> Self {
        self.buffering_ready_items = Some(ready_items);
        self
    }

    pub fn buffering_bytes(mut self, ready_bytes: usize) -> Self {
        self.buffering_bytes = Some(ready_bytes);
        self
    }

    pub fn content_type(mut self, content_type: HttpHeaderValue) -> Self {
        self.content_type = Some(content_type);
        self
    }

    /// Channel capacity used when a blocking record source is bridged into the body.
    pub fn record_channel_capacity(mut self, capacity: usize) -> Self {
        self.record_channel_capacity = Some(capacity);
        self
    }
}
