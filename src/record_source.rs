use futures::stream::BoxStream;
use futures::{Stream, StreamExt, TryStreamExt};
use std::fmt::Formatter;
use tokio_stream::wrappers::ReceiverStream;

pub type BlockingRecords<T> = Box<dyn Iterator<Item = Result<T, axum::Error>> + Send>;

type BlockingQuery<T> = Box<dyn FnOnce() -> Result<BlockingRecords<T>, axum::Error> + Send>;

/// Capacity of the channel between a blocking producer and the async consumer.
///
/// With one slot the producer is at most one record ahead of the writer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1;

/// A produce-once source of records, either pulled from a blocking query or
/// delivered over time by an async stream.
pub enum RecordSource<T> {
    /// Deferred blocking query. Runs on whichever thread consumes the source.
    Blocking(BlockingQuery<T>),
    Streaming(BoxStream<'static, Result<T, axum::Error>>),
}

impl<T> std::fmt::Debug for RecordSource<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordSource::Blocking(_) => write!(f, "RecordSource::Blocking"),
            RecordSource::Streaming(_) => write!(f, "RecordSource::Streaming"),
        }
    }
}

impl<T> RecordSource<T>
where
    T: Send + 'static,
{
    /// Wrap a blocking query. `query` is not invoked until the source is consumed.
    pub fn blocking<F, I, E>(query: F) -> Self
    where
        F: FnOnce() -> Result<I, E> + Send + 'static,
        I: IntoIterator<Item = Result<T, E>>,
        I::IntoIter: Send + 'static,
        E: Into<axum::Error> + 'static,
    {
        RecordSource::Blocking(Box::new(move || match query() {
            Ok(records) => Ok(Box::new(records.into_iter().map(|res| res.map_err(Into::into)))
                as BlockingRecords<T>),
            Err(e) => Err(e.into()),
        }))
    }

    /// Infallible records that are already at hand.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        let records = records.into_iter();
        RecordSource::Blocking(Box::new(move || {
            Ok(Box::new(records.map(Ok)) as BlockingRecords<T>)
        }))
    }

    pub fn streaming<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<T, E>> + Send + 'static,
        E: Into<axum::Error> + 'static,
    {
        RecordSource::Streaming(stream.map_err(Into::into).boxed())
    }

    /// Async view of the source.
    ///
    /// A blocking query is moved to tokio's blocking pool and its records are handed
    /// over through a bounded channel, so this must be called within a tokio runtime.
    /// The producer stops at its next record once the returned stream is dropped.
    pub fn into_stream(self, channel_capacity: usize) -> BoxStream<'static, Result<T, axum::Error>> {
        match self {
            RecordSource::Streaming(stream) => stream,
            RecordSource::Blocking(query) => {
                let (tx, rx) = tokio::sync::mpsc::channel(channel_capacity.max(1));
                let producer = tokio::task::spawn_blocking(move || {
                    let records = match query() {
                        Ok(records) => records,
                        Err(e) => {
                            let _ = tx.blocking_send(Err(e));
                            return;
                        }
                    };
                    for record in records {
                        let failed = record.is_err();
                        if tx.blocking_send(record).is_err() {
                            tracing::debug!("record consumer went away, stopping blocking producer");
                            return;
                        }
                        if failed {
                            return;
                        }
                    }
                });

                // A panicking producer closes the channel too; report it instead of
                // letting the stream look exhausted.
                let completion = futures::stream::once(async move {
                    producer.await.err().map(|e| Err(axum::Error::new(e)))
                })
                .filter_map(futures::future::ready);

                ReceiverStream::new(rx).chain(completion).boxed()
            }
        }
    }

    /// Blocking view of the source.
    ///
    /// A streaming source is waited on record by record, so this must not be called
    /// from inside an async task.
    pub fn into_blocking_iter(self) -> BlockingRecords<T> {
        match self {
            RecordSource::Blocking(query) => match query() {
                Ok(records) => records,
                Err(e) => Box::new(std::iter::once(Err(e))),
            },
            RecordSource::Streaming(stream) => Box::new(futures::executor::block_on_stream(stream)),
        }
    }
}
