use crate::error::NdjsonError;
use crate::record_source::{RecordSource, DEFAULT_CHANNEL_CAPACITY};
use bytes::{BufMut, BytesMut};
use futures::StreamExt;
use serde::Serialize;
use std::io::Write;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub(crate) const NDJSON_DELIMITER: &[u8] = b"\n";

/// Append `record` as one JSON object followed by `\n`.
///
/// On failure `buf` is left as it was before the call.
pub fn encode_record<T>(record: &T, buf: &mut BytesMut) -> Result<(), NdjsonError>
where
    T: Serialize + ?Sized,
{
    let start = buf.len();
    let mut writer = BufMut::writer(&mut *buf);
    let res = serde_json::to_writer(&mut writer, record);
    let buf = writer.into_inner();
    match res {
        Ok(()) => {
            buf.put_slice(NDJSON_DELIMITER);
            Ok(())
        }
        Err(e) => {
            buf.truncate(start);
            Err(NdjsonError::Serialization(e))
        }
    }
}

/// When the sink writers call `flush` on the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Never flush explicitly; delivery cadence is up to the sink's own buffering.
    #[default]
    Transport,
    /// Flush after every record.
    PerRecord,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NdjsonWriteSummary {
    pub records: usize,
    pub bytes: usize,
}

/// Writes a [`RecordSource`] as NDJSON onto a byte sink, one record in memory at a time.
///
/// The first serialization, source or sink failure stops the writer; bytes written
/// before it are left in the sink.
#[derive(Debug, Clone)]
pub struct NdjsonWriter {
    flush_policy: FlushPolicy,
    channel_capacity: usize,
}

impl NdjsonWriter {
    pub fn new() -> Self {
        Self {
            flush_policy: FlushPolicy::default(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    pub fn flush_policy(mut self, flush_policy: FlushPolicy) -> Self {
        self.flush_policy = flush_policy;
        self
    }

    pub fn channel_capacity(mut self, channel_capacity: usize) -> Self {
        self.channel_capacity = channel_capacity;
        self
    }

    /// Blocking writer. A streaming source is waited on in place, so call this from
    /// a blocking context only.
    pub fn write_blocking<W, T>(
        &self,
        sink: &mut W,
        source: RecordSource<T>,
    ) -> Result<NdjsonWriteSummary, NdjsonError>
    where
        W: Write + ?Sized,
        T: Serialize + Send + 'static,
    {
        let mut summary = NdjsonWriteSummary::default();
        let mut buf = BytesMut::new();
        for record_res in source.into_blocking_iter() {
            let res = record_res
                .map_err(NdjsonError::Source)
                .and_then(|record| encode_record(&record, &mut buf))
                .and_then(|_| sink.write_all(&buf).map_err(NdjsonError::from))
                .and_then(|_| match self.flush_policy {
                    FlushPolicy::PerRecord => sink.flush().map_err(NdjsonError::from),
                    FlushPolicy::Transport => Ok(()),
                });
            if let Err(e) = res {
                tracing::warn!(records = summary.records, error = %e, "NDJSON stream aborted");
                return Err(e);
            }
            summary.records += 1;
            summary.bytes += buf.len();
            buf.clear();
        }
        tracing::debug!(records = summary.records, bytes = summary.bytes, "NDJSON stream completed");
        Ok(summary)
    }

    /// Async writer. Returns only after the source signalled completion and the
    /// last record was handed to the sink.
    pub async fn write_async<W, T>(
        &self,
        sink: &mut W,
        source: RecordSource<T>,
    ) -> Result<NdjsonWriteSummary, NdjsonError>
    where
        W: AsyncWrite + Unpin + ?Sized,
        T: Serialize + Send + 'static,
    {
        let mut summary = NdjsonWriteSummary::default();
        let mut buf = BytesMut::new();
        let mut records = source.into_stream(self.channel_capacity);
        while let Some(record_res) = records.next().await {
            if let Err(e) = self.write_one_async(sink, record_res, &mut buf).await {
                tracing::warn!(records = summary.records, error = %e, "NDJSON stream aborted");
                return Err(e);
            }
            summary.records += 1;
            summary.bytes += buf.len();
            buf.clear();
        }
        tracing::debug!(records = summary.records, bytes = summary.bytes, "NDJSON stream completed");
        Ok(summary)
    }

    async fn write_one_async<W, T>(
        &self,
        sink: &mut W,
        record_res: Result<T, axum::Error>,
        buf: &mut BytesMut,
    ) -> Result<(), NdjsonError>
    where
        W: AsyncWrite + Unpin + ?Sized,
        T: Serialize,
    {
        let record = record_res.map_err(NdjsonError::Source)?;
        encode_record(&record, buf)?;
        sink.write_all(&buf[..]).await?;
        if self.flush_policy == FlushPolicy::PerRecord {
            sink.flush().await?;
        }
        Ok(())
    }
}
