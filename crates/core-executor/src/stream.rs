use crate::codec::convert_row;
use crate::engine::Engine;
use crate::error::{ExecutionResult, SerializeBatchSnafu};
use crate::lease::ConnectionLease;
use crate::models::{ColumnDescriptor, ResultBatch};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use snafu::ResultExt;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    /// The engine signalled the end of the result.
    Completed { batches: usize, rows: usize },
    /// The consumer went away; remaining batches were never pulled.
    Aborted { batches: usize, rows: usize },
}

/// Encoded result segments of one streaming query, in engine order.
///
/// Each item is one JSON array of rows followed by `\n`. Dropping the stream
/// cancels the worker producing it.
pub struct QueryStream {
    columns: Vec<ColumnDescriptor>,
    segments: ReceiverStream<Bytes>,
    _cancel: DropGuard,
}

impl QueryStream {
    pub(crate) fn new(
        columns: Vec<ColumnDescriptor>,
        segments: mpsc::Receiver<Bytes>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            columns,
            segments: ReceiverStream::new(segments),
            _cancel: cancel.drop_guard(),
        }
    }

    #[must_use]
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }
}

impl Stream for QueryStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.segments.poll_next_unpin(cx).map(|segment| segment.map(Ok))
    }
}

impl std::fmt::Debug for QueryStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryStream")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

/// Serializes one batch as a newline-terminated JSON array of row objects.
pub fn encode_segment(batch: &ResultBatch) -> ExecutionResult<Bytes> {
    let rows: Vec<_> = batch
        .rows()
        .iter()
        .map(|row| convert_row(batch.columns(), row))
        .collect();
    let mut segment = serde_json::to_vec(&rows).context(SerializeBatchSnafu)?;
    segment.push(b'\n');
    Ok(Bytes::from(segment))
}

pub(crate) type StreamStart = ExecutionResult<Vec<ColumnDescriptor>>;

/// Blocking side of a streaming query.
///
/// Reports the column list (or the pre-stream failure) on `started` before
/// producing any segment, then pushes one segment per non-empty batch. The
/// lease is released before anything is reported on every path. Returns
/// `None` when the query failed.
pub(crate) fn stream_worker(
    engine: &Arc<dyn Engine>,
    query: &str,
    started: oneshot::Sender<StreamStart>,
    segments: &mpsc::Sender<Bytes>,
    cancel: &CancellationToken,
) -> Option<StreamOutcome> {
    let mut started = Some(started);
    let result = ConnectionLease::acquire(engine.as_ref()).and_then(|mut lease| {
        let outcome = pump(&mut lease, query, &mut started, segments, cancel);
        lease.release();
        outcome
    });
    match result {
        Ok(outcome) => {
            tracing::info!(?outcome, "query stream finished");
            Some(outcome)
        }
        Err(error) => {
            match started.take() {
                // The receiver may already be gone, nothing left to tell.
                Some(started) => drop(started.send(Err(error))),
                None => tracing::error!(%error, "query stream failed after it started"),
            }
            None
        }
    }
}

fn pump(
    lease: &mut ConnectionLease,
    query: &str,
    started: &mut Option<oneshot::Sender<StreamStart>>,
    segments: &mpsc::Sender<Bytes>,
    cancel: &CancellationToken,
) -> ExecutionResult<StreamOutcome> {
    let session = lease.session()?;
    let mut cursor = session.execute(query)?;
    if let Some(started) = started.take() {
        if started.send(Ok(cursor.columns().to_vec())).is_err() {
            return Ok(StreamOutcome::Aborted {
                batches: 0,
                rows: 0,
            });
        }
    }

    let (mut batches, mut rows) = (0, 0);
    loop {
        if cancel.is_cancelled() {
            return Ok(StreamOutcome::Aborted { batches, rows });
        }
        let Some(batch) = cursor.next_batch()? else {
            break;
        };
        if batch.is_empty() {
            continue;
        }
        let segment = encode_segment(&batch)?;
        if cancel.is_cancelled() || segments.blocking_send(segment).is_err() {
            return Ok(StreamOutcome::Aborted { batches, rows });
        }
        batches += 1;
        rows += batch.len();
        tracing::trace!(batches, rows, "segment sent");
    }
    Ok(StreamOutcome::Completed { batches, rows })
}
