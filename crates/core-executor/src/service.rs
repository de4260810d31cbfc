use std::sync::Arc;

use snafu::ResultExt;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use super::error::{self as ex_error, ExecutionError, ExecutionResult};
use super::models::{ColumnDescriptor, QueryOutput, RequestContext};
use crate::codec::convert_row;
use crate::engine::Engine;
use crate::lease::ConnectionLease;
use crate::stream::{QueryStream, stream_worker};
use crate::utils::Config;

#[async_trait::async_trait]
pub trait ExecutionService: Send + Sync {
    /// Runs `ctx.query` to completion and returns every row at once.
    async fn query(&self, ctx: RequestContext) -> ExecutionResult<QueryOutput>;
    /// Starts `ctx.query` and returns its result as a stream of encoded
    /// segments. Fails only if the query fails before producing any segment.
    async fn stream(&self, ctx: RequestContext) -> ExecutionResult<QueryStream>;
    async fn describe(&self, query: &str) -> ExecutionResult<Vec<ColumnDescriptor>>;
    async fn engine_version(&self) -> ExecutionResult<String>;
}

pub struct CoreExecutionService {
    engine: Arc<dyn Engine>,
    config: Arc<Config>,
}

impl CoreExecutionService {
    pub fn new(engine: Arc<dyn Engine>, config: Arc<Config>) -> Self {
        Self { engine, config }
    }

    /// Runs `job` with an exclusive lease on a blocking worker thread. The lease
    /// is released before the result is handed back.
    async fn with_lease<T, F>(&self, job: F) -> ExecutionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut ConnectionLease) -> ExecutionResult<T> + Send + 'static,
    {
        let engine = Arc::clone(&self.engine);
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            let mut lease = ConnectionLease::acquire(engine.as_ref())?;
            let result = job(&mut lease);
            lease.release();
            result
        })
        .await
        .context(ex_error::WorkerSnafu)?
    }
}

#[async_trait::async_trait]
impl ExecutionService for CoreExecutionService {
    #[tracing::instrument(name = "ExecutionService::query", level = "debug", skip(self), err)]
    async fn query(&self, ctx: RequestContext) -> ExecutionResult<QueryOutput> {
        let query = ctx.query.clone();
        let (columns, rows) = self
            .with_lease(move |lease| {
                let mut cursor = lease.session()?.execute(&query)?;
                let columns = cursor.columns().to_vec();
                let mut rows = Vec::new();
                while let Some(batch) = cursor.next_batch()? {
                    rows.extend(
                        batch
                            .rows()
                            .iter()
                            .map(|row| convert_row(batch.columns(), row)),
                    );
                }
                Ok((columns, rows))
            })
            .await?;
        tracing::info!(rows = rows.len(), columns = columns.len(), "query finished");

        Ok(QueryOutput {
            rows,
            columns: if ctx.emit_column_metadata {
                columns
            } else {
                Vec::new()
            },
        })
    }

    #[tracing::instrument(name = "ExecutionService::stream", level = "debug", skip(self), err)]
    async fn stream(&self, ctx: RequestContext) -> ExecutionResult<QueryStream> {
        let (started_tx, started_rx) = oneshot::channel();
        let (segments_tx, segments_rx) = mpsc::channel(self.config.stream_channel_capacity.max(1));
        let cancel = CancellationToken::new();

        let engine = Arc::clone(&self.engine);
        let worker_cancel = cancel.clone();
        let span = tracing::Span::current();
        tokio::task::spawn_blocking(move || {
            let _entered = span.enter();
            stream_worker(&engine, &ctx.query, started_tx, &segments_tx, &worker_cancel)
        });

        let columns = started_rx
            .await
            .map_err(|_| ExecutionError::WorkerGone)??;
        Ok(QueryStream::new(columns, segments_rx, cancel))
    }

    #[tracing::instrument(name = "ExecutionService::describe", level = "debug", skip(self), err)]
    async fn describe(&self, query: &str) -> ExecutionResult<Vec<ColumnDescriptor>> {
        let query = query.to_string();
        self.with_lease(move |lease| lease.session()?.describe(&query))
            .await
    }

    #[tracing::instrument(name = "ExecutionService::engine_version", level = "debug", skip(self), err)]
    async fn engine_version(&self) -> ExecutionResult<String> {
        Ok(self.engine.version())
    }
}
