pub mod duckdb;
pub mod type_tree;

use crate::error::ExecutionResult;
use crate::models::{ColumnDescriptor, ResultBatch};

/// The embedded database as seen by the executors: something that hands out
/// exclusive sessions and reports its own version.
#[cfg_attr(test, mockall::automock)]
pub trait Engine: Send + Sync {
    fn connect(&self) -> ExecutionResult<Box<dyn Session>>;

    fn version(&self) -> String;
}

/// One exclusive connection. Closing it returns it to the engine.
pub trait Session: Send {
    /// Submits `query` and returns a pull cursor over its result batches.
    fn execute(&mut self, query: &str) -> ExecutionResult<Box<dyn BatchCursor + '_>>;

    /// Column metadata of `query`'s result without fetching any rows.
    fn describe(&mut self, query: &str) -> ExecutionResult<Vec<ColumnDescriptor>>;

    fn close(self: Box<Self>);
}

pub trait BatchCursor {
    /// Fixed for the lifetime of the cursor.
    fn columns(&self) -> &[ColumnDescriptor];

    /// `Ok(None)` marks the end of the result.
    fn next_batch(&mut self) -> ExecutionResult<Option<ResultBatch>>;
}
