use snafu::prelude::*;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ExecutionError {
    #[snafu(display("Database engine unavailable: {message}"))]
    EngineUnavailable { message: String },

    // Display is the engine message verbatim, clients match on it
    #[snafu(display("{message}"))]
    QueryExecution { message: String },

    #[snafu(display("Failed to open database {target}: {source}"))]
    OpenDatabase {
        target: String,
        source: duckdb::Error,
    },

    #[snafu(display("Failed to serialize result batch: {source}"))]
    SerializeBatch { source: serde_json::Error },

    #[snafu(display("Query worker failed: {source}"))]
    Worker { source: tokio::task::JoinError },

    #[snafu(display("Query worker exited before reporting stream status"))]
    WorkerGone,
}

pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

impl ExecutionError {
    #[must_use]
    pub fn query(err: impl std::fmt::Display) -> Self {
        Self::QueryExecution {
            message: err.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(err: impl std::fmt::Display) -> Self {
        Self::EngineUnavailable {
            message: err.to_string(),
        }
    }
}
