use crate::engine::duckdb::IN_MEMORY;

pub const DEFAULT_STREAM_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `:memory:` or a database file path.
    pub database: String,
    /// Community extensions installed and loaded once at startup.
    pub extensions: Vec<String>,
    /// Encoded segments buffered between the engine worker and the transport.
    pub stream_channel_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: IN_MEMORY.to_string(),
            extensions: vec!["nanoarrow".to_string()],
            stream_channel_capacity: DEFAULT_STREAM_CHANNEL_CAPACITY,
        }
    }
}

impl Config {
    #[must_use]
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    #[must_use]
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    #[must_use]
    pub fn with_stream_channel_capacity(mut self, capacity: usize) -> Self {
        self.stream_channel_capacity = capacity.max(1);
        self
    }
}
