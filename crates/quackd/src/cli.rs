use clap::{Parser, ValueEnum};
use core_executor::utils::{Config as ExecutionConfig, DEFAULT_STREAM_CHANNEL_CAPACITY};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(version, about, long_about=None)]
pub struct CliOpts {
    #[arg(long, env = "QUACK_HOST", default_value = "localhost", help = "Host to bind to")]
    pub host: String,

    #[arg(long, env = "QUACK_PORT", default_value = "3000", help = "Port to bind to")]
    pub port: u16,

    #[arg(
        long,
        env = "QUACK_DB",
        default_value = ":memory:",
        help = "Database file, or :memory: for a transient in-memory database"
    )]
    pub db: String,

    #[arg(
        long,
        env = "QUACK_OPEN",
        default_value = "false",
        help = "Open the notebook UI in a browser once the server is up"
    )]
    pub open: bool,

    #[arg(
        long = "extension",
        env = "QUACK_EXTENSIONS",
        value_delimiter = ',',
        default_value = "nanoarrow",
        help = "Community extension to install and load at startup, can be repeated",
        help_heading = "Engine Options"
    )]
    pub extensions: Vec<String>,

    #[arg(
        long,
        help = "Skip loading extensions",
        help_heading = "Engine Options"
    )]
    pub no_extensions: bool,

    #[arg(
        long,
        env = "QUACK_STREAM_CAPACITY",
        default_value_t = DEFAULT_STREAM_CHANNEL_CAPACITY,
        value_parser = clap::value_parser!(usize),
        help = "Encoded segments buffered ahead of a slow streaming client",
        help_heading = "Engine Options"
    )]
    pub stream_channel_capacity: usize,

    #[arg(
        long,
        env = "QUACK_ASSETS_DIR",
        default_value = api_query::config::DEFAULT_ASSETS_DIR,
        help = "Directory with the notebook UI static assets"
    )]
    pub assets_dir: PathBuf,

    #[arg(long, env = "CORS_ALLOW_ORIGIN", help = "CORS Allow Origin, any origin when unset")]
    pub cors_allow_origin: Option<String>,

    #[arg(
        long,
        env = "QUACK_LOG_DIR",
        help = "Directory for error.log and combined.log, console only when unset"
    )]
    pub log_dir: Option<PathBuf>,

    #[arg(
        long,
        value_enum,
        env = "TRACING_LEVEL",
        default_value = "info",
        help = "Tracing level, it can be overrided by *RUST_LOG* env var"
    )]
    pub tracing_level: TracingLevel,
}

impl CliOpts {
    pub fn execution_config(&self) -> ExecutionConfig {
        let extensions = if self.no_extensions {
            Vec::new()
        } else {
            self.extensions
                .iter()
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect()
        };
        ExecutionConfig::default()
            .with_database(self.db.clone())
            .with_extensions(extensions)
            .with_stream_channel_capacity(self.stream_channel_capacity)
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum TracingLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TracingLevel> for LevelFilter {
    fn from(level: TracingLevel) -> Self {
        match level {
            TracingLevel::Off => Self::OFF,
            TracingLevel::Error => Self::ERROR,
            TracingLevel::Warn => Self::WARN,
            TracingLevel::Info => Self::INFO,
            TracingLevel::Debug => Self::DEBUG,
            TracingLevel::Trace => Self::TRACE,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = CliOpts::try_parse_from(["quackd"]).unwrap();
        assert_eq!(opts.host, "localhost");
        assert_eq!(opts.port, 3000);
        assert!(!opts.open);
        let config = opts.execution_config();
        assert_eq!(config.database, ":memory:");
        assert_eq!(config.extensions, vec!["nanoarrow".to_string()]);
        assert_eq!(config.stream_channel_capacity, 1);
    }

    #[test]
    fn test_extensions() {
        let opts = CliOpts::try_parse_from([
            "quackd",
            "--extension",
            "spatial",
            "--extension",
            "httpfs",
            "--db",
            "ducks.db",
        ])
        .unwrap();
        let config = opts.execution_config();
        assert_eq!(config.extensions, vec!["spatial", "httpfs"]);
        assert_eq!(config.database, "ducks.db");

        let opts = CliOpts::try_parse_from(["quackd", "--no-extensions"]).unwrap();
        assert!(opts.execution_config().extensions.is_empty());
    }

    #[test]
    fn test_stream_capacity_is_at_least_one() {
        let opts = CliOpts::try_parse_from(["quackd", "--stream-channel-capacity", "0"]).unwrap();
        assert_eq!(opts.execution_config().stream_channel_capacity, 1);
    }
}
