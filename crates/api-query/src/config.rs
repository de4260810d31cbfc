use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_ASSETS_DIR: &str = "public/quackbook";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
    /// Single allowed origin. `None` allows any origin.
    pub allow_origin: Option<String>,
    /// Notebook UI served for every path no API route claims.
    pub assets_dir: Option<PathBuf>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3000,
            allow_origin: None,
            assets_dir: None,
        }
    }
}

impl WebConfig {
    /// Address the notebook UI is reachable at once the server is up.
    #[must_use]
    pub fn ui_url(&self) -> String {
        let Self { host, port, .. } = self;
        format!("http://{host}:{port}/#/?quackMode=true&serverPort={port}")
    }
}
