use axum::Router;
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// Serves the notebook UI from `dir` for every path no other route claims.
/// A missing directory is logged and skipped so the API still comes up.
pub fn with_web_assets<S>(router: Router<S>, dir: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "web assets directory not found, UI disabled");
        return router;
    }
    tracing::info!(dir = %dir.display(), "serving web assets");
    let service = ServeDir::new(dir)
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new(dir.join("index.html")));
    router.fallback_service(service)
}
