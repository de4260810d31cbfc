use crate::layers::{add_request_metadata, make_cors_middleware};
use crate::queries::handlers::ApiDoc as QueryApiDoc;
use crate::queries::handlers::{describe, query, stream, version};
use crate::state::AppState;
use crate::web_assets::with_web_assets;
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use http::header::InvalidHeaderValue;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Quack Gateway API",
        description = "SQL over HTTP in front of an embedded DuckDB database.",
        version = "0.1.0",
    ),
    tags()
)]
pub struct ApiDoc;

#[must_use]
pub fn open_api_spec() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi().merge_from(QueryApiDoc::openapi())
}

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/query", post(query))
        .route("/stream", post(stream))
        .route("/describe", post(describe))
        .route("/duckdb", get(version))
        .route("/health", get(|| async { Json("OK") }))
        .route("/openapi.json", get(|| async { Json(open_api_spec()) }))
}

/// Full application: API routes, request middleware and, when configured,
/// the static notebook UI as fallback.
pub fn make_app(state: AppState) -> Result<Router, InvalidHeaderValue> {
    let cors = make_cors_middleware(state.config.allow_origin.as_deref())?;
    let assets_dir = state.config.assets_dir.clone();

    let mut router = create_router().with_state(state);
    if let Some(dir) = assets_dir {
        router = with_web_assets(router, &dir);
    }
    Ok(router
        .layer(middleware::from_fn(add_request_metadata))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(CatchPanicLayer::new()))
}
