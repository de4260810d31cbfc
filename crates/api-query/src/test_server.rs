use crate::config::WebConfig;
use crate::router::make_app;
use crate::state::AppState;
use core_executor::engine::duckdb::DuckDbEngine;
use core_executor::service::CoreExecutionService;
use core_executor::utils::Config;
use std::net::SocketAddr;
use std::sync::Arc;

#[allow(clippy::unwrap_used, clippy::expect_used)]
pub async fn run_test_server_with_config(config: WebConfig) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("0.0.0.0:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let engine = DuckDbEngine::open(":memory:").expect("Failed to open in-memory database");
    let execution_svc = Arc::new(CoreExecutionService::new(
        Arc::new(engine),
        Arc::new(Config::default()),
    ));
    let app = make_app(AppState::new(execution_svc, Arc::new(config)))
        .unwrap()
        .into_make_service_with_connect_info::<SocketAddr>();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

pub async fn run_test_server() -> SocketAddr {
    run_test_server_with_config(WebConfig::default()).await
}
