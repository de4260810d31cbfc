pub(crate) mod cli;

use api_query::config::WebConfig;
use api_query::router::make_app;
use api_query::state::AppState;
use clap::Parser;
use core_executor::engine::duckdb::DuckDbEngine;
use core_executor::service::CoreExecutionService;
use dotenv::dotenv;
use std::fs::{self, File, OpenOptions};
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{Layer, layer::SubscriberExt, util::SubscriberInitExt};

const TARGETS: [&str; 3] = ["quackd", "api_query", "core_executor"];

#[tokio::main]
#[allow(clippy::expect_used, clippy::print_stderr)]
async fn main() {
    dotenv().ok();

    let opts = cli::CliOpts::parse();

    if let Err(err) = setup_tracing(&opts) {
        eprintln!("Failed to open log files: {err}");
        std::process::exit(1);
    }

    let execution_cfg = opts.execution_config();
    let web_config = WebConfig {
        host: opts.host.clone(),
        port: opts.port,
        allow_origin: opts.cors_allow_origin.clone(),
        assets_dir: Some(opts.assets_dir.clone()),
    };

    let engine = DuckDbEngine::open(&execution_cfg.database).expect("Failed to open database");
    engine.load_extensions(&execution_cfg.extensions);
    tracing::info!(
        database = engine.target(),
        version = %core_executor::engine::Engine::version(&engine),
        "DuckDB ready"
    );

    let execution_svc = Arc::new(CoreExecutionService::new(
        Arc::new(engine),
        Arc::new(execution_cfg),
    ));
    let app = make_app(AppState::new(execution_svc, Arc::new(web_config.clone())))
        .expect("Invalid CORS allow origin")
        .into_make_service_with_connect_info::<SocketAddr>();

    let host = web_config.host.clone();
    let port = web_config.port;
    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .expect("Failed to bind to address");
    let addr = listener.local_addr().expect("Failed to get local address");
    tracing::info!("Listening on http://{}", addr);

    let ui_url = web_config.ui_url();
    tracing::info!("Notebook UI available at {ui_url}");
    if opts.open {
        open_browser(&ui_url);
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");
}

fn targets_with_level(level: LevelFilter) -> Vec<(&'static str, LevelFilter)> {
    TARGETS.iter().map(|t| ((*t), level)).collect()
}

fn open_log(dir: &Path, name: &str) -> std::io::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(name))
}

#[allow(clippy::print_stderr)]
fn setup_tracing(opts: &cli::CliOpts) -> std::io::Result<()> {
    let level: LevelFilter = opts.tracing_level.clone().into();
    let targets = match std::env::var("RUST_LOG") {
        Ok(val) => match val.parse::<Targets>() {
            Ok(log_targets_from_env) => log_targets_from_env,
            Err(err) => {
                eprintln!("Failed to parse RUST_LOG: {err:?}");
                Targets::default()
                    .with_targets(targets_with_level(LevelFilter::DEBUG))
                    .with_default(LevelFilter::DEBUG)
            }
        },
        _ => Targets::default()
            .with_targets(targets_with_level(level))
            .with_default(LevelFilter::WARN),
    };

    // error.log keeps failures only, combined.log everything the console shows
    let (error_layer, combined_layer) = match &opts.log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let error_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(open_log(dir, "error.log")?)
                .with_target(true)
                .with_filter(LevelFilter::ERROR);
            let combined_layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(open_log(dir, "combined.log")?)
                .with_target(true)
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(targets.clone());
            (Some(error_layer), Some(combined_layer))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_filter(targets),
        )
        .with(error_layer)
        .with(combined_layer)
        .init();
    Ok(())
}

fn open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    let mut command = std::process::Command::new("open");
    #[cfg(target_os = "windows")]
    let mut command = {
        let mut command = std::process::Command::new("cmd");
        command.args(["/C", "start", ""]);
        command
    };
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    let mut command = std::process::Command::new("xdg-open");

    if let Err(err) = command.arg(url).spawn() {
        tracing::warn!(%url, error = %err, "could not open a browser");
    }
}

/// This func will wait for a signal to shutdown the service.
/// It will wait for either a Ctrl+C signal or a SIGTERM signal.
///
/// # Panics
/// If the function fails to install the signal handler, it will panic.
#[allow(clippy::expect_used, clippy::redundant_pub_crate)]
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::warn!("Ctrl+C received, starting graceful shutdown");
        },
        () = terminate => {
            tracing::warn!("SIGTERM received, starting graceful shutdown");
        },
    }
}
