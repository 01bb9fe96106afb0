use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use nimgate_rs::config::{load_runtime_config, AppConfig, CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH};
use nimgate_rs::observability::init_tracing;
use nimgate_rs::routing::dispatch::{dispatch_request, normalize_base_path};
use nimgate_rs::state::AppState;

fn main() {
    let config_path =
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_runtime_config(&config_path).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration from '{config_path}': {e}");
        eprintln!("See 'config.example.yaml' for the available settings.");
        std::process::exit(1);
    });

    init_tracing(&config.features.log_level);
    let runtime = build_runtime(&config);

    runtime.block_on(async move {
        run(config).await;
    });
}

fn build_runtime(config: &AppConfig) -> tokio::runtime::Runtime {
    let worker_threads = config.server.runtime_worker_threads;
    let mut runtime_builder = if worker_threads == Some(1) {
        tokio::runtime::Builder::new_current_thread()
    } else {
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        if let Some(threads) = worker_threads {
            builder.worker_threads(threads);
        }
        builder
    };
    runtime_builder.enable_io();
    runtime_builder.enable_time();
    runtime_builder.build().unwrap_or_else(|e| {
        eprintln!("Failed to initialize Tokio runtime: {e}");
        std::process::exit(1);
    })
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "ENABLED"
    } else {
        "DISABLED"
    }
}

async fn run(config: AppConfig) {
    let host = config.server.host.clone();
    let port = config.server.port;
    let base_path = normalize_base_path(&config.server.base_path);

    let state = match AppState::from_config(config) {
        Ok(state) => Arc::new(state),
        Err(err) => {
            eprintln!("Failed to initialize proxy: {err}");
            std::process::exit(1);
        }
    };
    let dispatch_base_path = Arc::<str>::from(base_path.clone());

    let listener = tokio::net::TcpListener::bind(format!("{host}:{port}"))
        .await
        .unwrap_or_else(|err| {
            eprintln!("Failed to bind to {host}:{port}: {err}");
            std::process::exit(1);
        });

    let features = &state.config.features;
    tracing::info!(
        "nimgate-rs listening on {}:{} with base_path='{}', upstream={}",
        host,
        port,
        base_path,
        state.transport.chat_url()
    );
    tracing::info!("Health check: http://localhost:{port}{base_path}/health");
    tracing::info!("Reasoning display: {}", enabled(features.show_reasoning));
    tracing::info!("Thinking mode: {}", enabled(features.enable_thinking_mode));
    tracing::info!(prompts = state.catalog.len(), "prompt catalog loaded");

    serve_accept_loop(
        listener,
        AutoBuilder::new(TokioExecutor::new()),
        state,
        dispatch_base_path,
    )
    .await;
}

async fn serve_accept_loop(
    listener: tokio::net::TcpListener,
    conn_builder: AutoBuilder<TokioExecutor>,
    dispatch_state: Arc<AppState>,
    dispatch_base_path: Arc<str>,
) {
    loop {
        let (stream, remote_addr) = match listener.accept().await {
            Ok((stream, remote_addr)) => (stream, remote_addr),
            Err(err) => {
                tracing::warn!("accept error: {err}");
                continue;
            }
        };

        if let Err(err) = stream.set_nodelay(true) {
            tracing::debug!("failed to enable TCP_NODELAY for {remote_addr}: {err}");
        }

        let io = TokioIo::new(stream);
        let conn_builder = conn_builder.clone();
        let request_state = Arc::clone(&dispatch_state);
        let request_base_path = Arc::clone(&dispatch_base_path);
        let hyper_service = service_fn(move |request: Request<Incoming>| {
            dispatch_request(
                Arc::clone(&request_state),
                Arc::clone(&request_base_path),
                request.map(Body::new),
            )
        });

        tokio::spawn(async move {
            if let Err(err) = conn_builder.serve_connection(io, hyper_service).await {
                tracing::debug!("failed to serve connection from {remote_addr}: {err:#}");
            }
        });
    }
}
