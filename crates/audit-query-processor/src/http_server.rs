//! HTTP server startup: wires the context manager, dispatcher,
//! parser, and safety validator into an orchestrator, assembles the
//! router, and serves it.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::context::memory_monitor::MemoryMonitor;
use crate::context::sweeper::{run_cleanup_sweeper, run_persistence_flusher};
use crate::context::ContextManager;
use crate::dispatch::ModelDispatcher;
use crate::dispatch::health::run_health_ticker;
use crate::orchestrator::Orchestrator;
use crate::parser::RecoveryParser;
use crate::safety::SafetyValidator;
use crate::state::AppState;

pub async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    crate::telemetry::init_tracing();
    crate::metrics::init_metrics();
    config.print_config();
    info!("starting genai-audit-query-processor");

    let config = Arc::new(config);

    let context = Arc::new(ContextManager::new(config.clone()));
    if let Err(err) = context.load_from_disk().await {
        warn!(%err, "failed to load persisted sessions, starting with an empty set");
    }

    let dispatcher = Arc::new(ModelDispatcher::new(&config));
    let parser = Arc::new(RecoveryParser::new(&config));
    let validator = Arc::new(SafetyValidator::new(&config));

    let orchestrator = Arc::new(Orchestrator::new(
        config.clone(),
        context.clone(),
        dispatcher.clone(),
        parser.clone(),
        validator.clone(),
    ));

    let shutdown = Arc::new(tokio::sync::Notify::new());

    tokio::spawn(run_cleanup_sweeper(context.clone(), config.cleanup_interval, shutdown.clone()));
    if config.enable_persistence && config.enable_async_persistence {
        tokio::spawn(run_persistence_flusher(context.clone(), config.persistence_interval, shutdown.clone()));
    }
    tokio::spawn(
        MemoryMonitor::new(
            config.monitor_interval,
            config.memory_warn_threshold,
            config.memory_critical_threshold,
            config.max_memory_mb,
        )
        .run(context.clone(), shutdown.clone()),
    );
    tokio::spawn(run_health_ticker(
        dispatcher.health_snapshot(),
        config.health_check_interval,
        config.health_check_timeout,
        shutdown.clone(),
    ));

    let state = AppState { config: config.clone(), context: context.clone(), orchestrator };

    let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.api_host, config.api_port)).await?;
    info!("listening on {}:{}", config.api_host, config.api_port);

    let app = build_router(state);
    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    server.await?;

    shutdown.notify_waiters();
    context.close().await;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

fn build_router(state: AppState) -> axum::Router {
    use axum::routing::{get, post};
    use axum::Router;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::timeout::TimeoutLayer;
    use tower_http::trace::TraceLayer;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST, axum::http::Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION])
        .max_age(Duration::from_secs(86_400));

    let request_timeout = state.config.request_timeout;

    Router::new()
        .route("/query", post(crate::api::handle_query).fallback(crate::api::reject_query_method))
        .route("/health", get(crate::api::handle_health))
        .route("/openapi.json", get(crate::api::openapi_json))
        .route("/docs", get(crate::api::docs_page))
        .route("/redoc", get(crate::api::redoc_page))
        .route("/metrics", get(crate::metrics::get_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .with_state(state)
}
