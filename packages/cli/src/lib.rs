// ABOUTME: Bookclub server library: configuration, HTTP API, and process wiring
// ABOUTME: Shared by the `bookclub` binary and the API integration tests

use anyhow::Context;
use axum::http::Method;
use axum::Router;
use bookclub_config::constants;
use bookclub_storage::connect;
use bookclub_voting::{StaticMemberDirectory, VoteRateLimiter, VotingService};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;

use api::AppState;
use config::Config;
use middleware::VoteRateLimit;

// Prefix match: covers every bookclub_* crate
const DEFAULT_LOG_FILTER: &str = "bookclub=info,tower_http=info";

/// Install the global tracing subscriber. RUST_LOG overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env(constants::RUST_LOG)
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // A second call (e.g. from tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Voting service wired to `pool` with the configured members, timeout, and vote throttle
pub fn build_service(pool: SqlitePool, config: &Config) -> VotingService {
    let members = StaticMemberDirectory::new(
        config.approved_members.iter().cloned(),
        config.admins.iter().cloned(),
    );
    let rate_limiter: Arc<dyn VoteRateLimiter> =
        Arc::new(VoteRateLimit::new(config.rate_limit.clone()));

    VotingService::new(pool, Arc::new(members))
        .with_rate_limiter(rate_limiter)
        .with_store_timeout(config.store_timeout)
}

/// Open the database, run startup housekeeping, and build the handler state
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let pool = connect(&config.storage())
        .await
        .with_context(|| format!("opening database at {}", config.database_path.display()))?;

    let service = build_service(pool, config);
    service
        .initialize()
        .await
        .context("initializing voting rounds")?;

    Ok(AppState {
        service: Arc::new(service),
        vote_retry_after: config.rate_limit.retry_after_secs(),
    })
}

/// Router with tracing, CORS, and panic recovery layers
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any);

    api::create_router(state)
        .layer(middleware::create_panic_handler())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = build_state(&config).await?;
    let app = build_app(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;

    info!("Bookclub API listening on http://{}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => {
            warn!("Cannot listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
