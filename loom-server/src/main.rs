//! Composition root: wires the Settings, State Store, Version Manager,
//! Context Engine, Session Manager, and external generator into a single
//! running HTTP process, then serves the `/api/v1/design-sessions` surface.

mod api;
mod state;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loom_context::ContextEngine;
use loom_core::config::Settings;
use loom_session::{PlaceholderGenerator, SessionManager, TimeoutGenerator, VersionManager};
use loom_storage::RedisStateStore;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let settings = Settings::from_env().context("failed to load configuration")?;

    let store = Arc::new(
        RedisStateStore::connect_with_ttl(&settings.redis_url, settings.session_ttl)
            .await
            .context("failed to connect to the Redis state store")?,
    );

    let version_manager = VersionManager::new(
        store.clone(),
        settings.max_versions_per_session,
        settings.compression_keep_recent,
    );
    let context_engine = ContextEngine::new(settings.confidence_threshold);
    let session_manager = Arc::new(SessionManager::new(
        store,
        version_manager,
        context_engine,
        settings.context_limit,
        settings.session_ttl,
    ));

    let generator = Arc::new(TimeoutGenerator::new(
        PlaceholderGenerator,
        settings.generator_timeout,
    ));

    let app_state = AppState {
        session_manager,
        generator,
    };

    let app = api::router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .layer(TimeoutLayer::new(Duration::from_secs(30))),
    );

    let addr = format!("{}:{}", settings.host, settings.port);
    let socket_addr: std::net::SocketAddr =
        addr.parse().context("failed to parse host/port into a socket address")?;

    let listener = tokio::net::TcpListener::bind(&socket_addr)
        .await
        .context("failed to bind to address")?;

    info!("loom-server listening on http://{addr}");
    info!("  POST /api/v1/design-sessions");
    info!("  GET  /api/v1/design-sessions/:sid");
    info!("  POST /api/v1/design-sessions/:sid/edit");
    info!("  GET  /api/v1/design-sessions/:sid/history");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}

/// Structured, env-filterable logging (SPEC_FULL §10.1), grounded on the
/// teacher's `tracing_subscriber::fmt().with_env_filter(...)` setup.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();
}
