mod assistant;
mod chat;
mod config;
mod estimator;
mod models;
mod report;
mod routes;

use anyhow::Context;
use routes::AppState;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{CorsLayer, Any};
use tracing_subscriber::{fmt, EnvFilter};

use crate::{assistant::AssistantClient, config::Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = Config::from_env();
    tracing::info!("Using assistant endpoint: {} (probe timeout {:?})", config.api_url, config.probe_timeout);

    let state = AppState {
        sessions: Arc::default(),
        assistant: Arc::new(AssistantClient::new(&config)),
    };

    spawn_session_sweeper(state.clone(), config.session_ttl);

    let app = routes::router(state).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    tracing::info!(%addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}

const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

fn spawn_session_sweeper(state: AppState, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = routes::expire_idle_sessions(&state, ttl);
            if removed > 0 {
                tracing::info!("🧹 Dropped {} idle chat session(s)", removed);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
