//! # Authgate Server
//!
//! Entry point for the authentication-aware routing service. Startup is
//! fail-closed: missing backend or billing configuration aborts before the
//! listener is bound. Everything after startup is fail-open per request
//! (see `middleware::gate`).

use authgate::config::Config;
use authgate::state::AppState;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging, filterable via RUST_LOG
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,authgate=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Hard startup error on missing required configuration; no request is
    // served with misconfigured backend or payment credentials.
    let config = Config::from_env()?;
    tracing::info!(backend = %config.auth_backend_url, "configuration loaded");

    let bind_addr = config.bind_address();
    let state = AppState::new(config)?;
    tracing::info!("application state initialized");

    let app = authgate::app(state);

    tracing::info!("starting server on {}", bind_addr);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
