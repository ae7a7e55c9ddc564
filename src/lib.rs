//! # authgate
//!
//! Authentication-aware request routing: every inbound request passes
//! through a cookie-synchronized session-refresh gate that redirects based
//! on session presence and target path. See `middleware::gate` for the
//! core state machine.

pub mod auth;
pub mod billing;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use crate::handlers::health::health_check;
use crate::handlers::pages::{billing_config, dashboard, login_page, passthrough, signup_page};
use crate::state::AppState;
use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// The session gate wraps every route, including the fallback; its own
/// matcher decides which paths actually enter the state machine.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", get(login_page))
        .route("/signup", get(signup_page))
        .route("/dashboard", get(dashboard))
        .route("/dashboard/{*rest}", get(dashboard))
        .route("/api/billing/config", get(billing_config))
        .fallback(passthrough)
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::gate::session_gate,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
