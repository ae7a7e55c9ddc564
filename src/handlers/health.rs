//! # Health Check Handler
//!
//! Simple endpoint to check if the server is running.
//! Used by load balancers and monitoring systems.

use axum::Json;
use serde_json::{json, Value};

/// Health check endpoint
///
/// Always returns 200 OK with a small JSON body. This handler never fails,
/// so it returns `Json<Value>` directly instead of `AppResult<Json<Value>>`.
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "authgate"
    }))
}
