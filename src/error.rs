//! # Error Handling
//!
//! This module defines custom error types for the application and handles
//! converting them into HTTP responses.
//!
//! Note that most failures around the session gate are deliberately NOT
//! represented here: a failed session check degrades to "unauthenticated"
//! and a cookie write outside a mutable context is swallowed (see the
//! `auth` module). `AppError` covers the places where an error genuinely
//! reaches a caller: startup configuration, backend round trips made on
//! behalf of a handler, and handler-level authorization.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-wide error type
///
/// The `#[from]` attributes enable automatic conversion with the `?`
/// operator, so backend client code can write `resp.json().await?` and have
/// reqwest/serde errors land in the right variant.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid startup configuration.
    ///
    /// This is the only fail-closed error in the system: it aborts process
    /// startup before any request is served.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors talking to the session/auth backend (network, TLS, HTTP)
    #[error("Auth backend error: {0}")]
    Backend(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Authentication/authorization errors (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server errors (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Convert AppError into an HTTP response
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted into proper HTTP error responses.
/// Detailed errors are logged server-side; the response body carries a
/// generic message so backend internals never leak to clients.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Config(e) => {
                tracing::error!("Configuration error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Configuration error".to_string())
            }
            AppError::Backend(e) => {
                tracing::error!("Auth backend error: {:?}", e);
                (StatusCode::BAD_GATEWAY, "Auth backend error".to_string())
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string())
            }
            // For these errors, the custom message is safe to show to users
            AppError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, self.to_string()),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;
