//! # Application State
//!
//! This module defines the shared state that's accessible to all request
//! handlers. Everything here is constructed exactly once at process start
//! and cloned per request; the clones are cheap because each field is an
//! `Arc` (or wraps one internally, as `reqwest::Client` does).
//!
//! Nothing in the state holds per-request data. The session gate's cookie
//! context is created fresh for every evaluation, so concurrent requests
//! never observe each other's cookies.

use crate::auth::client::{AuthBackend, AuthClient};
use crate::billing::BillingClient;
use crate::config::Config;
use crate::error::AppResult;
use crate::middleware::gate::RoutePolicy;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Immutable startup configuration
    pub config: Arc<Config>,

    /// Path policy evaluated by the session gate
    pub policy: Arc<RoutePolicy>,

    /// Session/auth backend, behind the trait seam so tests can stub it
    pub auth: Arc<dyn AuthBackend>,

    /// Billing handle (publishable key + preauthorized client)
    pub billing: Arc<BillingClient>,
}

impl AppState {
    /// Initialize application state from configuration.
    ///
    /// # Errors
    /// Fails when the HTTP clients cannot be constructed or the billing
    /// credentials are unusable; either aborts startup before any request
    /// is served.
    pub fn new(config: Config) -> AppResult<Self> {
        let auth = AuthClient::new(&config)?;
        let billing = BillingClient::new(&config)?;
        let policy = RoutePolicy::from_config(&config);

        Ok(AppState {
            config: Arc::new(config),
            policy: Arc::new(policy),
            auth: Arc::new(auth),
            billing: Arc::new(billing),
        })
    }

    /// State with an externally supplied auth backend. Production startup
    /// goes through [`AppState::new`]; tests use this to stub the backend.
    pub fn with_backend(config: Config, auth: Arc<dyn AuthBackend>) -> AppResult<Self> {
        let billing = BillingClient::new(&config)?;
        let policy = RoutePolicy::from_config(&config);
        Ok(AppState {
            config: Arc::new(config),
            policy: Arc::new(policy),
            auth,
            billing: Arc::new(billing),
        })
    }
}
