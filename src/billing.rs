//! # Billing Client
//!
//! Process-wide billing handle, constructed once at startup from the two
//! required billing secrets and passed through [`crate::state::AppState`].
//! Missing credentials abort startup in `Config::from_env`; this module
//! re-asserts them so the client can never exist half-configured.
//!
//! Charge and webhook handling are out of scope; the handle exposes the
//! preauthorized HTTP client and the public-safe publishable key only.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use axum::http::{header, HeaderMap, HeaderValue};
use std::fmt;

pub struct BillingClient {
    publishable_key: String,
    http: reqwest::Client,
}

// The secret key lives only inside the preconfigured Authorization header;
// keep it out of Debug output.
impl fmt::Debug for BillingClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BillingClient")
            .field("publishable_key", &self.publishable_key)
            .field("secret_key", &"[redacted]")
            .finish()
    }
}

impl BillingClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        if config.billing_secret_key.trim().is_empty() {
            return Err(AppError::Config("billing secret key is empty".to_string()));
        }
        if config.billing_publishable_key.trim().is_empty() {
            return Err(AppError::Config("billing publishable key is empty".to_string()));
        }

        let mut bearer =
            HeaderValue::from_str(&format!("Bearer {}", config.billing_secret_key))
                .map_err(|_| AppError::Config("billing secret key is not header-safe".to_string()))?;
        bearer.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(AppError::Backend)?;

        Ok(BillingClient {
            publishable_key: config.billing_publishable_key.clone(),
            http,
        })
    }

    /// Public-safe key for client-side billing setup.
    pub fn publishable_key(&self) -> &str {
        &self.publishable_key
    }

    /// Preauthorized client for billing API calls.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }
}
