//! # Configuration Management
//!
//! This module handles loading configuration from environment variables.
//! It uses the "12-factor app" methodology where configuration comes from the environment.
//!
//! ## Environment Variables
//! - `HOST`: Server bind address (default: 127.0.0.1)
//! - `PORT`: Server port (default: 8080)
//! - `AUTH_BACKEND_URL`: Base URL of the session/auth backend (required)
//! - `AUTH_ANON_KEY`: Anonymous API key for the auth backend (required)
//! - `BILLING_SECRET_KEY`: Billing secret key (required)
//! - `BILLING_PUBLISHABLE_KEY`: Public-safe billing key (required)
//! - `PROTECTED_PREFIX`: Path prefix requiring a session (default: /dashboard)
//! - `LOGIN_PATH` / `SIGNUP_PATH`: Authed-out pages (defaults: /login, /signup)
//!
//! Missing required variables fail process startup. Silent misconfiguration
//! of backend or payment credentials is unacceptable, so this is the one
//! place in the system that fails closed.

use anyhow::{bail, Result};
use std::env;

/// Application configuration
///
/// Constructed once at process start and shared by reference through
/// [`crate::state::AppState`]; nothing reconstructs it per request and
/// nothing reads the process environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server host/IP address to bind to
    pub host: String,

    /// Server port number (1-65535)
    pub port: u16,

    /// Base URL of the session/auth backend, e.g. "https://auth.example.com"
    pub auth_backend_url: String,

    /// Anonymous API key sent as `apikey` on every auth-backend call
    pub auth_anon_key: String,

    /// Billing secret key (never logged, never serialized)
    pub billing_secret_key: String,

    /// Billing publishable key, safe to expose to clients
    pub billing_publishable_key: String,

    /// Path prefix that requires a valid session (literal prefix match)
    pub protected_prefix: String,

    /// Login page path; unauthenticated protected-path requests redirect here
    pub login_path: String,

    /// Signup page path; like the login path, hidden from authed users
    pub signup_path: String,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Loads a `.env` file first (if present) using dotenvy, then reads each
    /// value from the environment. Optional values fall back to defaults;
    /// required values produce a hard startup error when absent.
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists (dotenvy doesn't error if file missing)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a Config from an arbitrary variable lookup.
    ///
    /// Separated from [`Config::from_env`] so tests can exercise the
    /// missing-variable failures without mutating the process environment.
    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| -> Result<String> {
            match get(key) {
                Some(v) if !v.trim().is_empty() => Ok(v),
                _ => bail!("required environment variable {key} is not set"),
            }
        };

        Ok(Config {
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),

            // Parse string to u16, return error if invalid
            port: get("PORT").unwrap_or_else(|| "8080".to_string()).parse()?,

            auth_backend_url: required("AUTH_BACKEND_URL")?
                .trim_end_matches('/')
                .to_string(),
            auth_anon_key: required("AUTH_ANON_KEY")?,

            billing_secret_key: required("BILLING_SECRET_KEY")?,
            billing_publishable_key: required("BILLING_PUBLISHABLE_KEY")?,

            protected_prefix: get("PROTECTED_PREFIX").unwrap_or_else(|| "/dashboard".to_string()),
            login_path: get("LOGIN_PATH").unwrap_or_else(|| "/login".to_string()),
            signup_path: get("SIGNUP_PATH").unwrap_or_else(|| "/signup".to_string()),
        })
    }

    /// Get the socket address to bind the server to
    ///
    /// Combines host and port into a format suitable for TCP binding.
    /// Example: "127.0.0.1:8080"
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
