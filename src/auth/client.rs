//! # Backend Session Client
//!
//! Talks to the session/auth backend over HTTP: validates access tokens,
//! refreshes expired sessions, and fetches the authenticated identity.
//!
//! The client itself is stateless across requests. It holds only the
//! backend URL, the anonymous API key, and a shared connection pool; all
//! per-request cookie state lives in the [`CookieStore`] passed into each
//! call, so one request's cookie context can never leak into another's.

use crate::auth::cookies::{CookieOptions, CookieStore};
use crate::auth::principal::{self, PrincipalData};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use cookie::SameSite;
use serde::Deserialize;
use serde_json::{json, Value};

/// Cookie carrying the short-lived access token (JWT)
pub const ACCESS_TOKEN_COOKIE: &str = "sb-access-token";
/// Cookie carrying the long-lived refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "sb-refresh-token";

/// Refresh tokens outlive access tokens; 30 days of inactivity
const REFRESH_TOKEN_MAX_AGE_SECS: i64 = 30 * 24 * 60 * 60;

/// The authenticated identity as reported by the auth backend.
///
/// Only `id` and `email` are consumed directly; the remaining fields are
/// kept as raw JSON so the principal loader can merge them without this
/// crate re-specifying the backend's identity schema.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthUser {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

impl AuthUser {
    /// Rebuild the identity as the JSON object the backend sent.
    pub fn to_json(&self) -> Value {
        let mut object = self.extra.clone();
        object.insert("id".to_string(), Value::String(self.id.clone()));
        if let Some(email) = &self.email {
            object.insert("email".to_string(), Value::String(email.clone()));
        }
        Value::Object(object)
    }
}

/// A backend-validated proof of authentication.
///
/// The gate consumes only its presence; downstream code may use the token
/// and identity.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthUser,
}

/// Token-endpoint response for a refresh-token grant.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    #[serde(default)]
    user: Option<AuthUser>,
}

/// The seam between the gate and the auth backend.
///
/// Implemented by [`AuthClient`] in production and by stubs in tests, so
/// the gate's decision and cookie-mirroring behavior can be exercised
/// without a live backend.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Resolve the current session for one request, refreshing tokens if
    /// needed. Token refresh writes cookie changes into `store`.
    ///
    /// Called exactly once per gate evaluation. Any backend failure
    /// degrades to `None` (unauthenticated); it never surfaces an error.
    async fn fetch_session(&self, store: &mut CookieStore) -> Option<Session>;

    /// Load the merged identity + profile for downstream handlers.
    /// Errors travel inside the returned struct, never as `Err`.
    async fn load_principal(&self, store: &CookieStore) -> PrincipalData;
}

/// HTTP client for the session/auth backend.
#[derive(Debug, Clone)]
pub struct AuthClient {
    base_url: String,
    anon_key: String,
    http: reqwest::Client,
}

impl AuthClient {
    pub fn new(config: &Config) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(AppError::Backend)?;
        Ok(AuthClient {
            base_url: config.auth_backend_url.clone(),
            anon_key: config.auth_anon_key.clone(),
            http,
        })
    }

    /// Fetch the identity behind an access token.
    /// Any non-success status maps to `Unauthorized`.
    pub async fn fetch_user(&self, access_token: &str) -> AppResult<AuthUser> {
        let response = self
            .http
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "identity fetch returned {}",
                response.status()
            )));
        }
        Ok(response.json::<AuthUser>().await?)
    }

    /// Exchange a refresh token for a fresh token pair.
    async fn refresh(&self, refresh_token: &str) -> AppResult<TokenResponse> {
        let response = self
            .http
            .post(format!(
                "{}/auth/v1/token?grant_type=refresh_token",
                self.base_url
            ))
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Unauthorized(format!(
                "token refresh returned {}",
                response.status()
            )));
        }
        Ok(response.json::<TokenResponse>().await?)
    }

    /// Fetch the profile row joined to an identity id.
    ///
    /// Single-object lookup: `users` row with the nested `profiles`
    /// relation, keyed by identity id.
    pub async fn fetch_profile_row(&self, access_token: &str, user_id: &str) -> AppResult<Value> {
        let response = self
            .http
            .get(format!("{}/rest/v1/users", self.base_url))
            .query(&[
                ("id", format!("eq.{user_id}").as_str()),
                ("select", "*,profiles(*)"),
            ])
            .header("apikey", &self.anon_key)
            .header("Accept", "application/vnd.pgrst.object+json")
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::Internal(format!(
                "profile lookup returned {}",
                response.status()
            )));
        }
        Ok(response.json::<Value>().await?)
    }

    fn access_cookie_options(&self, expires_in: i64) -> CookieOptions {
        CookieOptions {
            path: Some("/".to_string()),
            max_age: Some(expires_in),
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..Default::default()
        }
    }

    fn refresh_cookie_options(&self) -> CookieOptions {
        CookieOptions {
            path: Some("/".to_string()),
            max_age: Some(REFRESH_TOKEN_MAX_AGE_SECS),
            http_only: true,
            same_site: Some(SameSite::Lax),
            ..Default::default()
        }
    }
}

#[async_trait]
impl AuthBackend for AuthClient {
    async fn fetch_session(&self, store: &mut CookieStore) -> Option<Session> {
        // Validate the access token first, if the request carries one.
        if let Some(token) = store.get(ACCESS_TOKEN_COOKIE).map(str::to_owned) {
            match self.fetch_user(&token).await {
                Ok(user) if !user.id.is_empty() => {
                    return Some(Session {
                        access_token: token,
                        user,
                    });
                }
                // A token that resolves to no identity is treated like an
                // expired one: fall through to the refresh path.
                Ok(_) => tracing::debug!("access token resolved to no identity"),
                Err(err) => tracing::debug!(error = %err, "access token rejected"),
            }
        }

        // No valid access token: try the refresh grant.
        let refresh_token = store.get(REFRESH_TOKEN_COOKIE)?.to_owned();
        match self.refresh(&refresh_token).await {
            Ok(tokens) => {
                store.set(
                    ACCESS_TOKEN_COOKIE,
                    &tokens.access_token,
                    self.access_cookie_options(tokens.expires_in),
                );
                store.set(
                    REFRESH_TOKEN_COOKIE,
                    &tokens.refresh_token,
                    self.refresh_cookie_options(),
                );
                match tokens.user.filter(|user| !user.id.is_empty()) {
                    Some(user) => Some(Session {
                        access_token: tokens.access_token,
                        user,
                    }),
                    None => {
                        tracing::debug!("refreshed session has no resolvable identity");
                        None
                    }
                }
            }
            Err(err) => {
                // Fail open: a backend outage is indistinguishable from
                // having no session.
                tracing::debug!(error = %err, "session refresh failed; proceeding unauthenticated");
                None
            }
        }
    }

    async fn load_principal(&self, store: &CookieStore) -> PrincipalData {
        principal::load_principal(self, store).await
    }
}
