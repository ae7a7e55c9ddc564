//! End-to-end session gate tests over the real router, with the auth
//! backend stubbed out behind the `AuthBackend` trait.

use async_trait::async_trait;
use authgate::auth::client::{AuthBackend, Session, ACCESS_TOKEN_COOKIE, REFRESH_TOKEN_COOKIE};
use authgate::auth::cookies::{CookieOptions, CookieStore};
use authgate::auth::principal::{Principal, PrincipalData};
use authgate::config::Config;
use authgate::state::AppState;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;

/// Scripted auth backend: fixed session presence plus optional cookie
/// writes emitted during the session check, as a token refresh would.
#[derive(Default)]
struct StubBackend {
    authenticated: bool,
    refresh_writes: Vec<(String, String)>,
    session_checks: AtomicUsize,
}

impl StubBackend {
    fn authed() -> Self {
        StubBackend {
            authenticated: true,
            ..Default::default()
        }
    }

    fn session(&self) -> Session {
        Session {
            access_token: "access".to_string(),
            user: serde_json::from_value(json!({ "id": "u-1" })).unwrap(),
        }
    }
}

#[async_trait]
impl AuthBackend for StubBackend {
    async fn fetch_session(&self, store: &mut CookieStore) -> Option<Session> {
        self.session_checks.fetch_add(1, Ordering::SeqCst);
        for (name, value) in &self.refresh_writes {
            store.set(
                name,
                value,
                CookieOptions {
                    path: Some("/".to_string()),
                    http_only: true,
                    ..Default::default()
                },
            );
        }
        self.authenticated.then(|| self.session())
    }

    async fn load_principal(&self, store: &CookieStore) -> PrincipalData {
        // Echo the access token the downstream handler observed, so tests
        // can assert the request-side cookie mirroring.
        PrincipalData {
            principal: Some(Principal {
                id: store.get(ACCESS_TOKEN_COOKIE).unwrap_or("absent").to_string(),
                email: None,
                record: json!({}),
            }),
            profile: None,
            error: None,
        }
    }
}

fn config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 8080,
        auth_backend_url: "https://auth.example.com".to_string(),
        auth_anon_key: "anon".to_string(),
        billing_secret_key: "sk_test_123".to_string(),
        billing_publishable_key: "pk_test_123".to_string(),
        protected_prefix: "/dashboard".to_string(),
        login_path: "/login".to_string(),
        signup_path: "/signup".to_string(),
    }
}

fn app_with(backend: Arc<StubBackend>) -> axum::Router {
    let state = AppState::with_backend(config(), backend).unwrap();
    authgate::app(state)
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn unauthenticated_protected_path_redirects_to_login_with_return_path() {
    let app = app_with(Arc::new(StubBackend::default()));
    let response = app.oneshot(get("/dashboard/settings")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers().get(header::LOCATION).unwrap(),
        "/login?redirectedFrom=%2Fdashboard%2Fsettings"
    );
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn redirect_discards_cookie_changes_from_the_session_check() {
    // The refresh wrote cookies, but the redirect replaces the
    // pass-through response and the changes go with it.
    let backend = Arc::new(StubBackend {
        authenticated: false,
        refresh_writes: vec![(REFRESH_TOKEN_COOKIE.to_string(), "r2".to_string())],
        ..Default::default()
    });
    let app = app_with(backend);
    let response = app.oneshot(get("/dashboard")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn authenticated_login_and_signup_redirect_to_dashboard() {
    for path in ["/login", "/signup"] {
        let app = app_with(Arc::new(StubBackend::authed()));
        let response = app.oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT, "{path}");
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/dashboard");
    }
}

#[tokio::test]
async fn unauthenticated_public_path_passes_through_unmodified() {
    let app = app_with(Arc::new(StubBackend::default()));
    let response = app.oneshot(get("/about")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn unauthenticated_login_page_is_served() {
    let app = app_with(Arc::new(StubBackend::default()));
    let response = app.oneshot(get("/login")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn allow_mirrors_refreshed_cookies_onto_request_and_response() {
    let backend = Arc::new(StubBackend {
        authenticated: true,
        refresh_writes: vec![
            (ACCESS_TOKEN_COOKIE.to_string(), "stale".to_string()),
            (ACCESS_TOKEN_COOKIE.to_string(), "fresh".to_string()),
        ],
        ..Default::default()
    });
    let app = app_with(backend);
    let response = app.oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Response side: one Set-Cookie per name, last write wins.
    let set_cookies: Vec<_> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert_eq!(set_cookies.len(), 1);
    assert!(set_cookies[0].starts_with("sb-access-token=fresh"));
    assert!(set_cookies[0].contains("Path=/"));
    assert!(set_cookies[0].contains("HttpOnly"));

    // Request side: the downstream handler observed the refreshed token.
    let body = body_json(response).await;
    assert_eq!(body["principal"]["id"], "fresh");
}

#[tokio::test]
async fn session_is_checked_exactly_once_per_request() {
    let backend = Arc::new(StubBackend::authed());
    let app = app_with(backend.clone());
    let response = app.oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(backend.session_checks.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn excluded_paths_never_reach_the_session_check() {
    let backend = Arc::new(StubBackend::default());
    for path in ["/favicon.ico", "/logo.svg", "/_next/static/chunk.js"] {
        let app = app_with(backend.clone());
        let response = app.oneshot(get(path)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{path}");
    }
    assert_eq!(backend.session_checks.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn billing_config_exposes_publishable_key_only() {
    let app = app_with(Arc::new(StubBackend::authed()));
    let response = app.oneshot(get("/api/billing/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["publishableKey"], "pk_test_123");
    assert!(body.get("secretKey").is_none());
}

#[tokio::test]
async fn decision_is_stable_across_repeated_requests() {
    let backend = Arc::new(StubBackend::default());
    for _ in 0..2 {
        let app = app_with(backend.clone());
        let response = app.oneshot(get("/dashboard/settings")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/login?redirectedFrom=%2Fdashboard%2Fsettings"
        );
    }
}
