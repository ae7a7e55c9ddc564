//! # Session Gate
//!
//! The request-interception core: refreshes the session from cookies and
//! redirects based on session presence and target path.
//!
//! One evaluation walks a small state machine:
//!
//! ```text
//! START → SESSION_CHECKED → { ALLOW, REDIRECT_LOGIN, REDIRECT_DASHBOARD }
//! ```
//!
//! The session is checked exactly once per request (single backend round
//! trip); any cookie changes the refresh emits are mirrored onto both the
//! outgoing request and the final response on the ALLOW path, and
//! discarded when a redirect replaces the pass-through response.

use crate::auth::cookies::CookieStore;
use crate::config::Config;
use crate::middleware::matcher;
use crate::state::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

/// Path policy the gate evaluates against.
///
/// Built once from [`Config`] at startup and carried in shared state;
/// the protected prefix doubles as the dashboard redirect target.
#[derive(Debug, Clone)]
pub struct RoutePolicy {
    pub protected_prefix: String,
    pub login_path: String,
    pub signup_path: String,
}

impl RoutePolicy {
    pub fn from_config(config: &Config) -> Self {
        RoutePolicy {
            protected_prefix: config.protected_prefix.clone(),
            login_path: config.login_path.clone(),
            signup_path: config.signup_path.clone(),
        }
    }
}

/// Terminal state of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Pass the request through, mirroring any accumulated cookie changes.
    Allow,
    /// Send an unauthenticated user to login, remembering where they were going.
    RedirectLogin { from: String },
    /// Send an authenticated user away from login/signup.
    RedirectDashboard,
}

/// The redirect/allow decision as a pure function of {path, session presence}.
///
/// The protected-prefix check runs before the authed-out check; the two
/// cannot both match, but the order is fixed for auditability.
pub fn decide(policy: &RoutePolicy, path: &str, authenticated: bool) -> GateDecision {
    if !authenticated && path.starts_with(&policy.protected_prefix) {
        return GateDecision::RedirectLogin {
            from: path.to_string(),
        };
    }
    if authenticated && (path == policy.login_path || path == policy.signup_path) {
        return GateDecision::RedirectDashboard;
    }
    GateDecision::Allow
}

/// Login redirect target with the original path recorded for post-login
/// return navigation.
fn login_redirect_target(policy: &RoutePolicy, from: &str) -> String {
    format!(
        "{}?redirectedFrom={}",
        policy.login_path,
        urlencoding::encode(from)
    )
}

/// Axum middleware wrapping every routed request.
pub async fn session_gate(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = request.uri().path().to_owned();

    // Static assets and framework internals never enter the state machine.
    if !matcher::should_intercept(&path) {
        return next.run(request).await;
    }

    // START → SESSION_CHECKED: the single suspension point. Backend
    // failure degrades to "no session" inside fetch_session.
    let mut store = CookieStore::from_headers(request.headers());
    let session = state.auth.fetch_session(&mut store).await;

    match decide(&state.policy, &path, session.is_some()) {
        GateDecision::RedirectLogin { from } => {
            tracing::debug!(path = %from, "unauthenticated request to protected path");
            // A fresh redirect response replaces the pass-through one;
            // cookie changes accumulated during the session check are
            // discarded with it.
            Redirect::temporary(&login_redirect_target(&state.policy, &from)).into_response()
        }
        GateDecision::RedirectDashboard => {
            tracing::debug!(path = %path, "authenticated request to authed-out path");
            Redirect::temporary(&state.policy.protected_prefix).into_response()
        }
        GateDecision::Allow => {
            // Downstream handlers see the refreshed cookie state...
            if store.has_changes() {
                if let Some(header_value) = store.request_cookie_header() {
                    request.headers_mut().insert(header::COOKIE, header_value);
                }
            }
            let mut response = next.run(request).await;
            // ...and the client receives the same changes, so the next
            // request and this response agree on cookie state.
            store.mirror_onto(response.headers_mut());
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> RoutePolicy {
        RoutePolicy {
            protected_prefix: "/dashboard".to_string(),
            login_path: "/login".to_string(),
            signup_path: "/signup".to_string(),
        }
    }

    #[test]
    fn unauthenticated_protected_path_redirects_to_login() {
        let decision = decide(&policy(), "/dashboard/settings", false);
        assert_eq!(
            decision,
            GateDecision::RedirectLogin {
                from: "/dashboard/settings".to_string()
            }
        );
    }

    #[test]
    fn authenticated_authed_out_paths_redirect_to_dashboard() {
        assert_eq!(decide(&policy(), "/login", true), GateDecision::RedirectDashboard);
        assert_eq!(decide(&policy(), "/signup", true), GateDecision::RedirectDashboard);
    }

    #[test]
    fn everything_else_is_allowed() {
        assert_eq!(decide(&policy(), "/dashboard", true), GateDecision::Allow);
        assert_eq!(decide(&policy(), "/about", false), GateDecision::Allow);
        assert_eq!(decide(&policy(), "/about", true), GateDecision::Allow);
        assert_eq!(decide(&policy(), "/login", false), GateDecision::Allow);
        assert_eq!(decide(&policy(), "/signup", false), GateDecision::Allow);
    }

    #[test]
    fn authed_out_match_is_exact_not_prefix() {
        assert_eq!(decide(&policy(), "/login/help", true), GateDecision::Allow);
    }

    #[test]
    fn decision_is_idempotent() {
        let p = policy();
        for (path, authed) in [("/dashboard/a", false), ("/login", true), ("/about", false)] {
            assert_eq!(decide(&p, path, authed), decide(&p, path, authed));
        }
    }

    #[test]
    fn login_target_preserves_query_encoding_of_original_path() {
        let target = login_redirect_target(&policy(), "/dashboard/settings");
        assert_eq!(target, "/login?redirectedFrom=%2Fdashboard%2Fsettings");
    }
}
