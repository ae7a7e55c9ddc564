//! # Page Handlers
//!
//! Thin targets for the session gate's routing decisions. Real UI
//! rendering is out of scope; these handlers exist so the gate has
//! concrete allow/redirect destinations and so the principal loader is
//! exercised downstream of an ALLOW.

use crate::auth::cookies::CookieStore;
use crate::state::AppState;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
    Json,
};
use serde_json::{json, Value};

/// Login page stub. Authenticated users are redirected away by the gate
/// before reaching this handler.
pub async fn login_page() -> Html<&'static str> {
    Html("<h1>Log in</h1>")
}

/// Signup page stub, gated the same way as login.
pub async fn signup_page() -> Html<&'static str> {
    Html("<h1>Sign up</h1>")
}

/// Dashboard: loads the principal (identity + joined profile) and renders
/// the result. Lookup failures arrive inside the structured result, never
/// as an error response.
///
/// The cookie store here is read-only; any write the backend attempts in
/// this phase is swallowed, and the gate reconciles cookie state on the
/// next request.
pub async fn dashboard(State(state): State<AppState>, headers: HeaderMap) -> Json<Value> {
    let store = CookieStore::read_only(&headers);
    let data = state.auth.load_principal(&store).await;
    Json(json!(data))
}

/// Client-side billing configuration: the publishable key only.
pub async fn billing_config(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "publishableKey": state.billing.publishable_key(),
    }))
}

/// Fallback for every unrouted path: a plain pass-through page, so paths
/// outside the protected area are served unmodified.
pub async fn passthrough() -> Html<&'static str> {
    Html("<h1>authgate</h1>")
}
