//! # Server Principal Loader
//!
//! Combines a validated identity with its joined profile record for
//! downstream handlers. The loader never participates in redirect
//! decisions and never throws: every failure mode is encoded in the
//! returned [`PrincipalData`] struct.

use crate::auth::client::{AuthClient, AuthUser, ACCESS_TOKEN_COOKIE};
use crate::auth::cookies::CookieStore;
use serde::Serialize;
use serde_json::Value;

/// The merged identity + profile record used by application logic.
#[derive(Debug, Clone, Serialize)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
    /// Identity fields merged with the joined profile row (row fields win
    /// on name collisions, mirroring a spread of row over identity).
    pub record: Value,
}

/// Result of one principal load.
///
/// - identity fetch failed: `{ principal: None, profile: None, error }`
/// - profile join failed: `{ principal: raw identity, profile: None, error }`
/// - success: `{ principal: merged, profile: nested row, error: None }`
#[derive(Debug, Clone, Serialize)]
pub struct PrincipalData {
    pub principal: Option<Principal>,
    pub profile: Option<Value>,
    pub error: Option<String>,
}

impl PrincipalData {
    fn failure(error: impl Into<String>) -> Self {
        PrincipalData {
            principal: None,
            profile: None,
            error: Some(error.into()),
        }
    }
}

/// Merge the raw identity with its profile row.
///
/// The nested `profiles` relation is lifted out of the row and also
/// attached to the merged record under `profile`.
fn merge_principal(user: &AuthUser, row: &Value) -> (Principal, Option<Value>) {
    let mut record = user.to_json();
    let profile = row.get("profiles").filter(|p| !p.is_null()).cloned();

    if let (Value::Object(target), Some(fields)) = (&mut record, row.as_object()) {
        for (key, value) in fields {
            if key != "profiles" {
                target.insert(key.clone(), value.clone());
            }
        }
        if let Some(profile) = &profile {
            target.insert("profile".to_string(), profile.clone());
        }
    }

    (
        Principal {
            id: user.id.clone(),
            email: user.email.clone(),
            record,
        },
        profile,
    )
}

fn raw_principal(user: &AuthUser) -> Principal {
    Principal {
        id: user.id.clone(),
        email: user.email.clone(),
        record: user.to_json(),
    }
}

/// Load the principal for the request represented by `store`.
pub async fn load_principal(client: &AuthClient, store: &CookieStore) -> PrincipalData {
    let Some(access_token) = store.get(ACCESS_TOKEN_COOKIE) else {
        return PrincipalData::failure("no access token on request");
    };

    let user = match client.fetch_user(access_token).await {
        Ok(user) if !user.id.is_empty() => user,
        Ok(_) => return PrincipalData::failure("identity has no id"),
        Err(err) => {
            tracing::error!(error = %err, "identity fetch failed");
            return PrincipalData::failure(err.to_string());
        }
    };

    match client.fetch_profile_row(access_token, &user.id).await {
        Ok(row) => {
            let (principal, profile) = merge_principal(&user, &row);
            PrincipalData {
                principal: Some(principal),
                profile,
                error: None,
            }
        }
        Err(err) => {
            tracing::error!(error = %err, user = %user.id, "profile lookup failed");
            PrincipalData {
                principal: Some(raw_principal(&user)),
                profile: None,
                error: Some(err.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user() -> AuthUser {
        serde_json::from_value(json!({
            "id": "u-1",
            "email": "a@example.com",
            "aud": "authenticated",
        }))
        .unwrap()
    }

    #[test]
    fn merge_attaches_row_fields_and_nested_profile() {
        let row = json!({
            "id": "u-1",
            "role": "admin",
            "profiles": { "display_name": "Alice" },
        });
        let (principal, profile) = merge_principal(&user(), &row);
        assert_eq!(principal.id, "u-1");
        assert_eq!(principal.record["role"], "admin");
        assert_eq!(principal.record["aud"], "authenticated");
        assert_eq!(principal.record["profile"]["display_name"], "Alice");
        assert_eq!(profile.unwrap()["display_name"], "Alice");
    }

    #[test]
    fn merge_without_profile_relation_yields_no_profile() {
        let row = json!({ "id": "u-1", "role": "member", "profiles": null });
        let (principal, profile) = merge_principal(&user(), &row);
        assert!(profile.is_none());
        assert_eq!(principal.record["role"], "member");
        assert!(principal.record.get("profile").is_none());
    }
}
