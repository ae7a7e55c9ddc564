//! # Cookie Store
//!
//! Bridges the auth backend's cookie read/write/remove calls to the
//! transport-level cookie state of one in-flight request/response pair.
//!
//! The store is an explicit accumulator threaded through one gate
//! evaluation: reads come from the request's cookie set (including writes
//! made earlier in the same evaluation), and every write is recorded in an
//! ordered change log. The gate mirrors the reduced change log onto both
//! the outgoing request and the final response, so the client's next
//! request and the current response always agree on cookie state.
//!
//! ## Write policy
//! Writes against a read-only store (a rendering phase that forbids cookie
//! mutation) are swallowed, not errored. This is a documented
//! at-most-effort contract: the gate refreshes the session on the next
//! request and reconciles cookie state then.

use axum::http::{header, HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use std::collections::BTreeMap;
use time::OffsetDateTime;

/// Transport options attached to a cookie write.
///
/// The gate carries these verbatim from the backend session client; it
/// never alters or defaults them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CookieOptions {
    pub domain: Option<String>,
    pub path: Option<String>,
    /// Lifetime in seconds (Max-Age)
    pub max_age: Option<i64>,
    pub expires: Option<OffsetDateTime>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

/// One recorded cookie write: an upsert, or a removal when `value` is empty.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieChange {
    pub name: String,
    pub value: String,
    pub options: CookieOptions,
}

impl CookieChange {
    /// Removal is signaled to the client as an empty value with the same
    /// transport options.
    pub fn is_removal(&self) -> bool {
        self.value.is_empty()
    }

    /// Render this change as a `Set-Cookie` header value.
    fn to_set_cookie(&self) -> Option<HeaderValue> {
        let mut cookie = Cookie::new(self.name.clone(), self.value.clone());
        let opts = &self.options;
        if let Some(domain) = &opts.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(path) = &opts.path {
            cookie.set_path(path.clone());
        }
        if let Some(max_age) = opts.max_age {
            cookie.set_max_age(time::Duration::seconds(max_age));
        }
        if let Some(expires) = opts.expires {
            cookie.set_expires(expires);
        }
        if opts.secure {
            cookie.set_secure(true);
        }
        if opts.http_only {
            cookie.set_http_only(true);
        }
        if let Some(same_site) = opts.same_site {
            cookie.set_same_site(same_site);
        }
        HeaderValue::from_str(&cookie.to_string()).ok()
    }
}

/// Cookie state for one gate evaluation.
///
/// Owns a snapshot of the request's name→value cookie set plus the ordered
/// log of writes made during the evaluation. Created fresh per request and
/// discarded when the gate returns; nothing is shared across requests.
#[derive(Debug, Clone)]
pub struct CookieStore {
    cookies: BTreeMap<String, String>,
    changes: Vec<CookieChange>,
    writable: bool,
}

impl CookieStore {
    /// Build a writable store from a request's `Cookie` header(s).
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self::parse(headers, true)
    }

    /// Build a read-only store: reads work, writes are swallowed.
    pub fn read_only(headers: &HeaderMap) -> Self {
        Self::parse(headers, false)
    }

    fn parse(headers: &HeaderMap, writable: bool) -> Self {
        let mut cookies = BTreeMap::new();
        for value in headers.get_all(header::COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            for cookie in Cookie::split_parse(raw).flatten() {
                cookies.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        CookieStore {
            cookies,
            changes: Vec::new(),
            writable,
        }
    }

    /// Read a cookie from the request's cookie set. No side effects.
    ///
    /// Writes made earlier in the same evaluation are visible here
    /// (read-your-writes), so a refreshed token is observed by later reads.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    /// Upsert a cookie into the request's cookie set and record the change.
    ///
    /// On a read-only store the write is dropped with a debug log entry;
    /// see the module docs for the at-most-effort contract.
    pub fn set(&mut self, name: &str, value: &str, options: CookieOptions) {
        if !self.writable {
            tracing::debug!(cookie = name, "cookie write outside mutable context ignored");
            return;
        }
        self.cookies.insert(name.to_string(), value.to_string());
        self.changes.push(CookieChange {
            name: name.to_string(),
            value: value.to_string(),
            options,
        });
    }

    /// Remove a cookie: an upsert of the empty value with the same options.
    pub fn remove(&mut self, name: &str, options: CookieOptions) {
        if !self.writable {
            tracing::debug!(cookie = name, "cookie removal outside mutable context ignored");
            return;
        }
        self.cookies.remove(name);
        self.changes.push(CookieChange {
            name: name.to_string(),
            value: String::new(),
            options,
        });
    }

    /// Whether any write was recorded during this evaluation.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty()
    }

    /// The change log reduced to last-write-wins per cookie name.
    ///
    /// Names keep the order of their first write, so the mirrored headers
    /// are deterministic.
    pub fn final_changes(&self) -> Vec<&CookieChange> {
        let mut order: Vec<&str> = Vec::new();
        let mut last: BTreeMap<&str, &CookieChange> = BTreeMap::new();
        for change in &self.changes {
            if !last.contains_key(change.name.as_str()) {
                order.push(change.name.as_str());
            }
            last.insert(change.name.as_str(), change);
        }
        order.into_iter().filter_map(|name| last.get(name).copied()).collect()
    }

    /// Rebuild a `Cookie` header value reflecting all writes, for the
    /// outgoing request the downstream handler sees.
    pub fn request_cookie_header(&self) -> Option<HeaderValue> {
        if self.cookies.is_empty() {
            return None;
        }
        let joined = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ");
        HeaderValue::from_str(&joined).ok()
    }

    /// Mirror the reduced change log onto a response as `Set-Cookie`
    /// headers, options carried verbatim.
    pub fn mirror_onto(&self, headers: &mut HeaderMap) {
        for change in self.final_changes() {
            if let Some(value) = change.to_set_cookie() {
                headers.append(header::SET_COOKIE, value);
            } else {
                tracing::debug!(cookie = %change.name, "unencodable cookie change dropped");
            }
        }
    }
}
