//! # Invocation Matcher
//!
//! Decides which request paths the session gate intercepts at all.
//! Static assets and image-optimization internals never reach the gate's
//! state machine; everything else does.

/// Framework-internal prefixes that bypass the gate
const EXCLUDED_PREFIXES: [&str; 2] = ["/_next/static", "/_next/image"];

/// Static-asset suffixes that bypass the gate
const STATIC_SUFFIXES: [&str; 6] = [".svg", ".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Paths always intercepted, regardless of the exclusion rules.
///
/// Redundant with the general pattern for typical paths, but kept explicit:
/// these are the paths the gate's redirect policy is about.
fn explicitly_included(path: &str) -> bool {
    path == "/login"
        || path == "/signup"
        || path == "/dashboard"
        || path.starts_with("/dashboard/")
}

/// Whether the gate runs for this request path.
pub fn should_intercept(path: &str) -> bool {
    if explicitly_included(path) {
        return true;
    }
    if path == "/favicon.ico" {
        return false;
    }
    if EXCLUDED_PREFIXES.iter().any(|prefix| path.starts_with(prefix)) {
        return false;
    }
    if STATIC_SUFFIXES.iter().any(|suffix| path.ends_with(suffix)) {
        return false;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_paths_are_intercepted() {
        for path in ["/", "/about", "/dashboard", "/dashboard/settings", "/login", "/signup", "/api/billing/config"] {
            assert!(should_intercept(path), "{path} should be intercepted");
        }
    }

    #[test]
    fn static_internals_are_excluded() {
        for path in [
            "/favicon.ico",
            "/_next/static/chunks/main.js",
            "/_next/image?url=%2Fhero.png",
            "/logo.svg",
            "/photos/team.jpeg",
            "/banner.webp",
        ] {
            assert!(!should_intercept(path), "{path} should bypass the gate");
        }
    }

    #[test]
    fn explicit_includes_beat_suffix_exclusion() {
        // An asset-looking path under the protected area is still gated.
        assert!(should_intercept("/dashboard/report.png"));
    }
}
