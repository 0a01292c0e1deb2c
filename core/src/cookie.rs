//! Per-request cookie injection.
//!
//! Cookies supplied through `Options` never touch a shared jar. Each request
//! gets its own `CookieContext`, which resolves missing domains and paths
//! and renders the `Cookie` header for the request URI.

use serde::{Deserialize, Serialize};
use ureq::http::Uri;

/// A cookie to send with a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

/// A cookie whose domain and path have been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopedCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
}

/// Cookie store scoped to exactly one request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieContext {
    cookies: Vec<ScopedCookie>,
}

impl CookieContext {
    /// Resolves `cookies`, falling back to `default_domain` and `/`.
    pub fn new(cookies: &[Cookie], default_domain: &str) -> Self {
        let cookies = cookies
            .iter()
            .map(|c| ScopedCookie {
                name: c.name.clone(),
                value: c.value.clone(),
                domain: c.domain.clone().unwrap_or_else(|| default_domain.to_string()),
                path: c.path.clone().unwrap_or_else(|| "/".to_string()),
            })
            .collect();
        Self { cookies }
    }

    pub fn cookies(&self) -> &[ScopedCookie] {
        &self.cookies
    }

    /// `Cookie` header value for `uri`, or `None` when nothing matches.
    pub fn header_for(&self, uri: &Uri) -> Option<String> {
        let host = uri.host()?.to_ascii_lowercase();
        let path = match uri.path() {
            "" => "/",
            p => p,
        };
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| domain_matches(&host, &c.domain) && path_matches(path, &c.path))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }
}

fn domain_matches(host: &str, domain: &str) -> bool {
    let domain = domain.trim_start_matches('.').to_ascii_lowercase();
    if domain.is_empty() {
        return false;
    }
    host == domain
        || host
            .strip_suffix(domain.as_str())
            .is_some_and(|prefix| prefix.ends_with('.'))
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    match request_path.strip_prefix(cookie_path) {
        Some(rest) => cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}
