//! Cookie storage hooked into request preparation and response processing.
//!
//! [`MemoryCookieJar`] keeps its cookies in a [`reqwest::cookie::Jar`], which
//! does the `Set-Cookie` parsing and the domain, path, `Secure` and expiry
//! matching.

use crate::protocol::constants::headers;
use crate::types::{Request, Response};
use http::HeaderValue;
use parking_lot::RwLock;
use reqwest::cookie::{CookieStore, Jar};
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A cookie store consulted by the user agent.
///
/// `add_cookie_header` runs on every prepared request before the
/// `RequestPrepare` handlers; `extract_cookies` runs on every response before
/// the `ResponseDone` handlers.
pub trait CookieJar: Send + Sync {
    /// Add a `Cookie` header for the cookies that apply to `request`.
    fn add_cookie_header(&self, request: &mut Request);

    /// Store the `Set-Cookie` values of `response`, scoped to the URL of the
    /// request that produced it.
    fn extract_cookies(&self, response: &Response);
}

/// In-memory [`CookieJar`] shared across clones of the agent.
pub struct MemoryCookieJar {
    jar: RwLock<Arc<Jar>>,
}

impl MemoryCookieJar {
    /// Empty jar.
    pub fn new() -> Self {
        Self::with_jar(Arc::new(Jar::default()))
    }

    /// Jar over an existing `reqwest` store, for example one also handed to
    /// `reqwest::ClientBuilder::cookie_provider`.
    pub fn with_jar(jar: Arc<Jar>) -> Self {
        MemoryCookieJar {
            jar: RwLock::new(jar),
        }
    }

    /// The underlying `reqwest` store.
    pub fn jar(&self) -> Arc<Jar> {
        self.jar.read().clone()
    }

    /// Forget every cookie.
    pub fn clear(&self) {
        *self.jar.write() = Arc::new(Jar::default());
    }

    /// Store a single `Set-Cookie` value as if it came from `url`.
    pub fn add_cookie_str(&self, set_cookie: &str, url: &Url) {
        self.jar.read().add_cookie_str(set_cookie, url);
    }

    /// `Cookie` header value that would be sent to `url`.
    pub fn header_for(&self, url: &Url) -> Option<String> {
        let value = self.jar.read().cookies(url)?;
        match value.to_str() {
            Ok(value) => Some(value.to_string()),
            Err(_) => {
                tracing::debug!("dropping non-visible-ASCII Cookie header for {}", url);
                None
            }
        }
    }

    /// `name=value` pairs that would be sent to `url`.
    pub fn cookies_for(&self, url: &Url) -> Vec<(String, String)> {
        let Some(header) = self.header_for(url) else {
            return Vec::new();
        };
        header
            .split("; ")
            .filter_map(|pair| {
                let (name, value) = pair.split_once('=')?;
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }
}

impl Default for MemoryCookieJar {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryCookieJar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCookieJar").finish_non_exhaustive()
    }
}

impl CookieJar for MemoryCookieJar {
    fn add_cookie_header(&self, request: &mut Request) {
        let Ok(url) = request.url() else {
            return;
        };
        if let Some(value) = self.header_for(&url) {
            request.headers.set_known("Cookie", value);
        }
    }

    fn extract_cookies(&self, response: &Response) {
        let Some(url) = response.request.as_ref().and_then(|r| r.url().ok()) else {
            return;
        };
        let values: Vec<HeaderValue> = response
            .headers
            .get_all(headers::SET_COOKIE.as_str())
            .into_iter()
            .filter_map(|raw| match HeaderValue::from_str(raw) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::debug!("ignoring Set-Cookie: {}", raw);
                    None
                }
            })
            .collect();
        if values.is_empty() {
            return;
        }
        self.jar.read().set_cookies(&mut values.iter(), &url);
    }
}
