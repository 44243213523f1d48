//! Authentication challenge handling.
//!
//! When a response carries 401 or 407, the agent parses each
//! `WWW-Authenticate` (or `Proxy-Authenticate`) challenge and hands it to the
//! [`Authenticator`] registered for its scheme. The authenticator either
//! re-dispatches the request with credentials or gives the response back.
//!
//! ```
//! use http_useragent::client::AuthChallenge;
//!
//! let challenge = AuthChallenge::parse(r#"Basic realm="private", charset="UTF-8""#).unwrap();
//! assert_eq!(challenge.scheme, "basic");
//! assert_eq!(challenge.realm(), Some("private"));
//! assert_eq!(challenge.param("CHARSET"), Some("UTF-8"));
//! ```

use super::agent::UserAgent;
use super::transport::ContentSink;
use crate::error::{AgentError, Result};
use crate::protocol::split_header_words;
use crate::types::{Request, Response};
use async_trait::async_trait;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, LazyLock};
use url::Url;

static SCHEME_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z]+(?:-[a-z]+)*$").expect("static regex")
});

/// One parsed authentication challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthChallenge {
    /// Lowercased scheme name.
    pub scheme: String,
    /// Parameters keyed by lowercased name.
    pub params: BTreeMap<String, String>,
}

impl AuthChallenge {
    /// Parse a challenge header value.
    ///
    /// Commas are treated like semicolons so the parameters end up in the
    /// same word group as the scheme. A scheme that is not a lowercase
    /// hyphenated word yields [`AgentError::MalformedAuthChallenge`].
    pub fn parse(raw: &str) -> Result<Self> {
        let normalized = raw.replace(',', ";");
        let mut words = split_header_words([normalized.as_str()])
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter();

        let Some((scheme, _)) = words.next() else {
            return Err(AgentError::MalformedAuthChallenge(raw.trim().to_string()));
        };
        let lowered = scheme.to_ascii_lowercase();
        if !SCHEME_NAME.is_match(&lowered) {
            return Err(AgentError::MalformedAuthChallenge(scheme));
        }

        let params = words
            .map(|(name, value)| (name.to_ascii_lowercase(), value.unwrap_or_default()))
            .collect();
        Ok(AuthChallenge {
            scheme: lowered,
            params,
        })
    }

    /// Value of a challenge parameter, by lowercase name.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The `realm` parameter.
    #[inline]
    pub fn realm(&self) -> Option<&str> {
        self.param("realm")
    }
}

/// Answers authentication challenges of one scheme.
///
/// `response` is the 401/407 being answered. Whatever is returned becomes the
/// agent's result; return `response` itself to give up without retrying.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Answer `challenge`, usually by re-dispatching `request` with
    /// credentials through [`UserAgent::request_with_previous`].
    #[allow(clippy::too_many_arguments)]
    async fn authenticate(
        &self,
        agent: &UserAgent,
        is_proxy: bool,
        challenge: &AuthChallenge,
        response: &Response,
        request: &Request,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
    ) -> Result<Response>;
}

/// Authenticators keyed by lowercased scheme name.
#[derive(Clone)]
pub struct AuthenticatorRegistry {
    by_scheme: HashMap<String, Arc<dyn Authenticator>>,
}

impl AuthenticatorRegistry {
    /// Registry without any authenticator.
    pub fn empty() -> Self {
        AuthenticatorRegistry {
            by_scheme: HashMap::new(),
        }
    }

    /// Register `authenticator` for `scheme`, replacing any previous one.
    pub fn register(&mut self, scheme: &str, authenticator: Arc<dyn Authenticator>) {
        self.by_scheme.insert(scheme.to_ascii_lowercase(), authenticator);
    }

    /// Remove the authenticator for `scheme`; `true` if one was registered.
    pub fn unregister(&mut self, scheme: &str) -> bool {
        self.by_scheme.remove(&scheme.to_ascii_lowercase()).is_some()
    }

    /// Authenticator for `scheme`, matched case-insensitively.
    pub fn get(&self, scheme: &str) -> Option<Arc<dyn Authenticator>> {
        self.by_scheme.get(&scheme.to_ascii_lowercase()).cloned()
    }

    /// Registered scheme names, sorted.
    pub fn schemes(&self) -> Vec<&str> {
        let mut schemes: Vec<&str> = self.by_scheme.keys().map(String::as_str).collect();
        schemes.sort_unstable();
        schemes
    }
}

/// Contains `basic`.
impl Default for AuthenticatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("basic", Arc::new(BasicAuthenticator));
        registry
    }
}

impl fmt::Debug for AuthenticatorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.schemes()).finish()
    }
}

/// User name and password per `(host:port, realm)`.
#[derive(Clone, Default)]
pub struct Credentials {
    entries: HashMap<(String, String), (String, String)>,
}

impl Credentials {
    /// Store credentials for a `host:port` and realm.
    ///
    /// User names containing `:` cannot be sent with Basic authentication
    /// and are rejected.
    pub fn set(&mut self, netloc: &str, realm: &str, user: &str, password: &str) -> Result<()> {
        if user.contains(':') {
            return Err(AgentError::InvalidArgument(
                "Basic authorization user name can't contain ':'".into(),
            ));
        }
        self.entries.insert(
            (netloc.to_ascii_lowercase(), realm.to_string()),
            (user.to_string(), password.to_string()),
        );
        Ok(())
    }

    /// `(user, password)` stored for `netloc` and `realm`.
    pub fn get(&self, netloc: &str, realm: &str) -> Option<(&str, &str)> {
        self.entries
            .get(&(netloc.to_ascii_lowercase(), realm.to_string()))
            .map(|(u, p)| (u.as_str(), p.as_str()))
    }

    /// Forget the credentials for `netloc` and `realm`.
    pub fn remove(&mut self, netloc: &str, realm: &str) -> bool {
        self.entries
            .remove(&(netloc.to_ascii_lowercase(), realm.to_string()))
            .is_some()
    }

    /// No credentials stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        f.debug_struct("Credentials").field("entries", &keys).finish()
    }
}

/// `host:port` key used for credential lookup.
pub fn netloc(url: &Url) -> Option<String> {
    Some(format!(
        "{}:{}",
        url.host_str()?.to_ascii_lowercase(),
        url.port_or_known_default()?
    ))
}

/// RFC 7617 Basic authentication from the agent's [`Credentials`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicAuthenticator;

#[async_trait]
impl Authenticator for BasicAuthenticator {
    async fn authenticate(
        &self,
        agent: &UserAgent,
        is_proxy: bool,
        challenge: &AuthChallenge,
        response: &Response,
        request: &Request,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
    ) -> Result<Response> {
        let realm = challenge.realm().unwrap_or_default();
        let target = if is_proxy {
            request.proxy.clone()
        } else {
            request.url().ok()
        };
        let Some(key) = target.as_ref().and_then(netloc) else {
            return Ok(response.clone());
        };
        let Some((user, password)) = agent.credentials().get(&key, realm) else {
            tracing::debug!("no credentials for {} realm {:?}", key, realm);
            return Ok(response.clone());
        };

        let mut retry = request.clone();
        let header = if is_proxy {
            retry.headers.set_proxy_authorization_basic(user, password)?;
            "Proxy-Authorization"
        } else {
            retry.headers.set_authorization_basic(user, password)?;
            "Authorization"
        };

        // these exact credentials were already rejected
        if request.header(header) == retry.header(header) {
            return Ok(response.clone());
        }

        agent
            .request_with_previous(retry, Some(response.clone()), sink, read_size_hint)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge() {
        let c = AuthChallenge::parse(r#"Digest realm="x", nonce="abc", qop="auth""#).unwrap();
        assert_eq!(c.scheme, "digest");
        assert_eq!(c.realm(), Some("x"));
        assert_eq!(c.param("nonce"), Some("abc"));
        assert_eq!(c.params.len(), 3);
    }

    #[test]
    fn test_hyphenated_scheme() {
        let c = AuthChallenge::parse("X-Custom-Auth token=1").unwrap();
        assert_eq!(c.scheme, "x-custom-auth");
    }

    #[test]
    fn test_malformed_scheme() {
        let err = AuthChallenge::parse("Foo_1 realm=x").unwrap_err();
        assert!(matches!(err, AgentError::MalformedAuthChallenge(ref s) if s == "Foo_1"));
        assert!(AuthChallenge::parse("   ").is_err());
    }

    #[test]
    fn test_registry() {
        let mut registry = AuthenticatorRegistry::default();
        assert_eq!(registry.schemes(), vec!["basic"]);
        assert!(registry.get("BASIC").is_some());
        assert!(registry.get("digest").is_none());
        assert!(registry.unregister("Basic"));
        assert!(registry.schemes().is_empty());
    }

    #[test]
    fn test_credentials() {
        let mut creds = Credentials::default();
        creds.set("Example.com:80", "realm", "alice", "secret").unwrap();
        assert_eq!(creds.get("example.com:80", "realm"), Some(("alice", "secret")));
        assert!(creds.get("example.com:80", "other").is_none());
        assert!(creds.set("example.com:80", "r", "a:b", "p").is_err());
        assert!(!format!("{:?}", creds).contains("secret"));
    }

    #[test]
    fn test_netloc() {
        let url = Url::parse("https://Example.com/x").unwrap();
        assert_eq!(netloc(&url).as_deref(), Some("example.com:443"));
        let url = Url::parse("http://example.com:8080/").unwrap();
        assert_eq!(netloc(&url).as_deref(), Some("example.com:8080"));
    }
}
