//! Configuration for the user agent.
//!
//! This module defines the [`AgentConfig`] struct that controls how the
//! [`UserAgent`](super::UserAgent) prepares, sends and follows requests.
//!
//! # Configuration Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `agent` | `http_useragent/<version>` | Default `User-Agent` value |
//! | `from` | none | Default `From` value |
//! | `timeout_secs` | 180 | Per-request transport timeout |
//! | `max_redirect` | 7 | Length of the response chain that stops following |
//! | `max_size` | none | Content size limit, sent as a `Range` request |
//! | `read_size_hint` | none | Buffer size hint passed to the transport |
//! | `requests_redirectable` | `GET`, `HEAD` | Methods whose redirects are followed |
//! | `protocols_allowed` | none | When set, the only schemes that may be sent |
//! | `protocols_forbidden` | none | Schemes that may never be sent |
//! | `wrap_errors` | true | Turn transport failures into 500 responses |
//! | `enable_logging` | false | Log request details with `tracing` |
//!
//! # Examples
//!
//! ```
//! use http_useragent::client::AgentConfig;
//!
//! let config = AgentConfig {
//!     max_redirect: 3,
//!     ..Default::default()
//! };
//! assert_eq!(config.timeout_secs, 180);
//! assert!(config.is_redirectable("get"));
//! ```
//!
//! Configs can also be loaded from JSON; missing fields take their defaults:
//!
//! ```
//! use http_useragent::client::AgentConfig;
//!
//! let config = AgentConfig::from_json(r#"{ "max_redirect": 2, "wrap_errors": false }"#).unwrap();
//! assert_eq!(config.max_redirect, 2);
//! assert_eq!(config.requests_redirectable, vec!["GET", "HEAD"]);
//! ```

use crate::error::{AgentError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// Default `User-Agent` product token.
pub const DEFAULT_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Configuration for the user agent.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Default `User-Agent` header value.
    ///
    /// A value ending in a space gets [`DEFAULT_AGENT`] appended.
    pub agent: String,

    /// Default `From` header value, an e-mail address.
    pub from: Option<String>,

    /// Transport timeout in seconds.
    pub timeout_secs: u64,

    /// Maximum number of responses in a chain before redirects and
    /// authentication retries stop.
    pub max_redirect: usize,

    /// Content size limit in bytes.
    ///
    /// When set, requests carry `Range: bytes=0-{max_size - 1}` unless they
    /// already have a `Range` header.
    pub max_size: Option<u64>,

    /// Read buffer size hint for the transport.
    pub read_size_hint: Option<usize>,

    /// Methods for which redirects are followed automatically.
    pub requests_redirectable: Vec<String>,

    /// If set, only these URL schemes may be sent.
    pub protocols_allowed: Option<Vec<String>>,

    /// URL schemes that may never be sent.
    pub protocols_forbidden: Option<Vec<String>>,

    /// Turn transport failures into synthesized 500 responses instead of
    /// returning them as errors.
    pub wrap_errors: bool,

    /// Proxy URL per scheme, e.g. `"http" => "http://proxy:3128"`.
    pub proxies: BTreeMap<String, String>,

    /// Hosts (or domain suffixes) that bypass the proxies.
    pub no_proxy: Vec<String>,

    /// Extra headers added to every request that doesn't set them.
    pub default_headers: BTreeMap<String, String>,

    /// Enable request logging.
    ///
    /// When enabled, every dispatch is logged at `debug` level using the
    /// `tracing` crate. Warnings are logged regardless.
    pub enable_logging: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        AgentConfig {
            agent: DEFAULT_AGENT.to_string(),
            from: None,
            timeout_secs: 180,
            max_redirect: 7,
            max_size: None,
            read_size_hint: None,
            requests_redirectable: vec!["GET".to_string(), "HEAD".to_string()],
            protocols_allowed: None,
            protocols_forbidden: None,
            wrap_errors: true,
            proxies: BTreeMap::new(),
            no_proxy: Vec::new(),
            default_headers: BTreeMap::new(),
            enable_logging: false,
        }
    }
}

impl AgentConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| AgentError::InvalidArgument(format!("bad agent config: {}", e)))
    }

    /// Transport timeout.
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Whether redirects of requests with this method are followed.
    pub fn is_redirectable(&self, method: &str) -> bool {
        self.requests_redirectable
            .iter()
            .any(|m| m.eq_ignore_ascii_case(method))
    }

    /// Whether requests for this scheme may be sent.
    ///
    /// The allow list, when present, wins over the forbid list.
    pub fn is_protocol_supported(&self, scheme: &str) -> bool {
        if let Some(allowed) = &self.protocols_allowed {
            return allowed.iter().any(|s| s.eq_ignore_ascii_case(scheme));
        }
        if let Some(forbidden) = &self.protocols_forbidden {
            return !forbidden.iter().any(|s| s.eq_ignore_ascii_case(scheme));
        }
        true
    }

    /// `User-Agent` value with the trailing-space expansion applied.
    pub fn agent_string(&self) -> String {
        if self.agent.ends_with(' ') {
            format!("{}{}", self.agent, DEFAULT_AGENT)
        } else {
            self.agent.clone()
        }
    }

    /// Whether `host` is listed in `no_proxy`, directly or as a subdomain.
    pub fn bypasses_proxy(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.no_proxy.iter().any(|entry| {
            let entry = entry.trim_start_matches('.').to_ascii_lowercase();
            host == entry || host.ends_with(&format!(".{}", entry))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.max_redirect, 7);
        assert_eq!(config.timeout(), Duration::from_secs(180));
        assert!(config.wrap_errors);
        assert!(config.max_size.is_none());
        assert!(config.agent.starts_with("http_useragent/"));
    }

    #[test]
    fn test_redirectable_is_case_insensitive() {
        let config = AgentConfig::default();
        assert!(config.is_redirectable("HEAD"));
        assert!(config.is_redirectable("get"));
        assert!(!config.is_redirectable("POST"));
    }

    #[test]
    fn test_protocol_lists() {
        let mut config = AgentConfig::default();
        assert!(config.is_protocol_supported("gopher"));

        config.protocols_forbidden = Some(vec!["ftp".into()]);
        assert!(!config.is_protocol_supported("FTP"));
        assert!(config.is_protocol_supported("http"));

        config.protocols_allowed = Some(vec!["https".into()]);
        assert!(!config.is_protocol_supported("http"));
        assert!(config.is_protocol_supported("https"));
    }

    #[test]
    fn test_agent_string_expansion() {
        let mut config = AgentConfig::default();
        config.agent = "MyBot/1.0 ".into();
        assert_eq!(config.agent_string(), format!("MyBot/1.0 {}", DEFAULT_AGENT));
        config.agent = "MyBot/1.0".into();
        assert_eq!(config.agent_string(), "MyBot/1.0");
    }

    #[test]
    fn test_no_proxy_matching() {
        let config = AgentConfig {
            no_proxy: vec!["example.com".into(), ".internal".into()],
            ..Default::default()
        };
        assert!(config.bypasses_proxy("example.com"));
        assert!(config.bypasses_proxy("www.Example.com"));
        assert!(config.bypasses_proxy("db.internal"));
        assert!(!config.bypasses_proxy("notexample.com"));
    }

    #[test]
    fn test_from_json() {
        let config = AgentConfig::from_json(
            r#"{"agent": "bot/2", "max_size": 1024, "proxies": {"http": "http://p:3128"}}"#,
        )
        .unwrap();
        assert_eq!(config.agent, "bot/2");
        assert_eq!(config.max_size, Some(1024));
        assert_eq!(config.proxies.get("http").map(String::as_str), Some("http://p:3128"));
        assert_eq!(config.max_redirect, 7);

        assert!(AgentConfig::from_json("{ nope").is_err());
    }
}
