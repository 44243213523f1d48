//! HTTP user agent.
//!
//! This module provides the request dispatcher and the pieces it plugs
//! together, enabling clients to:
//!
//! - **Apply default headers** (`User-Agent`, `From`, size-limiting `Range`)
//! - **Follow redirects** with method rewriting and loop detection
//! - **Answer authentication challenges** through per-scheme authenticators
//! - **Keep cookies** across requests
//! - **Hook into every phase** of a dispatch with named handlers
//!
//! # Module Organization
//!
//! ```text
//! client/
//! ├── agent     - UserAgent and the redirect/auth loop
//! ├── auth      - Challenge parsing, authenticators, credentials
//! ├── config    - Agent configuration
//! ├── cookies   - Cookie jar trait and in-memory store
//! ├── handlers  - Per-phase request/response hooks
//! └── transport - Transport trait, content sinks, reqwest back end
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`UserAgent`] | Dispatches requests and follows the response chain |
//! | [`AgentConfig`] | Agent configuration options |
//! | [`HandlerSet`] | Named hooks per dispatch phase |
//! | [`Authenticator`] | Answers challenges of one scheme |
//! | [`Transport`] | Performs one request/response exchange |
//! | [`MemoryCookieJar`] | In-memory cookie store |
//!
//! # Examples
//!
//! ## Creating an Agent
//!
//! ```
//! use http_useragent::client::{AgentConfig, UserAgent};
//!
//! let agent = UserAgent::with_config(AgentConfig {
//!     max_redirect: 3,
//!     ..Default::default()
//! });
//! assert_eq!(agent.config().max_redirect, 3);
//! assert!(agent.agent().unwrap().starts_with("http_useragent/"));
//! ```
//!
//! ## Registering Handlers
//!
//! ```
//! use http_useragent::client::{MatchSpec, Phase, UserAgent};
//!
//! let mut agent = UserAgent::new();
//! agent.handlers_mut().on_request_prepare(
//!     "accept-json",
//!     MatchSpec::default().host("api.example.com"),
//!     |req| {
//!         let _ = req.headers.init("Accept", "application/json");
//!     },
//! );
//! assert_eq!(agent.handlers().names(Phase::RequestPrepare), vec!["accept-json"]);
//! ```
//!
//! ## Credentials
//!
//! ```
//! use http_useragent::client::UserAgent;
//!
//! let mut agent = UserAgent::new();
//! agent.set_credentials("example.com:80", "private", "alice", "secret").unwrap();
//! assert!(agent.set_credentials("example.com:80", "private", "a:b", "x").is_err());
//! ```

mod agent;
mod auth;
mod config;
mod cookies;
mod handlers;
mod transport;

pub use agent::{RedirectPolicy, UserAgent};
pub use auth::{
    netloc, AuthChallenge, Authenticator, AuthenticatorRegistry, BasicAuthenticator, Credentials,
};
pub use config::{AgentConfig, DEFAULT_AGENT};
pub use cookies::{CookieJar, MemoryCookieJar};
pub use handlers::{
    DoneHook, HandlerSet, MatchSpec, Phase, PrepareHook, RedirectHook, SendHook,
};
pub use transport::{ChunkCallback, ContentSink, ReqwestTransport, Transport};
