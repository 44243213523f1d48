#![warn(missing_docs)]

//! # http_useragent: a programmable HTTP user agent
//!
//! This crate implements the client side of HTTP/1.1 the way a web user
//! agent sees it: a header value grammar, a case-insensitive header store,
//! and a dispatcher that follows redirects and answers authentication
//! challenges on the caller's behalf.
//!
//! ## Overview
//!
//! The crate is split into three layers:
//!
//! 1. **Header grammar** - Split and join RFC 2616 header words and entity-tag lists
//! 2. **Messages** - An ordered, multi-valued header store plus request and response types
//! 3. **User agent** - Request preparation, redirects, authentication, cookies and hooks
//!
//! ## Key Features
//!
//! - **Lenient parsing**: Malformed header values degrade instead of failing
//! - **Canonical header order**: General, request, response, then entity headers
//! - **Response chains**: Every redirect and retry is kept via `previous`
//! - **Non-fatal diagnostics**: Policy refusals surface as `Client-Warning` headers
//! - **Pluggable back ends**: Transport, authenticators and cookie jar are traits
//!
//! ## Header Words
//!
//! ```
//! use http_useragent::protocol::{join_header_words, split_header_words};
//!
//! let words = split_header_words([r#"text/html; charset="iso-8859-1""#]);
//! assert_eq!(words[0][1], ("charset".to_string(), Some("iso-8859-1".to_string())));
//! assert_eq!(join_header_words(&words), "text/html; charset=iso-8859-1");
//! ```
//!
//! ## Client Usage
//!
//! ```ignore
//! use http_useragent::{Request, UserAgent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut agent = UserAgent::new();
//!     agent.set_credentials("example.com:443", "members", "alice", "secret")?;
//!
//!     let response = agent.request(Request::get("https://example.com/private")).await?;
//!     for warning in response.warnings() {
//!         eprintln!("warning: {}", warning);
//!     }
//!     println!("{}", response.status_line());
//!     Ok(())
//! }
//! ```
//!
//! ## Module Structure
//!
//! - **[types]** - Header store, request and response
//! - **[error]** - Error types and result handling
//! - **[client]** - User agent, handlers, authentication, cookies, transport
//! - **[protocol]** - Header word grammar, entity tags and constants

pub mod client;
pub mod error;
pub mod protocol;
pub mod types;

pub use client::{AgentConfig, ContentSink, Transport, UserAgent};
pub use error::{AgentError, Result};
pub use protocol::{join_header_words, split_header_words, ETag};
pub use types::{Headers, Request, Response};
