//! Error types for the user agent.
//!
//! # Error Categories
//!
//! | Category | Variants | Surfaces as |
//! |----------|----------|-------------|
//! | Construction | `InvalidRequest`, `InvalidArgument`, `Url` | `Err` |
//! | Transport | `Transport`, `Io` | `Err`, or a synthesized response when wrapping is on |
//! | Policy | `ProtocolNotPermitted`, `RedirectLoopDetected` | `Client-Warning` on the response |
//! | Authentication | `UnsupportedAuthScheme`, `MalformedAuthChallenge` | `Client-Warning` on the response |
//!
//! Once a request has been accepted for sending, the caller always gets a
//! response back; non-fatal conditions are rendered with `Display` into the
//! response's `Client-Warning` header.
//!
//! # Examples
//!
//! ```
//! use http_useragent::AgentError;
//!
//! let err = AgentError::RedirectLoopDetected(7);
//! assert!(!err.is_fatal());
//! assert_eq!(err.to_string(), "Redirect loop detected (max_redirect = 7)");
//! ```

use std::io;
use thiserror::Error;

/// Result type for user agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;

/// Errors that can occur while building or dispatching requests.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AgentError {
    /// The request cannot be sent: missing method, missing or relative URL.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A caller supplied value is unusable (empty header name, `:` in a
    /// Basic-auth user name, ...).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The transport failed to produce a response.
    #[error("{0}")]
    Transport(String),

    /// The URL scheme is excluded by the allow/forbid lists.
    #[error("Access to '{0}' URIs has been disabled")]
    ProtocolNotPermitted(String),

    /// The redirect chain reached the configured limit.
    #[error("Redirect loop detected (max_redirect = {0})")]
    RedirectLoopDetected(usize),

    /// No authenticator is registered for the challenge scheme.
    #[error("Unsupported authentication scheme '{0}'")]
    UnsupportedAuthScheme(String),

    /// The challenge scheme name is not a valid token.
    #[error("Bad authentication scheme '{0}'")]
    MalformedAuthChallenge(String),

    /// Local I/O error, e.g. while writing a file sink.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// URL parsing failed.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<anyhow::Error> for AgentError {
    fn from(err: anyhow::Error) -> Self {
        AgentError::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for AgentError {
    fn from(err: reqwest::Error) -> Self {
        AgentError::Transport(err.to_string())
    }
}

impl AgentError {
    /// Whether this error is returned to the caller as `Err` rather than
    /// recorded on a response.
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AgentError::ProtocolNotPermitted(_)
                | AgentError::RedirectLoopDetected(_)
                | AgentError::UnsupportedAuthScheme(_)
                | AgentError::MalformedAuthChallenge(_)
        )
    }

    /// Status code and message for a response synthesized from this error.
    ///
    /// Transport messages of the form `"503 Service Unavailable"` keep their
    /// leading code; everything else maps to 500, or 501 for disabled schemes.
    pub fn response_parts(&self) -> (u16, String) {
        match self {
            AgentError::ProtocolNotPermitted(_) => (501, self.to_string()),
            AgentError::Transport(msg) => match leading_status(msg) {
                Some(code) => (code, msg[3..].trim_start().to_string()),
                None => (500, msg.clone()),
            },
            _ => (500, self.to_string()),
        }
    }
}

/// Parse a leading three digit status followed by whitespace.
fn leading_status(msg: &str) -> Option<u16> {
    let (code, rest) = msg.split_at_checked(3)?;
    if !code.bytes().all(|b| b.is_ascii_digit()) || !rest.starts_with(char::is_whitespace) {
        return None;
    }
    code.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_construction_errors_are_fatal() {
        assert!(AgentError::InvalidRequest("Method missing".into()).is_fatal());
        assert!(AgentError::InvalidArgument("empty".into()).is_fatal());
        assert!(AgentError::Transport("boom".into()).is_fatal());
    }

    #[test]
    fn test_policy_errors_are_not_fatal() {
        assert!(!AgentError::ProtocolNotPermitted("ftp".into()).is_fatal());
        assert!(!AgentError::RedirectLoopDetected(7).is_fatal());
        assert!(!AgentError::UnsupportedAuthScheme("digest".into()).is_fatal());
        assert!(!AgentError::MalformedAuthChallenge("B@d".into()).is_fatal());
    }

    #[test]
    fn test_warning_texts() {
        assert_eq!(
            AgentError::ProtocolNotPermitted("ftp".into()).to_string(),
            "Access to 'ftp' URIs has been disabled"
        );
        assert_eq!(
            AgentError::UnsupportedAuthScheme("foo".into()).to_string(),
            "Unsupported authentication scheme 'foo'"
        );
        assert_eq!(
            AgentError::MalformedAuthChallenge("Foo_1".into()).to_string(),
            "Bad authentication scheme 'Foo_1'"
        );
    }

    #[test]
    fn test_response_parts() {
        assert_eq!(
            AgentError::ProtocolNotPermitted("ftp".into()).response_parts(),
            (501, "Access to 'ftp' URIs has been disabled".to_string())
        );
        assert_eq!(
            AgentError::Transport("503 Service Unavailable".into()).response_parts(),
            (503, "Service Unavailable".to_string())
        );
        assert_eq!(
            AgentError::Transport("connection refused".into()).response_parts(),
            (500, "connection refused".to_string())
        );
        assert_eq!(AgentError::Transport("5000 things".into()).response_parts().0, 500);
        assert_eq!(AgentError::Io(io::Error::other("disk")).response_parts().0, 500);
    }

    #[test]
    fn test_anyhow_conversion() {
        let err: AgentError = anyhow::anyhow!("socket closed").into();
        assert_eq!(err.to_string(), "socket closed");
    }
}
