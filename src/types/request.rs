//! Outgoing HTTP request.

use crate::error::{AgentError, Result};
use crate::types::{HeaderValues, Headers};
use bytes::Bytes;
use std::fmt;
use url::Url;

/// An HTTP request.
///
/// The URI is kept as given and only parsed when the request is validated,
/// so a request with a missing or relative URL can be built and is rejected
/// at dispatch time.
#[derive(Clone, Debug, Default)]
pub struct Request {
    /// Method, e.g. `GET`.
    pub method: String,
    /// Target URI as given; parsed by [`Request::validate`].
    pub uri: String,
    /// Header fields.
    pub headers: Headers,
    /// Body; empty for none.
    pub content: Bytes,
    /// Proxy selected for this request by the user agent.
    pub proxy: Option<Url>,
}

impl Request {
    /// Request with no headers and an empty body.
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Request {
            method: method.into(),
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// `GET uri`.
    #[inline]
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new("GET", uri)
    }

    /// `HEAD uri`.
    #[inline]
    pub fn head(uri: impl Into<String>) -> Self {
        Self::new("HEAD", uri)
    }

    /// `POST` with `content` as the body.
    pub fn post(uri: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new("POST", uri).with_content(content)
    }

    /// `PUT` with `content` as the body.
    pub fn put(uri: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self::new("PUT", uri).with_content(content)
    }

    /// `DELETE uri`.
    #[inline]
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new("DELETE", uri)
    }

    /// Add a header value, builder style.
    pub fn with_header(mut self, name: &str, value: impl Into<HeaderValues>) -> Result<Self> {
        self.headers.push(name, value)?;
        Ok(self)
    }

    /// Replace the body, builder style.
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }

    /// First-or-joined value of a header.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name)
    }

    /// Check that the request can be sent and return its absolute URL.
    pub fn validate(&self) -> Result<Url> {
        if self.method.is_empty() {
            return Err(AgentError::InvalidRequest("Method missing".into()));
        }
        self.url()
    }

    /// The request URI as an absolute URL.
    pub fn url(&self) -> Result<Url> {
        if self.uri.trim().is_empty() {
            return Err(AgentError::InvalidRequest("URL missing".into()));
        }
        Url::parse(self.uri.trim()).map_err(|e| match e {
            url::ParseError::RelativeUrlWithoutBase => {
                AgentError::InvalidRequest("URL must be absolute".into())
            }
            other => AgentError::InvalidRequest(format!("{}: {}", other, self.uri)),
        })
    }

    /// Scheme of the request URI, lowercased, if it parses.
    pub fn scheme(&self) -> Option<String> {
        self.url().ok().map(|u| u.scheme().to_string())
    }

    /// Render as request line, headers and content.
    pub fn as_string(&self, line_ending: &str) -> String {
        let mut out = format!("{} {}{}", self.method, self.uri, line_ending);
        out.push_str(&self.headers.serialize(line_ending));
        out.push_str(line_ending);
        out.push_str(&String::from_utf8_lossy(&self.content));
        if !self.content.is_empty() && !self.content.ends_with(b"\n") {
            out.push_str(line_ending);
        }
        out
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_ok() {
        let req = Request::get("http://example.com/a?b=c");
        let url = req.validate().unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(req.scheme().as_deref(), Some("http"));
    }

    #[test]
    fn test_missing_method() {
        let err = Request::new("", "http://example.com/").validate().unwrap_err();
        assert!(err.to_string().contains("Method missing"));
    }

    #[test]
    fn test_missing_url() {
        let err = Request::get("").validate().unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(ref m) if m == "URL missing"));
    }

    #[test]
    fn test_relative_url() {
        let err = Request::get("/just/a/path").validate().unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(ref m) if m == "URL must be absolute"));
    }

    #[test]
    fn test_builders() {
        let req = Request::post("http://example.com/form", "a=1")
            .with_header("Content-Type", "application/x-www-form-urlencoded")
            .unwrap();
        assert_eq!(req.method, "POST");
        assert_eq!(&req.content[..], b"a=1");
        assert_eq!(
            req.header("content-type").as_deref(),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_as_string() {
        let req = Request::put("http://example.com/x", "body")
            .with_header("Host", "example.com")
            .unwrap();
        assert_eq!(
            req.as_string("\n"),
            "PUT http://example.com/x\nHost: example.com\n\nbody\n"
        );
    }
}
