//! HTTP response linked to its request and predecessors.

use crate::protocol::constants::headers;
use crate::types::{Headers, Request};
use bytes::Bytes;
use std::time::SystemTime;
use url::Url;

/// An HTTP response.
///
/// `previous` links to the response this one superseded (a redirect or an
/// authentication challenge), forming the chain counted by
/// [`redirects`](Response::redirects).
#[derive(Clone, Debug, Default)]
pub struct Response {
    /// Status code.
    pub status: u16,
    /// Reason phrase.
    pub message: String,
    /// Header fields.
    pub headers: Headers,
    /// Body, when it was kept in memory.
    pub content: Bytes,
    /// The request that produced this response, as sent.
    pub request: Option<Box<Request>>,
    /// The response this one superseded.
    pub previous: Option<Box<Response>>,
}

impl Response {
    /// Response with the given status and the canonical reason phrase.
    pub fn new(status: u16) -> Self {
        Response {
            status,
            message: reason_phrase(status).to_string(),
            ..Default::default()
        }
    }

    /// Replace the reason phrase, builder style.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Replace the body, builder style.
    pub fn with_content(mut self, content: impl Into<Bytes>) -> Self {
        self.content = content.into();
        self
    }

    /// Response synthesized by the user agent instead of received from a
    /// server: carries `Client-Warning: Internal response`, a plain text
    /// content and the originating request.
    pub fn internal(request: &Request, status: u16, message: Option<&str>) -> Self {
        let message = match message {
            Some(m) if !m.is_empty() => m.to_string(),
            _ => reason_phrase(status).to_string(),
        };
        let content = format!("{} {}\n", status, message);

        let mut response = Response::new(status).with_message(message).with_content(content);
        response.request = Some(Box::new(request.clone()));
        response.headers.set_client_date(SystemTime::now());
        response.add_warning("Internal response");
        response.headers.set_known("Content-Type", "text/plain");
        response
    }

    /// First-or-joined value of a header.
    pub fn header(&self, name: &str) -> Option<String> {
        self.headers.get(name)
    }

    /// Append a `Client-Warning` diagnostic.
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.headers.push_known("Client-Warning", warning);
    }

    /// All `Client-Warning` diagnostics in the order they were added.
    pub fn warnings(&self) -> Vec<&str> {
        self.headers.get_all(headers::CLIENT_WARNING.as_str())
    }

    /// `"<code> <message>"`.
    pub fn status_line(&self) -> String {
        format!("{} {}", self.status, self.message)
    }

    /// Content decoded as UTF-8, if valid.
    pub fn content_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.content).ok()
    }

    /// 1xx.
    #[inline]
    pub fn is_info(&self) -> bool {
        (100..200).contains(&self.status)
    }

    /// 2xx.
    #[inline]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 3xx.
    #[inline]
    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }

    /// 4xx or 5xx.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.status >= 400
    }

    /// Base URL for resolving relative references in this response.
    ///
    /// `Content-Base`, then `Content-Location`, then `Base`; relative values
    /// are resolved against the request URL, which is also the fallback.
    pub fn base(&self) -> Option<Url> {
        let request_url = self.request.as_ref().and_then(|r| r.url().ok());
        let declared = [headers::CONTENT_BASE.as_str(), headers::CONTENT_LOCATION.as_str(), "Base"]
            .iter()
            .find_map(|name| self.headers.get_all(name).first().map(|v| v.trim().to_string()));

        match declared {
            Some(base) if !base.is_empty() => match Url::parse(&base) {
                Ok(url) => Some(url),
                Err(_) => request_url.and_then(|r| r.join(&base).ok()),
            },
            _ => request_url,
        }
    }

    /// Number of responses that preceded this one.
    pub fn redirects(&self) -> usize {
        self.previous_chain().count()
    }

    /// Preceding responses, most recent first.
    pub fn previous_chain(&self) -> impl Iterator<Item = &Response> {
        std::iter::successors(self.previous.as_deref(), |r| r.previous.as_deref())
    }
}

/// Canonical reason phrase, or `"Unknown code"`.
pub fn reason_phrase(status: u16) -> &'static str {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown code")
}
