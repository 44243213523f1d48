//! Request and response hooks.
//!
//! Handlers are named callbacks attached to one phase of a dispatch. Each
//! carries a [`MatchSpec`]; a handler only runs for messages it matches.
//!
//! | Phase | Callback | Runs |
//! |-------|----------|------|
//! | `RequestPreprepare` | `Fn(&mut Request)` | before default headers are applied |
//! | `RequestPrepare` | `Fn(&mut Request)` | after default headers and cookies |
//! | `RequestSend` | `Fn(&Request) -> Option<Response>` | instead of the transport; first `Some` wins |
//! | `ResponseDone` | `Fn(&mut Response)` | once per received response |
//! | `ResponseRedirect` | `Fn(&Response) -> Option<Request>` | before built-in redirects; first `Some` is dispatched |
//!
//! # Examples
//!
//! ```
//! use http_useragent::client::{HandlerSet, MatchSpec, Phase};
//!
//! let mut handlers = HandlerSet::default();
//! handlers.on_request_prepare("trace-id", MatchSpec::default(), |req| {
//!     let _ = req.headers.set("X-Trace", "1");
//! });
//! assert_eq!(handlers.names(Phase::RequestPrepare), vec!["trace-id"]);
//! assert_eq!(handlers.remove(Phase::RequestPrepare, "trace-id"), 1);
//! ```

use crate::types::{Request, Response};
use std::fmt;
use std::sync::Arc;

/// Callback for the two request preparation phases.
pub type PrepareHook = Arc<dyn Fn(&mut Request) + Send + Sync>;
/// Callback that may short-circuit the transport.
pub type SendHook = Arc<dyn Fn(&Request) -> Option<Response> + Send + Sync>;
/// Callback run on each response.
pub type DoneHook = Arc<dyn Fn(&mut Response) + Send + Sync>;
/// Callback that may supply the next request in a chain.
pub type RedirectHook = Arc<dyn Fn(&Response) -> Option<Request> + Send + Sync>;

/// Dispatch phase a handler is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Before default headers are applied.
    RequestPreprepare,
    /// After default headers and cookies, just before sending.
    RequestPrepare,
    /// May answer the request instead of the transport.
    RequestSend,
    /// Every response, after bookkeeping.
    ResponseDone,
    /// May supply the next request of the chain.
    ResponseRedirect,
}

/// Restricts which messages a handler sees. Unset fields match anything.
///
/// Response phases match against the response's request, plus `code`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchSpec {
    /// Request method, case-insensitive.
    pub method: Option<String>,
    /// URL scheme, case-insensitive.
    pub scheme: Option<String>,
    /// Host of the request URL, case-insensitive.
    pub host: Option<String>,
    /// Response status; ignored in request phases.
    pub code: Option<u16>,
}

impl MatchSpec {
    /// Match only this method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Match only this URL scheme.
    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = Some(scheme.into());
        self
    }

    /// Match only this host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Match only responses with this status.
    pub fn code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }

    /// Whether a request satisfies the method, scheme and host constraints.
    pub fn matches_request(&self, request: &Request) -> bool {
        if let Some(method) = &self.method {
            if !method.eq_ignore_ascii_case(&request.method) {
                return false;
            }
        }
        if self.scheme.is_none() && self.host.is_none() {
            return true;
        }
        let Ok(url) = request.url() else {
            return false;
        };
        let scheme_ok = self
            .scheme
            .as_ref()
            .is_none_or(|s| s.eq_ignore_ascii_case(url.scheme()));
        let host_ok = self
            .host
            .as_ref()
            .is_none_or(|h| url.host_str().is_some_and(|u| h.eq_ignore_ascii_case(u)));
        scheme_ok && host_ok
    }

    /// Whether a response satisfies `code` and its request the rest.
    pub fn matches_response(&self, response: &Response) -> bool {
        if self.code.is_some_and(|c| c != response.status) {
            return false;
        }
        match &response.request {
            Some(request) => self.matches_request(request),
            None => self.method.is_none() && self.scheme.is_none() && self.host.is_none(),
        }
    }
}

#[derive(Clone)]
struct Handler<F> {
    name: String,
    spec: MatchSpec,
    callback: F,
}

/// Ordered handler lists, one per [`Phase`].
///
/// Handlers run in registration order. Cloning shares the callbacks but the
/// lists themselves are independent.
#[derive(Clone, Default)]
pub struct HandlerSet {
    request_preprepare: Vec<Handler<PrepareHook>>,
    request_prepare: Vec<Handler<PrepareHook>>,
    request_send: Vec<Handler<SendHook>>,
    response_done: Vec<Handler<DoneHook>>,
    response_redirect: Vec<Handler<RedirectHook>>,
}

impl HandlerSet {
    /// Add a hook that runs before default headers are applied.
    pub fn on_request_preprepare<F>(&mut self, name: &str, spec: MatchSpec, f: F)
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        let hook: PrepareHook = Arc::new(f);
        self.request_preprepare.push(handler(name, spec, hook));
    }

    /// Add a hook that runs on the fully prepared request.
    pub fn on_request_prepare<F>(&mut self, name: &str, spec: MatchSpec, f: F)
    where
        F: Fn(&mut Request) + Send + Sync + 'static,
    {
        let hook: PrepareHook = Arc::new(f);
        self.request_prepare.push(handler(name, spec, hook));
    }

    /// Add a hook that may answer a request itself; the first `Some` wins.
    pub fn on_request_send<F>(&mut self, name: &str, spec: MatchSpec, f: F)
    where
        F: Fn(&Request) -> Option<Response> + Send + Sync + 'static,
    {
        let hook: SendHook = Arc::new(f);
        self.request_send.push(handler(name, spec, hook));
    }

    /// Add a hook that sees every response.
    pub fn on_response_done<F>(&mut self, name: &str, spec: MatchSpec, f: F)
    where
        F: Fn(&mut Response) + Send + Sync + 'static,
    {
        let hook: DoneHook = Arc::new(f);
        self.response_done.push(handler(name, spec, hook));
    }

    /// Add a hook that may supply the next request; the first `Some` wins.
    pub fn on_response_redirect<F>(&mut self, name: &str, spec: MatchSpec, f: F)
    where
        F: Fn(&Response) -> Option<Request> + Send + Sync + 'static,
    {
        let hook: RedirectHook = Arc::new(f);
        self.response_redirect.push(handler(name, spec, hook));
    }

    /// Remove every handler with this name from a phase; returns how many
    /// were removed.
    pub fn remove(&mut self, phase: Phase, name: &str) -> usize {
        fn retain<F>(list: &mut Vec<Handler<F>>, name: &str) -> usize {
            let before = list.len();
            list.retain(|h| h.name != name);
            before - list.len()
        }
        match phase {
            Phase::RequestPreprepare => retain(&mut self.request_preprepare, name),
            Phase::RequestPrepare => retain(&mut self.request_prepare, name),
            Phase::RequestSend => retain(&mut self.request_send, name),
            Phase::ResponseDone => retain(&mut self.response_done, name),
            Phase::ResponseRedirect => retain(&mut self.response_redirect, name),
        }
    }

    /// Handler names of a phase, in run order.
    pub fn names(&self, phase: Phase) -> Vec<&str> {
        fn names<F>(list: &[Handler<F>]) -> Vec<&str> {
            list.iter().map(|h| h.name.as_str()).collect()
        }
        match phase {
            Phase::RequestPreprepare => names(&self.request_preprepare),
            Phase::RequestPrepare => names(&self.request_prepare),
            Phase::RequestSend => names(&self.request_send),
            Phase::ResponseDone => names(&self.response_done),
            Phase::ResponseRedirect => names(&self.response_redirect),
        }
    }

    /// No hook registered in any phase.
    pub fn is_empty(&self) -> bool {
        self.request_preprepare.is_empty()
            && self.request_prepare.is_empty()
            && self.request_send.is_empty()
            && self.response_done.is_empty()
            && self.response_redirect.is_empty()
    }

    pub(crate) fn run_request_preprepare(&self, request: &mut Request) {
        run_prepare(&self.request_preprepare, request);
    }

    pub(crate) fn run_request_prepare(&self, request: &mut Request) {
        run_prepare(&self.request_prepare, request);
    }

    pub(crate) fn run_request_send(&self, request: &Request) -> Option<Response> {
        self.request_send
            .iter()
            .filter(|h| h.spec.matches_request(request))
            .find_map(|h| (h.callback)(request))
    }

    pub(crate) fn run_response_done(&self, response: &mut Response) {
        for h in &self.response_done {
            if h.spec.matches_response(response) {
                (h.callback)(&mut *response);
            }
        }
    }

    pub(crate) fn run_response_redirect(&self, response: &Response) -> Option<Request> {
        self.response_redirect
            .iter()
            .filter(|h| h.spec.matches_response(response))
            .find_map(|h| (h.callback)(response))
    }
}

fn handler<F>(name: &str, spec: MatchSpec, callback: F) -> Handler<F> {
    Handler {
        name: name.to_string(),
        spec,
        callback,
    }
}

fn run_prepare(list: &[Handler<PrepareHook>], request: &mut Request) {
    for h in list {
        // re-checked per handler: an earlier one may have rewritten the request
        if h.spec.matches_request(request) {
            (h.callback)(&mut *request);
        }
    }
}

impl fmt::Debug for HandlerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSet")
            .field("request_preprepare", &self.names(Phase::RequestPreprepare))
            .field("request_prepare", &self.names(Phase::RequestPrepare))
            .field("request_send", &self.names(Phase::RequestSend))
            .field("response_done", &self.names(Phase::ResponseDone))
            .field("response_redirect", &self.names(Phase::ResponseRedirect))
            .finish()
    }
}
