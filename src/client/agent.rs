//! The request dispatcher.
//!
//! [`UserAgent`] turns a [`Request`] into a final [`Response`]:
//!
//! ```text
//! request ─▶ prepare ─▶ send ─▶ bookkeeping ─▶ decide ─┬─▶ response
//!              ▲                                       │
//!              └──────── redirect / auth retry ◀───────┘
//! ```
//!
//! Every response produced on the way is kept: the final response links to
//! the one it superseded through [`Response::previous`], and the chain length
//! is what `max_redirect` bounds.
//!
//! # Examples
//!
//! ```ignore
//! use http_useragent::UserAgent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agent = UserAgent::new();
//!     let response = agent.get("http://example.com/").await?;
//!     println!("{} after {} redirects", response.status_line(), response.redirects());
//!     Ok(())
//! }
//! ```

use super::auth::{AuthChallenge, AuthenticatorRegistry, Credentials};
use super::config::AgentConfig;
use super::cookies::CookieJar;
use super::handlers::HandlerSet;
use super::transport::{ContentSink, ReqwestTransport, Transport};
use crate::error::{AgentError, Result};
use crate::protocol::constants::{
    headers, METHOD_CHANGING_REDIRECTS, PROXY_AUTHENTICATION_REQUIRED, REDIRECT_STATUSES,
    UNAUTHORIZED,
};
use crate::types::{Headers, Request, Response};
use bytes::Bytes;
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, warn};
use url::Url;

/// Decides whether a redirect may be followed.
///
/// Receives the prepared follow-up request and the redirect response; may
/// add warnings to the response when refusing.
pub type RedirectPolicy = Arc<dyn Fn(&Request, &mut Response) -> bool + Send + Sync>;

/// HTTP user agent: default headers, redirects, authentication, cookies.
///
/// Cloning produces an independent agent. Handlers and authenticators are
/// shared by reference, the cookie jar is shared, everything else is copied.
#[derive(Clone)]
pub struct UserAgent {
    config: AgentConfig,
    transport: Arc<dyn Transport>,
    default_headers: Headers,
    handlers: HandlerSet,
    authenticators: AuthenticatorRegistry,
    credentials: Credentials,
    cookie_jar: Option<Arc<dyn CookieJar>>,
    redirect_policy: Option<RedirectPolicy>,
}

impl UserAgent {
    /// Agent with default configuration over [`ReqwestTransport`].
    pub fn new() -> Self {
        Self::with_config(AgentConfig::default())
    }

    /// Agent with `config` over [`ReqwestTransport`].
    pub fn with_config(config: AgentConfig) -> Self {
        Self::with_transport(config, Arc::new(ReqwestTransport::new()))
    }

    /// Agent over a custom transport.
    pub fn with_transport(config: AgentConfig, transport: Arc<dyn Transport>) -> Self {
        let mut agent = UserAgent {
            default_headers: Headers::new(),
            config,
            transport,
            handlers: HandlerSet::default(),
            authenticators: AuthenticatorRegistry::default(),
            credentials: Credentials::default(),
            cookie_jar: None,
            redirect_policy: None,
        };
        agent.rebuild_default_headers();
        agent
    }

    fn rebuild_default_headers(&mut self) {
        let mut defaults = Headers::new();
        for (name, value) in &self.config.default_headers {
            if let Err(e) = defaults.push(name, value.as_str()) {
                warn!("skipping default header {:?}: {}", name, e);
            }
        }
        defaults.set_known("User-Agent", self.config.agent_string());
        if let Some(from) = &self.config.from {
            defaults.set_known("From", from.clone());
        }
        self.default_headers = defaults;
    }

    /// Current configuration.
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replace the configuration. Default headers derived from it are
    /// rebuilt, so edits made through
    /// [`default_headers_mut`](Self::default_headers_mut) are discarded.
    pub fn set_config(&mut self, config: AgentConfig) {
        self.config = config;
        self.rebuild_default_headers();
    }

    /// Current `User-Agent` default.
    pub fn agent(&self) -> Option<String> {
        self.default_headers.user_agent()
    }

    /// Set the `User-Agent` default; a trailing space appends the built-in
    /// product token. An empty name removes the header.
    pub fn set_agent(&mut self, agent: &str) {
        self.config.agent = agent.to_string();
        if agent.is_empty() {
            self.default_headers.remove(&["User-Agent"]);
        } else {
            self.default_headers.set_known("User-Agent", self.config.agent_string());
        }
    }

    /// Set the `From` default; `None` removes it.
    pub fn set_from(&mut self, from: Option<&str>) {
        self.config.from = from.map(str::to_string);
        match from {
            Some(from) => self.default_headers.set_known("From", from),
            None => {
                self.default_headers.remove(&["From"]);
            }
        }
    }

    /// Headers merged into every request that does not set them itself.
    pub fn default_headers(&self) -> &Headers {
        &self.default_headers
    }

    /// Mutable access to the default headers.
    pub fn default_headers_mut(&mut self) -> &mut Headers {
        &mut self.default_headers
    }

    /// Registered per-phase hooks.
    pub fn handlers(&self) -> &HandlerSet {
        &self.handlers
    }

    /// Mutable access to the hooks.
    pub fn handlers_mut(&mut self) -> &mut HandlerSet {
        &mut self.handlers
    }

    /// Scheme to authenticator map consulted on 401/407.
    pub fn authenticators(&self) -> &AuthenticatorRegistry {
        &self.authenticators
    }

    /// Mutable access to the authenticator registry.
    pub fn authenticators_mut(&mut self) -> &mut AuthenticatorRegistry {
        &mut self.authenticators
    }

    /// Stored credentials, keyed by `host:port` and realm.
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Store credentials for `host:port` and realm.
    pub fn set_credentials(
        &mut self,
        netloc: &str,
        realm: &str,
        user: &str,
        password: &str,
    ) -> Result<()> {
        self.credentials.set(netloc, realm, user, password)
    }

    /// The installed cookie jar, if any.
    pub fn cookie_jar(&self) -> Option<&Arc<dyn CookieJar>> {
        self.cookie_jar.as_ref()
    }

    /// Install or remove the cookie jar.
    pub fn set_cookie_jar(&mut self, jar: Option<Arc<dyn CookieJar>>) {
        self.cookie_jar = jar;
    }

    /// Replace the redirect policy. `None` restores the built-in one.
    pub fn set_redirect_policy(&mut self, policy: Option<RedirectPolicy>) {
        self.redirect_policy = policy;
    }

    /// Route requests for `scheme` through `proxy`.
    pub fn set_proxy(&mut self, scheme: &str, proxy: &str) -> Result<()> {
        Url::parse(proxy)?;
        self.config
            .proxies
            .insert(scheme.to_ascii_lowercase(), proxy.to_string());
        Ok(())
    }

    /// Hosts (and their subdomains) that bypass every proxy.
    pub fn set_no_proxy<I, S>(&mut self, hosts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.no_proxy = hosts.into_iter().map(Into::into).collect();
    }

    /// Whether requests for `scheme` may be sent.
    pub fn is_protocol_supported(&self, scheme: &str) -> bool {
        self.config.is_protocol_supported(scheme)
    }

    /// `GET uri` through [`request`](Self::request).
    pub async fn get(&self, uri: &str) -> Result<Response> {
        self.request(Request::get(uri)).await
    }

    /// `HEAD uri`.
    pub async fn head(&self, uri: &str) -> Result<Response> {
        self.request(Request::head(uri)).await
    }

    /// `POST uri` with `content` as the body.
    pub async fn post(&self, uri: &str, content: impl Into<Bytes>) -> Result<Response> {
        self.request(Request::post(uri, content)).await
    }

    /// `PUT uri` with `content` as the body.
    pub async fn put(&self, uri: &str, content: impl Into<Bytes>) -> Result<Response> {
        self.request(Request::put(uri, content)).await
    }

    /// `DELETE uri`.
    pub async fn delete(&self, uri: &str) -> Result<Response> {
        self.request(Request::delete(uri)).await
    }

    /// Dispatch a request, following redirects and answering challenges.
    pub async fn request(&self, request: Request) -> Result<Response> {
        self.request_to(request, &ContentSink::Memory).await
    }

    /// Like [`request`](Self::request), with the body sent to `sink`.
    pub async fn request_to(&self, request: Request, sink: &ContentSink) -> Result<Response> {
        self.request_with_previous(request, None, sink, self.config.read_size_hint)
            .await
    }

    /// Dispatch without following redirects or answering challenges.
    pub async fn simple_request(&self, request: Request, sink: &ContentSink) -> Result<Response> {
        let mut request = request;
        self.prepare_request(&mut request)?;
        self.send_request(request, sink, self.config.read_size_hint)
            .await
    }

    /// Dispatch `request` as the successor of `previous`.
    ///
    /// This is the re-entry point for redirects and authenticators: the
    /// returned response is linked to `previous`, so the chain length keeps
    /// growing across retries.
    pub fn request_with_previous<'a>(
        &'a self,
        request: Request,
        previous: Option<Response>,
        sink: &'a ContentSink,
        read_size_hint: Option<usize>,
    ) -> BoxFuture<'a, Result<Response>> {
        async move {
            let mut request = request;
            self.prepare_request(&mut request)?;
            let mut response = self
                .send_request(request.clone(), sink, read_size_hint)
                .await?;
            response.previous = previous.map(Box::new);

            let max_redirect = self.config.max_redirect;
            if response.redirects() >= max_redirect {
                let would_follow = response.headers.contains(headers::LOCATION.as_str())
                    || matches!(response.status, UNAUTHORIZED | PROXY_AUTHENTICATION_REQUIRED);
                if would_follow {
                    let err = AgentError::RedirectLoopDetected(max_redirect);
                    warn!("{} at {}", err, request.uri);
                    response.add_warning(err.to_string());
                }
                return Ok(response);
            }

            if let Some(next) = self.handlers.run_response_redirect(&response) {
                debug!("redirect handler supplied {} {}", next.method, next.uri);
                return self
                    .request_with_previous(next, Some(response), sink, read_size_hint)
                    .await;
            }

            match response.status {
                code if REDIRECT_STATUSES.contains(&code) => {
                    self.follow_redirect(request, response, sink, read_size_hint)
                        .await
                }
                UNAUTHORIZED | PROXY_AUTHENTICATION_REQUIRED => {
                    self.answer_challenge(request, response, sink, read_size_hint)
                        .await
                }
                _ => Ok(response),
            }
        }
        .boxed()
    }

    /// Validate the request and fill in everything the agent adds before
    /// sending.
    pub fn prepare_request(&self, request: &mut Request) -> Result<()> {
        request.validate()?;

        self.handlers.run_request_preprepare(request);

        for name in self.default_headers.field_names() {
            request
                .headers
                .init(name, self.default_headers.get_all(name))?;
        }
        if let Some(max_size) = self.config.max_size.filter(|&m| m > 0) {
            request
                .headers
                .init(headers::RANGE.as_str(), format!("bytes=0-{}", max_size - 1))?;
        }
        if let Some(jar) = &self.cookie_jar {
            jar.add_cookie_header(request);
        }

        self.handlers.run_request_prepare(request);

        let url = request.validate()?;
        if request.proxy.is_none() {
            request.proxy = self.proxy_for(&url)?;
        }
        Ok(())
    }

    fn proxy_for(&self, url: &Url) -> Result<Option<Url>> {
        let Some(proxy) = self.config.proxies.get(url.scheme()) else {
            return Ok(None);
        };
        if url
            .host_str()
            .is_some_and(|host| self.config.bypasses_proxy(host))
        {
            return Ok(None);
        }
        Ok(Some(Url::parse(proxy)?))
    }

    /// One exchange plus bookkeeping: request link, `Client-Date`, cookie
    /// extraction and `ResponseDone` handlers.
    async fn send_request(
        &self,
        request: Request,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
    ) -> Result<Response> {
        let url = request.validate()?;
        let scheme = url.scheme().to_ascii_lowercase();
        if self.config.enable_logging {
            debug!(method = %request.method, url = %url, "sending request");
        }

        let mut response = match self.handlers.run_request_send(&request) {
            Some(response) => response,
            None if !self.is_protocol_supported(&scheme) => {
                let err = AgentError::ProtocolNotPermitted(scheme);
                warn!("{}", err);
                let (code, message) = err.response_parts();
                Response::internal(&request, code, Some(message.as_str()))
            }
            None => match self
                .transport
                .execute(
                    &request,
                    request.proxy.as_ref(),
                    sink,
                    read_size_hint,
                    self.config.timeout(),
                )
                .await
            {
                Ok(response) => response,
                Err(err) if self.config.wrap_errors => {
                    warn!("transport error for {}: {}", url, err);
                    let (code, message) = err.response_parts();
                    Response::internal(&request, code, Some(message.as_str()))
                }
                Err(err) => return Err(err),
            },
        };

        response.request = Some(Box::new(request));
        response.headers.set_client_date(SystemTime::now());
        if let Some(jar) = &self.cookie_jar {
            jar.extract_cookies(&response);
        }
        self.handlers.run_response_done(&mut response);

        if self.config.enable_logging {
            debug!(status = response.status, "received response");
        }
        Ok(response)
    }

    async fn follow_redirect(
        &self,
        request: Request,
        mut response: Response,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
    ) -> Result<Response> {
        let Some(location) = response.header(headers::LOCATION.as_str()) else {
            return Ok(response);
        };
        let location = location.trim().to_string();
        let target = match response.base() {
            Some(base) => base.join(&location),
            None => Url::parse(&location),
        };
        let target = match target {
            Ok(url) => url,
            Err(e) => {
                response.add_warning(format!("Bad Location header '{}': {}", location, e));
                return Ok(response);
            }
        };

        let mut referral = request.clone();
        referral.headers.remove(&[headers::HOST.as_str(), headers::COOKIE.as_str()]);
        referral.proxy = None;

        if METHOD_CHANGING_REDIRECTS.contains(&response.status)
            && !matches!(referral.method.to_ascii_uppercase().as_str(), "GET" | "HEAD")
        {
            referral.method = "GET".to_string();
            referral.content = Bytes::new();
            referral.headers.remove_content_headers();
        }

        let downgrade = request
            .url()
            .is_ok_and(|from| from.scheme() == "https" && target.scheme() == "http");
        if downgrade {
            referral.headers.remove(&[headers::REFERER.as_str()]);
        }
        referral.uri = target.to_string();

        let allowed = match &self.redirect_policy {
            Some(policy) => policy(&referral, &mut response),
            None => self.redirect_ok(&referral, &mut response),
        };
        if !allowed {
            return Ok(response);
        }

        debug!("following {} redirect to {}", response.status, referral.uri);
        self.request_with_previous(referral, Some(response), sink, read_size_hint)
            .await
    }

    /// Built-in redirect policy: the method of the redirected request must
    /// be in `requests_redirectable`, and `file:` targets are refused.
    pub fn redirect_ok(&self, referral: &Request, response: &mut Response) -> bool {
        let method = response
            .request
            .as_ref()
            .map_or(referral.method.as_str(), |r| r.method.as_str());
        if !self.config.is_redirectable(method) {
            return false;
        }
        if referral
            .url()
            .is_ok_and(|url| url.scheme().eq_ignore_ascii_case("file"))
        {
            response.add_warning("Can't redirect to a file:// URL!");
            return false;
        }
        true
    }

    async fn answer_challenge(
        &self,
        request: Request,
        mut response: Response,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
    ) -> Result<Response> {
        let is_proxy = response.status == PROXY_AUTHENTICATION_REQUIRED;
        let header = if is_proxy || request.method.eq_ignore_ascii_case("CONNECT") {
            headers::PROXY_AUTHENTICATE
        } else {
            headers::WWW_AUTHENTICATE
        };

        let challenges: Vec<String> = response
            .headers
            .get_all(header.as_str())
            .into_iter()
            .map(str::to_string)
            .collect();
        if challenges.is_empty() {
            response.add_warning("Missing Authenticate header");
            return Ok(response);
        }

        for raw in challenges {
            let challenge = match AuthChallenge::parse(&raw) {
                Ok(challenge) => challenge,
                Err(err) => {
                    warn!("{}", err);
                    response.add_warning(err.to_string());
                    continue;
                }
            };
            let Some(authenticator) = self.authenticators.get(&challenge.scheme) else {
                let err = AgentError::UnsupportedAuthScheme(challenge.scheme.clone());
                debug!("{}", err);
                response.add_warning(err.to_string());
                continue;
            };

            // the first registered scheme owns the outcome, success or not
            return authenticator
                .authenticate(
                    self,
                    is_proxy,
                    &challenge,
                    &response,
                    &request,
                    sink,
                    read_size_hint,
                )
                .await;
        }

        Ok(response)
    }
}

impl Default for UserAgent {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserAgent")
            .field("config", &self.config)
            .field("default_headers", &self.default_headers)
            .field("handlers", &self.handlers)
            .field("authenticators", &self.authenticators)
            .field("credentials", &self.credentials)
            .field("cookie_jar", &self.cookie_jar.is_some())
            .finish_non_exhaustive()
    }
}
