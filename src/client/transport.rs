//! Protocol back end that performs a single request/response exchange.
//!
//! The user agent never talks to the network itself. It hands a prepared
//! [`Request`] to a [`Transport`], together with a [`ContentSink`] telling it
//! where the response body goes. Transports must not follow redirects or
//! answer authentication challenges; that is the agent's job.

use crate::error::{AgentError, Result};
use crate::types::{Request, Response};
use async_trait::async_trait;
use bytes::BytesMut;
use futures::StreamExt;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use url::Url;

/// Callback receiving the response body chunk by chunk.
pub type ChunkCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Destination of a response body.
#[derive(Clone, Default)]
pub enum ContentSink {
    /// Keep the body in [`Response::content`].
    #[default]
    Memory,
    /// Write the body to a file; `content` stays empty.
    File(PathBuf),
    /// Feed each chunk to a callback; `content` stays empty.
    Callback(ChunkCallback),
}

impl fmt::Debug for ContentSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSink::Memory => f.write_str("Memory"),
            ContentSink::File(path) => f.debug_tuple("File").field(path).finish(),
            ContentSink::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// A single request/response exchange.
///
/// Errors are returned for failures to obtain a response at all; an HTTP
/// error status is still `Ok`. A `Transport` error message starting with a
/// three digit code (`"503 Service Unavailable"`) sets the status of the
/// response the agent synthesizes from it.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one exchange, through `proxy` when given, with the body sent to `sink`.
    async fn execute(
        &self,
        request: &Request,
        proxy: Option<&Url>,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
        timeout: Duration,
    ) -> Result<Response>;
}

/// [`Transport`] backed by `reqwest`, with redirects disabled.
///
/// One client is kept per proxy URL so connection pools are reused.
pub struct ReqwestTransport {
    client: reqwest::Client,
    proxied: Mutex<HashMap<String, reqwest::Client>>,
}

impl ReqwestTransport {
    /// Transport over a default client.
    pub fn new() -> Self {
        Self::with_client(Self::builder().build().unwrap_or_default())
    }

    /// Use a preconfigured client for direct (non-proxied) requests.
    ///
    /// The client should have redirects disabled.
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestTransport {
            client,
            proxied: Mutex::new(HashMap::new()),
        }
    }

    fn builder() -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .pool_idle_timeout(Duration::from_secs(90))
    }

    fn client_for(&self, proxy: Option<&Url>) -> Result<reqwest::Client> {
        let Some(proxy) = proxy else {
            return Ok(self.client.clone());
        };

        let mut proxied = self.proxied.lock();
        if let Some(client) = proxied.get(proxy.as_str()) {
            return Ok(client.clone());
        }
        let client = Self::builder()
            .proxy(reqwest::Proxy::all(proxy.as_str())?)
            .build()?;
        proxied.insert(proxy.to_string(), client.clone());
        Ok(client)
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("proxies", &self.proxied.lock().len())
            .finish()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: &Request,
        proxy: Option<&Url>,
        sink: &ContentSink,
        read_size_hint: Option<usize>,
        timeout: Duration,
    ) -> Result<Response> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|_| AgentError::InvalidRequest(format!("bad method '{}'", request.method)))?;
        let url = request.url()?;

        let mut builder = self.client_for(proxy)?.request(method, url).timeout(timeout);
        for (name, value) in request.headers.iter() {
            builder = builder.header(name, value);
        }
        if !request.content.is_empty() {
            builder = builder.body(request.content.clone());
        }

        let reply = builder.send().await?;

        let status = reply.status();
        let mut response = Response::new(status.as_u16());
        for (name, value) in reply.headers() {
            match value.to_str() {
                Ok(value) => {
                    response.headers.push(name.as_str(), value)?;
                }
                Err(_) => {
                    let lossy = String::from_utf8_lossy(value.as_bytes()).into_owned();
                    response.headers.push(name.as_str(), lossy)?;
                }
            }
        }

        let mut stream = reply.bytes_stream();
        match sink {
            ContentSink::Memory => {
                let mut buf = BytesMut::with_capacity(read_size_hint.unwrap_or(0));
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                response.content = buf.freeze();
            }
            ContentSink::File(path) => {
                let mut file = tokio::fs::File::create(path).await?;
                while let Some(chunk) = stream.next().await {
                    file.write_all(&chunk?).await?;
                }
                file.flush().await?;
            }
            ContentSink::Callback(callback) => {
                while let Some(chunk) = stream.next().await {
                    callback(&chunk?);
                }
            }
        }

        response.request = Some(Box::new(request.clone()));
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_debug() {
        assert_eq!(format!("{:?}", ContentSink::default()), "Memory");
        let sink = ContentSink::Callback(Arc::new(|_: &[u8]| {}));
        assert_eq!(format!("{:?}", sink), "Callback(..)");
    }

    #[test]
    fn test_proxied_clients_are_cached() {
        let transport = ReqwestTransport::new();
        let proxy = Url::parse("http://proxy.example:3128").unwrap();
        transport.client_for(Some(&proxy)).unwrap();
        transport.client_for(Some(&proxy)).unwrap();
        transport.client_for(None).unwrap();
        assert_eq!(transport.proxied.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_bad_method_is_rejected() {
        let transport = ReqwestTransport::new();
        let request = Request::new("BAD METHOD", "http://127.0.0.1:9/");
        let err = transport
            .execute(&request, None, &ContentSink::Memory, None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::InvalidRequest(_)));
    }
}
