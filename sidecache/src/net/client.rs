//! Network client abstraction for testability.

use thiserror::Error;
use tracing::{debug, trace, warn};
use url::Url;

use crate::net::request::InterceptedRequest;
use crate::store::{BoxFuture, Method, ResponseSnapshot};

/// Network-related errors.
///
/// `Transport` means the request never produced an HTTP response (connection
/// refused, DNS failure, reset mid-body). A non-2xx status is *not* an error
/// here: the strategy engine needs the real status to decide cacheability, so
/// those come back as `Ok` snapshots.
#[derive(Debug, Clone, Error)]
pub enum NetworkError {
    /// Request failed before a complete response arrived
    #[error("network transport error: {0}")]
    Transport(String),

    /// URL could not be resolved to an absolute target
    #[error("cannot resolve request URL: {0}")]
    UnresolvableUrl(String),

    /// HTTP client construction failed
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),
}

/// Async network access behind a dyn-safe seam.
///
/// The strategy engine and lifecycle manager hold `Arc<dyn NetworkClient>`,
/// which lets tests substitute scripted clients.
pub trait NetworkClient: Send + Sync {
    /// Issue the request and capture the full response as a snapshot.
    fn fetch(
        &self,
        request: &InterceptedRequest,
    ) -> BoxFuture<'_, Result<ResponseSnapshot, NetworkError>>;
}

/// Default User-Agent for outgoing requests.
const DEFAULT_USER_AGENT: &str = concat!("sidecache/", env!("CARGO_PKG_VERSION"));

/// Real network client backed by reqwest.
///
/// Relative request URLs (app-shell paths like `/index.html`) are resolved
/// against the configured origin.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
    origin: Option<Url>,
}

impl ReqwestClient {
    /// Create a client with connection pooling tuned for many small
    /// concurrent requests.
    ///
    /// There is deliberately no request timeout: a fetch that never resolves
    /// stalls only its own request's resolution, never the agent.
    pub fn new() -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder()
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(32)
            .pool_idle_timeout(std::time::Duration::from_secs(90))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| NetworkError::ClientBuild(e.to_string()))?;

        Ok(Self {
            client,
            origin: None,
        })
    }

    /// Set the origin used to resolve relative request URLs.
    pub fn with_origin(mut self, origin: &str) -> Result<Self, NetworkError> {
        let parsed = Url::parse(origin)
            .map_err(|e| NetworkError::UnresolvableUrl(format!("{origin}: {e}")))?;
        self.origin = Some(parsed);
        Ok(self)
    }

    fn resolve_url(&self, raw: &str) -> Result<Url, NetworkError> {
        if let Ok(url) = Url::parse(raw) {
            return Ok(url);
        }

        match &self.origin {
            Some(origin) => origin
                .join(raw)
                .map_err(|e| NetworkError::UnresolvableUrl(format!("{raw}: {e}"))),
            None => Err(NetworkError::UnresolvableUrl(format!(
                "{raw}: relative URL with no origin configured"
            ))),
        }
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
        Method::Patch => reqwest::Method::PATCH,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

impl NetworkClient for ReqwestClient {
    fn fetch(
        &self,
        request: &InterceptedRequest,
    ) -> BoxFuture<'_, Result<ResponseSnapshot, NetworkError>> {
        let request = request.clone();
        Box::pin(async move {
            let url = self.resolve_url(&request.url)?;
            trace!(method = %request.method, url = %url, "network fetch starting");

            let mut builder = self.client.request(to_reqwest_method(request.method), url.clone());
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }
            if let Some(body) = request.body {
                builder = builder.body(body);
            }

            let response = match builder.send().await {
                Ok(response) => response,
                Err(e) => {
                    warn!(
                        url = %url,
                        error = %e,
                        is_connect = e.is_connect(),
                        is_request = e.is_request(),
                        "network fetch failed"
                    );
                    return Err(NetworkError::Transport(e.to_string()));
                }
            };

            let status = response.status().as_u16();
            let headers: Vec<(String, String)> = response
                .headers()
                .iter()
                .map(|(name, value)| {
                    (
                        name.to_string(),
                        String::from_utf8_lossy(value.as_bytes()).into_owned(),
                    )
                })
                .collect();

            let body = response
                .bytes()
                .await
                .map_err(|e| NetworkError::Transport(format!("failed to read body: {e}")))?;

            debug!(url = %url, status, bytes = body.len(), "network fetch complete");

            Ok(ResponseSnapshot {
                status,
                headers,
                body: body.to_vec(),
            })
        })
    }
}
