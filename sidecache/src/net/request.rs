//! Intercepted request representation.

use url::Url;

use crate::store::{Method, RequestIdentity};

/// One outgoing request captured by the interception layer.
///
/// This is transient per-interception context: it is owned by the handling
/// that created it and discarded once a response is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl InterceptedRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Convenience constructor for GET requests.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The store key for this request.
    pub fn identity(&self) -> RequestIdentity {
        RequestIdentity::new(self.method, &self.url)
    }

    /// Host of the target URL, if the URL is absolute.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
    }
}
