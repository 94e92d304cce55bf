//! Core types for the versioned response store.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Opaque tag identifying one generation of cached content.
///
/// Exactly one version is "current" at any time. Partitions tagged with any
/// other version are stale and eligible for deletion at activation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheVersion(String);

impl CacheVersion {
    /// Create a new cache version tag.
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// The raw version string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheVersion {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

/// HTTP method of an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Delete,
    Patch,
    Options,
}

impl Method {
    /// Whether this verb has side effects on the remote system.
    ///
    /// Mutating requests are never satisfied from the store.
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Delete | Self::Patch)
    }

    /// Canonical uppercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
            Self::Options => "OPTIONS",
        }
    }

    /// Parse a method name (case-insensitive). Returns `None` for verbs the
    /// agent does not intercept.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Self::Get),
            "HEAD" => Some(Self::Head),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            "OPTIONS" => Some(Self::Options),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized (method, URL) pair used as the store key.
///
/// Normalization lowercases the scheme and host of absolute URLs and strips
/// the fragment. Relative URLs (app-shell paths like `/index.html`) are kept
/// as-is minus the fragment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestIdentity {
    method: Method,
    url: String,
}

impl RequestIdentity {
    /// Create an identity from a method and a raw URL.
    pub fn new(method: Method, url: impl AsRef<str>) -> Self {
        Self {
            method,
            url: normalize_url(url.as_ref()),
        }
    }

    /// Convenience constructor for GET identities (the preload manifest and
    /// the offline fallback are always GETs).
    pub fn get(url: impl AsRef<str>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn method(&self) -> Method {
        self.method
    }

    /// The normalized URL.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

fn normalize_url(raw: &str) -> String {
    match Url::parse(raw) {
        // Url::parse already lowercases scheme and host.
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.to_string()
        }
        // Relative path: no scheme or host to normalize, just drop the fragment.
        Err(_) => raw.split('#').next().unwrap_or(raw).to_string(),
    }
}

/// Stored copy of a response: status, headers, body.
///
/// Within one partition a request identity maps to at most one snapshot;
/// writing replaces the prior snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// HTTP status code.
    pub status: u16,
    /// Response headers in arrival order.
    pub headers: Vec<(String, String)>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    /// Create a snapshot with the given status and no headers or body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the body.
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Build a JSON snapshot with a `Content-Type: application/json` header.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("Content-Type", "application/json")
            .with_body(body.to_string())
    }

    /// Whether this response is eligible for the store.
    ///
    /// Only an exact HTTP 200 is cached; anything else is passed through to
    /// the caller uncached.
    pub fn is_cacheable_success(&self) -> bool {
        self.status == 200
    }

    /// Look up a header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Store-related errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error during store operations
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot could not be encoded or decoded
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Failed to acquire the partition lock
    #[error("failed to acquire store lock")]
    Lock,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_roundtrip() {
        let version = CacheVersion::new("fishlog-v1");
        assert_eq!(version.as_str(), "fishlog-v1");
        assert_eq!(version.to_string(), "fishlog-v1");
    }

    #[test]
    fn test_method_mutating() {
        assert!(Method::Post.is_mutating());
        assert!(Method::Put.is_mutating());
        assert!(Method::Delete.is_mutating());
        assert!(Method::Patch.is_mutating());
        assert!(!Method::Get.is_mutating());
        assert!(!Method::Head.is_mutating());
        assert!(!Method::Options.is_mutating());
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("POST"), Some(Method::Post));
        assert_eq!(Method::parse("Patch"), Some(Method::Patch));
        assert_eq!(Method::parse("TRACE"), None);
    }

    #[test]
    fn test_identity_normalizes_host_case() {
        let a = RequestIdentity::get("HTTPS://CDN.Tailwindcss.COM/lib.js");
        let b = RequestIdentity::get("https://cdn.tailwindcss.com/lib.js");
        assert_eq!(a, b);
    }

    #[test]
    fn test_identity_strips_fragment() {
        let a = RequestIdentity::get("https://example.com/page#section");
        let b = RequestIdentity::get("https://example.com/page");
        assert_eq!(a, b);

        let c = RequestIdentity::get("/index.html#top");
        assert_eq!(c.url(), "/index.html");
    }

    #[test]
    fn test_identity_keeps_relative_paths() {
        let identity = RequestIdentity::get("/fishing trip memory.html");
        assert_eq!(identity.url(), "/fishing trip memory.html");
    }

    #[test]
    fn test_identity_distinguishes_methods() {
        let get = RequestIdentity::new(Method::Get, "/api");
        let post = RequestIdentity::new(Method::Post, "/api");
        assert_ne!(get, post);
    }

    #[test]
    fn test_snapshot_cacheable_only_at_200() {
        assert!(ResponseSnapshot::new(200).is_cacheable_success());
        assert!(!ResponseSnapshot::new(201).is_cacheable_success());
        assert!(!ResponseSnapshot::new(204).is_cacheable_success());
        assert!(!ResponseSnapshot::new(304).is_cacheable_success());
        assert!(!ResponseSnapshot::new(404).is_cacheable_success());
        assert!(!ResponseSnapshot::new(503).is_cacheable_success());
    }

    #[test]
    fn test_snapshot_json_constructor() {
        let snapshot = ResponseSnapshot::json(503, &serde_json::json!({"ok": false}));
        assert_eq!(snapshot.status, 503);
        assert_eq!(snapshot.header("content-type"), Some("application/json"));

        let body: serde_json::Value = serde_json::from_slice(&snapshot.body).unwrap();
        assert_eq!(body["ok"], false);
    }

    #[test]
    fn test_snapshot_serde_roundtrip() {
        let snapshot = ResponseSnapshot::new(200)
            .with_header("Content-Type", "text/html")
            .with_body(b"<html></html>".to_vec());

        let encoded = serde_json::to_vec(&snapshot).unwrap();
        let decoded: ResponseSnapshot = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(decoded, snapshot);
    }
}
