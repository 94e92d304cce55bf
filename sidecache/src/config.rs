//! Agent configuration.
//!
//! The current cache version is deliberately an injected value, not a
//! compile-time constant, so multiple versions can be exercised side by side
//! in tests. Configuration loads from an INI file with defaults matching the
//! shipped FishLog application.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use crate::store::{CacheVersion, RequestIdentity};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),

    /// Invalid configuration value
    #[error("invalid configuration: {section}.{key} - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        reason: String,
    },
}

/// Everything the agent needs to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    /// Tag of the current store partition.
    pub cache_version: CacheVersion,
    /// Ordered URLs warmed into the store at startup.
    pub preload_manifest: Vec<String>,
    /// URL of the last-resort offline document (must appear in the manifest).
    pub offline_fallback: String,
    /// Host-name substring classifying requests as remote-write traffic.
    pub write_endpoint_host: String,
    /// Origin used to resolve relative manifest URLs when fetching.
    pub origin: Option<String>,
    /// Root directory for the disk store.
    pub store_dir: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        let store_dir = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sidecache");

        Self {
            cache_version: CacheVersion::new("fishlog-v1"),
            preload_manifest: vec![
                "/".to_string(),
                "/index.html".to_string(),
                "https://cdn.tailwindcss.com".to_string(),
            ],
            offline_fallback: "/index.html".to_string(),
            write_endpoint_host: "script.google.com".to_string(),
            origin: None,
            store_dir,
        }
    }
}

impl AgentConfig {
    /// Load configuration from an INI file, falling back to defaults for any
    /// missing section or key. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        let mut config = Self::default();

        if let Some(cache) = ini.section(Some("cache")) {
            if let Some(version) = cache.get("version") {
                if version.trim().is_empty() {
                    return Err(ConfigError::InvalidValue {
                        section: "cache".into(),
                        key: "version".into(),
                        reason: "version tag must not be empty".into(),
                    });
                }
                config.cache_version = CacheVersion::new(version.trim());
            }
            if let Some(dir) = cache.get("store_dir") {
                config.store_dir = PathBuf::from(dir);
            }
        }

        if let Some(preload) = ini.section(Some("preload")) {
            let assets: Vec<String> = preload.get_all("asset").map(str::to_string).collect();
            if !assets.is_empty() {
                config.preload_manifest = assets;
            }
            if let Some(fallback) = preload.get("fallback") {
                config.offline_fallback = fallback.to_string();
            }
        }

        if let Some(network) = ini.section(Some("network")) {
            if let Some(host) = network.get("write_endpoint_host") {
                config.write_endpoint_host = host.to_string();
            }
            if let Some(origin) = network.get("origin") {
                config.origin = Some(origin.to_string());
            }
        }

        Ok(config)
    }

    /// Set the cache version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.cache_version = CacheVersion::new(version);
        self
    }

    /// Replace the preload manifest.
    pub fn with_preload_manifest<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preload_manifest = urls.into_iter().map(Into::into).collect();
        self
    }

    /// Set the offline fallback document URL.
    pub fn with_offline_fallback(mut self, url: impl Into<String>) -> Self {
        self.offline_fallback = url.into();
        self
    }

    /// Set the remote write endpoint host matcher.
    pub fn with_write_endpoint_host(mut self, host: impl Into<String>) -> Self {
        self.write_endpoint_host = host.into();
        self
    }

    /// Set the origin for resolving relative URLs.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Set the disk store directory.
    pub fn with_store_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.store_dir = dir.into();
        self
    }

    /// Identity of the offline fallback document.
    pub fn offline_fallback_identity(&self) -> RequestIdentity {
        RequestIdentity::get(&self.offline_fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.cache_version, CacheVersion::new("fishlog-v1"));
        assert_eq!(config.offline_fallback, "/index.html");
        assert_eq!(config.write_endpoint_host, "script.google.com");
        assert!(config.preload_manifest.contains(&"/".to_string()));
    }

    #[test]
    fn test_builder_overrides() {
        let config = AgentConfig::default()
            .with_version("fishlog-v2")
            .with_preload_manifest(["/app.html"])
            .with_offline_fallback("/app.html")
            .with_write_endpoint_host("api.example.com")
            .with_origin("https://fishlog.example")
            .with_store_dir("/tmp/store");

        assert_eq!(config.cache_version, CacheVersion::new("fishlog-v2"));
        assert_eq!(config.preload_manifest, vec!["/app.html"]);
        assert_eq!(config.offline_fallback, "/app.html");
        assert_eq!(config.write_endpoint_host, "api.example.com");
        assert_eq!(config.origin.as_deref(), Some("https://fishlog.example"));
        assert_eq!(config.store_dir, PathBuf::from("/tmp/store"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = AgentConfig::from_file(Path::new("/nonexistent/sidecache.ini")).unwrap();
        assert_eq!(config, AgentConfig::default());
    }

    #[test]
    fn test_from_file_parses_all_sections() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[cache]\n\
             version = fishlog-v3\n\
             store_dir = /var/cache/fishlog\n\
             \n\
             [preload]\n\
             asset = /\n\
             asset = /index.html\n\
             asset = /fishing trip memory.html\n\
             fallback = /fishing trip memory.html\n\
             \n\
             [network]\n\
             origin = https://fishlog.example\n\
             write_endpoint_host = script.google.com"
        )
        .unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache_version, CacheVersion::new("fishlog-v3"));
        assert_eq!(config.store_dir, PathBuf::from("/var/cache/fishlog"));
        assert_eq!(
            config.preload_manifest,
            vec!["/", "/index.html", "/fishing trip memory.html"]
        );
        assert_eq!(config.offline_fallback, "/fishing trip memory.html");
        assert_eq!(config.origin.as_deref(), Some("https://fishlog.example"));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nversion = fishlog-v9").unwrap();

        let config = AgentConfig::from_file(file.path()).unwrap();
        assert_eq!(config.cache_version, CacheVersion::new("fishlog-v9"));
        assert_eq!(config.write_endpoint_host, "script.google.com");
        assert_eq!(config.preload_manifest.len(), 3);
    }

    #[test]
    fn test_empty_version_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[cache]\nversion =  ").unwrap();

        let result = AgentConfig::from_file(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_fallback_identity() {
        let config = AgentConfig::default().with_offline_fallback("/shell.html#top");
        assert_eq!(
            config.offline_fallback_identity(),
            RequestIdentity::get("/shell.html")
        );
    }
}
