//! Disk-backed versioned store.
//!
//! Layout: one directory per partition under the store root, one JSON file
//! per entry. Each partition directory carries a `.version` marker holding
//! the raw version tag, so enumeration does not depend on the sanitized
//! directory name being reversible.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::store::stats::{StoreStats, StoreStatsSnapshot};
use crate::store::traits::{BoxFuture, Store};
use crate::store::types::{CacheVersion, RequestIdentity, ResponseSnapshot, StoreError};

const VERSION_MARKER: &str = ".version";
const ENTRY_EXTENSION: &str = "json";

/// Persistent store rooted at a single directory.
pub struct DiskStore {
    root: PathBuf,
    stats: Arc<StoreStats>,
}

impl DiskStore {
    /// Open a disk store, creating the root directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        tokio::fs::create_dir_all(&root).await?;
        debug!(root = %root.display(), "disk store opened");
        Ok(Self {
            root,
            stats: Arc::new(StoreStats::new()),
        })
    }

    /// The store root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn partition_dir(&self, version: &CacheVersion) -> PathBuf {
        self.root.join(sanitize_dir_name(version.as_str()))
    }

    fn entry_path(partition: &Path, identity: &RequestIdentity) -> PathBuf {
        let mut hasher = DefaultHasher::new();
        identity.hash(&mut hasher);
        partition.join(format!("{:016x}.{}", hasher.finish(), ENTRY_EXTENSION))
    }

    async fn ensure_partition(&self, version: &CacheVersion) -> Result<PathBuf, StoreError> {
        let dir = self.partition_dir(version);
        tokio::fs::create_dir_all(&dir).await?;

        let marker = dir.join(VERSION_MARKER);
        if !marker.exists() {
            tokio::fs::write(&marker, version.as_str()).await?;
        }
        Ok(dir)
    }
}

/// Replace path-hostile characters so any version tag maps to a valid
/// directory name.
fn sanitize_dir_name(tag: &str) -> String {
    let name: String = tag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if name.is_empty() || name.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        name
    }
}

impl Store for DiskStore {
    fn open_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<(), StoreError>> {
        let version = version.clone();
        Box::pin(async move {
            self.ensure_partition(&version).await?;
            Ok(())
        })
    }

    fn get(
        &self,
        version: &CacheVersion,
        identity: &RequestIdentity,
    ) -> BoxFuture<'_, Result<Option<ResponseSnapshot>, StoreError>> {
        let path = Self::entry_path(&self.partition_dir(version), identity);
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let snapshot: ResponseSnapshot = serde_json::from_slice(&bytes)?;
                    self.stats.record_hit();
                    Ok(Some(snapshot))
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    self.stats.record_miss();
                    Ok(None)
                }
                Err(e) => Err(StoreError::Io(e)),
            }
        })
    }

    fn put(
        &self,
        version: &CacheVersion,
        identity: RequestIdentity,
        snapshot: ResponseSnapshot,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        let version = version.clone();
        Box::pin(async move {
            // Recreates the partition if a concurrent clear removed it.
            let dir = self.ensure_partition(&version).await?;
            let path = Self::entry_path(&dir, &identity);
            let bytes = serde_json::to_vec(&snapshot)?;

            // Write atomically via temp file so readers never see a partial
            // entry.
            let temp_path = path.with_extension("tmp");
            tokio::fs::write(&temp_path, &bytes).await?;
            tokio::fs::rename(&temp_path, &path).await?;

            self.stats.record_write();
            Ok(())
        })
    }

    fn delete_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<bool, StoreError>> {
        let dir = self.partition_dir(version);
        Box::pin(async move {
            match tokio::fs::remove_dir_all(&dir).await {
                Ok(()) => {
                    self.stats.record_delete();
                    Ok(true)
                }
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StoreError::Io(e)),
            }
        })
    }

    fn list_partitions(&self) -> BoxFuture<'_, Result<Vec<CacheVersion>, StoreError>> {
        Box::pin(async move {
            let mut versions = Vec::new();
            let mut entries = tokio::fs::read_dir(&self.root).await?;

            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_dir() {
                    continue;
                }

                // Prefer the marker; fall back to the directory name for
                // partitions created by older layouts.
                let marker = entry.path().join(VERSION_MARKER);
                let tag = match tokio::fs::read_to_string(&marker).await {
                    Ok(tag) => tag,
                    Err(_) => entry.file_name().to_string_lossy().into_owned(),
                };
                versions.push(CacheVersion::new(tag));
            }

            versions.sort();
            Ok(versions)
        })
    }

    fn entry_count(&self, version: &CacheVersion) -> BoxFuture<'_, Result<usize, StoreError>> {
        let dir = self.partition_dir(version);
        Box::pin(async move {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
                Err(e) => return Err(StoreError::Io(e)),
            };

            let mut count = 0;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some(ENTRY_EXTENSION) {
                    count += 1;
                }
            }
            Ok(count)
        })
    }

    fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }
}
