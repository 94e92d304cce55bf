//! In-memory versioned store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::store::stats::{StoreStats, StoreStatsSnapshot};
use crate::store::traits::{BoxFuture, Store};
use crate::store::types::{CacheVersion, RequestIdentity, ResponseSnapshot, StoreError};

type Partition = HashMap<RequestIdentity, ResponseSnapshot>;

/// In-memory store, one `HashMap` per partition.
///
/// Suitable for tests and for hosts that accept losing the cache on restart.
/// Lock sections are short: every operation clones data in or out under the
/// lock and releases it before returning.
#[derive(Debug, Default)]
pub struct MemoryStore {
    partitions: Arc<Mutex<HashMap<CacheVersion, Partition>>>,
    stats: Arc<StoreStats>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<CacheVersion, Partition>>, StoreError> {
        self.partitions.lock().map_err(|_| StoreError::Lock)
    }
}

impl Store for MemoryStore {
    fn open_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<(), StoreError>> {
        let version = version.clone();
        Box::pin(async move {
            self.lock()?.entry(version).or_default();
            Ok(())
        })
    }

    fn get(
        &self,
        version: &CacheVersion,
        identity: &RequestIdentity,
    ) -> BoxFuture<'_, Result<Option<ResponseSnapshot>, StoreError>> {
        let version = version.clone();
        let identity = identity.clone();
        Box::pin(async move {
            let found = self
                .lock()?
                .get(&version)
                .and_then(|partition| partition.get(&identity))
                .cloned();

            match found {
                Some(snapshot) => {
                    self.stats.record_hit();
                    Ok(Some(snapshot))
                }
                None => {
                    self.stats.record_miss();
                    Ok(None)
                }
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
            // entry() recreates the partition if a concurrent clear removed it.
            self.lock()?
                .entry(version)
                .or_default()
                .insert(identity, snapshot);
            self.stats.record_write();
            Ok(())
        })
    }

    fn delete_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<bool, StoreError>> {
        let version = version.clone();
        Box::pin(async move {
            let existed = self.lock()?.remove(&version).is_some();
            if existed {
                self.stats.record_delete();
            }
            Ok(existed)
        })
    }

    fn list_partitions(&self) -> BoxFuture<'_, Result<Vec<CacheVersion>, StoreError>> {
        Box::pin(async move {
            let mut versions: Vec<CacheVersion> = self.lock()?.keys().cloned().collect();
            versions.sort();
            Ok(versions)
        })
    }

    fn entry_count(&self, version: &CacheVersion) -> BoxFuture<'_, Result<usize, StoreError>> {
        let version = version.clone();
        Box::pin(async move {
            Ok(self
                .lock()?
                .get(&version)
                .map_or(0, |partition| partition.len()))
        })
    }

    fn stats(&self) -> StoreStatsSnapshot {
        self.stats.snapshot()
    }
}
