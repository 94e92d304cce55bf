//! Store trait definition for dependency injection.

use std::future::Future;
use std::pin::Pin;

use crate::store::stats::StoreStatsSnapshot;
use crate::store::types::{CacheVersion, RequestIdentity, ResponseSnapshot, StoreError};

/// Boxed future type for dyn-safe async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Versioned key-value store for response snapshots.
///
/// Entries live in partitions named by a [`CacheVersion`]; lifecycle
/// operations delete whole partitions, never individual entries. All
/// operations are async because disk-backed implementations suspend on I/O.
///
/// Implementations must tolerate concurrent access: a `put` after a
/// concurrent `delete_partition` silently recreates the partition.
pub trait Store: Send + Sync {
    /// Ensure the partition for `version` exists, creating it if absent.
    fn open_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Look up a snapshot by request identity within one partition.
    fn get(
        &self,
        version: &CacheVersion,
        identity: &RequestIdentity,
    ) -> BoxFuture<'_, Result<Option<ResponseSnapshot>, StoreError>>;

    /// Store a snapshot, replacing any prior entry for the same identity.
    fn put(
        &self,
        version: &CacheVersion,
        identity: RequestIdentity,
        snapshot: ResponseSnapshot,
    ) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Delete an entire partition.
    ///
    /// Returns `true` if the partition existed.
    fn delete_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Enumerate all existing partitions.
    fn list_partitions(&self) -> BoxFuture<'_, Result<Vec<CacheVersion>, StoreError>>;

    /// Number of entries in a partition (0 if the partition is absent).
    fn entry_count(&self, version: &CacheVersion) -> BoxFuture<'_, Result<usize, StoreError>>;

    /// Access statistics.
    fn stats(&self) -> StoreStatsSnapshot;
}

/// Store implementation that never stores anything.
///
/// Always misses. Useful for exercising the pure network paths of the
/// strategy engine and for debugging cache-related issues.
#[derive(Debug, Default)]
pub struct NoOpStore;

impl NoOpStore {
    pub fn new() -> Self {
        Self
    }
}

impl Store for NoOpStore {
    fn open_partition(&self, _version: &CacheVersion) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn get(
        &self,
        _version: &CacheVersion,
        _identity: &RequestIdentity,
    ) -> BoxFuture<'_, Result<Option<ResponseSnapshot>, StoreError>> {
        Box::pin(async { Ok(None) })
    }

    fn put(
        &self,
        _version: &CacheVersion,
        _identity: RequestIdentity,
        _snapshot: ResponseSnapshot,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async { Ok(()) })
    }

    fn delete_partition(&self, _version: &CacheVersion) -> BoxFuture<'_, Result<bool, StoreError>> {
        Box::pin(async { Ok(false) })
    }

    fn list_partitions(&self) -> BoxFuture<'_, Result<Vec<CacheVersion>, StoreError>> {
        Box::pin(async { Ok(Vec::new()) })
    }

    fn entry_count(&self, _version: &CacheVersion) -> BoxFuture<'_, Result<usize, StoreError>> {
        Box::pin(async { Ok(0) })
    }

    fn stats(&self) -> StoreStatsSnapshot {
        StoreStatsSnapshot::default()
    }
}
