//! Integration tests for lifecycle and control operations.
//!
//! Covers startup warming, activation-time partition pruning (including
//! tolerated deletion failures), the clear-cache control message, and a
//! version upgrade over a disk store.
//!
//! Run with: `cargo test --test lifecycle_integration`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tempfile::TempDir;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use sidecache::agent::{Agent, AgentEvent};
use sidecache::config::AgentConfig;
use sidecache::lifecycle::{HostControl, LifecycleManager, PreloadSet};
use sidecache::net::{InterceptedRequest, NetworkClient, NetworkError};
use sidecache::store::{
    BoxFuture, CacheVersion, DiskStore, MemoryStore, RequestIdentity, ResponseSnapshot, Store,
    StoreError, StoreStatsSnapshot,
};

// ============================================================================
// Mocks
// ============================================================================

/// Network client that returns one fixed snapshot for every URL.
struct FixedNetwork {
    snapshot: ResponseSnapshot,
}

impl NetworkClient for FixedNetwork {
    fn fetch(
        &self,
        _request: &InterceptedRequest,
    ) -> BoxFuture<'_, Result<ResponseSnapshot, NetworkError>> {
        let snapshot = self.snapshot.clone();
        Box::pin(async move { Ok(snapshot) })
    }
}

/// Host control recording how often the takeover primitives ran.
#[derive(Default)]
struct CountingHost {
    skip_waiting: AtomicUsize,
    claim_clients: AtomicUsize,
}

impl HostControl for CountingHost {
    fn skip_waiting(&self) -> BoxFuture<'_, ()> {
        self.skip_waiting.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }

    fn claim_clients(&self) -> BoxFuture<'_, ()> {
        self.claim_clients.fetch_add(1, Ordering::SeqCst);
        Box::pin(async {})
    }
}

/// Store wrapper that refuses to delete one particular partition.
struct StuckPartitionStore {
    inner: MemoryStore,
    stuck: CacheVersion,
}

impl Store for StuckPartitionStore {
    fn open_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<(), StoreError>> {
        self.inner.open_partition(version)
    }

    fn get(
        &self,
        version: &CacheVersion,
        identity: &RequestIdentity,
    ) -> BoxFuture<'_, Result<Option<ResponseSnapshot>, StoreError>> {
        self.inner.get(version, identity)
    }

    fn put(
        &self,
        version: &CacheVersion,
        identity: RequestIdentity,
        snapshot: ResponseSnapshot,
    ) -> BoxFuture<'_, Result<(), StoreError>> {
        self.inner.put(version, identity, snapshot)
    }

    fn delete_partition(&self, version: &CacheVersion) -> BoxFuture<'_, Result<bool, StoreError>> {
        if *version == self.stuck {
            return Box::pin(async {
                Err(StoreError::Io(std::io::Error::other("partition busy")))
            });
        }
        self.inner.delete_partition(version)
    }

    fn list_partitions(&self) -> BoxFuture<'_, Result<Vec<CacheVersion>, StoreError>> {
        self.inner.list_partitions()
    }

    fn entry_count(&self, version: &CacheVersion) -> BoxFuture<'_, Result<usize, StoreError>> {
        self.inner.entry_count(version)
    }

    fn stats(&self) -> StoreStatsSnapshot {
        self.inner.stats()
    }
}

fn shell() -> ResponseSnapshot {
    ResponseSnapshot::new(200)
        .with_header("Content-Type", "text/html")
        .with_body(b"<h1>fishlog</h1>".to_vec())
}

// ============================================================================
// Startup + activation
// ============================================================================

#[tokio::test]
async fn startup_then_activation_leaves_one_partition() {
    let store = Arc::new(MemoryStore::new());
    // Leftovers from two older deployments.
    for tag in ["fishlog-v0", "experimental"] {
        store
            .open_partition(&CacheVersion::new(tag))
            .await
            .unwrap();
    }

    let host = Arc::new(CountingHost::default());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(FixedNetwork { snapshot: shell() }),
        Arc::clone(&host) as Arc<dyn HostControl>,
        CacheVersion::new("fishlog-v1"),
    );

    let report = manager
        .startup(PreloadSet::from_urls(["/", "/index.html"]))
        .await
        .unwrap();
    assert_eq!(report.warmed, 2);
    assert_eq!(host.skip_waiting.load(Ordering::SeqCst), 1);

    let activation = manager.activate().await;
    assert_eq!(activation.removed.len(), 2);
    assert!(activation.skipped.is_empty());
    assert_eq!(host.claim_clients.load(Ordering::SeqCst), 1);

    assert_eq!(
        store.list_partitions().await.unwrap(),
        vec![CacheVersion::new("fishlog-v1")]
    );
}

#[tokio::test]
async fn activation_skips_partition_that_cannot_be_deleted() {
    let stuck = CacheVersion::new("fishlog-v0");
    let store = Arc::new(StuckPartitionStore {
        inner: MemoryStore::new(),
        stuck: stuck.clone(),
    });
    for tag in ["fishlog-v0", "fishlog-v1", "beta"] {
        store
            .open_partition(&CacheVersion::new(tag))
            .await
            .unwrap();
    }

    let host = Arc::new(CountingHost::default());
    let manager = LifecycleManager::new(
        Arc::clone(&store) as Arc<dyn Store>,
        Arc::new(FixedNetwork { snapshot: shell() }),
        Arc::clone(&host) as Arc<dyn HostControl>,
        CacheVersion::new("fishlog-v1"),
    );

    let report = manager.activate().await;

    assert_eq!(report.removed, vec![CacheVersion::new("beta")]);
    assert_eq!(report.skipped, vec![stuck.clone()]);
    // Activation still completes and claims clients.
    assert_eq!(host.claim_clients.load(Ordering::SeqCst), 1);

    // The stuck partition is left behind, not retried.
    let partitions = store.list_partitions().await.unwrap();
    assert!(partitions.contains(&stuck));
}

#[tokio::test]
async fn version_upgrade_prunes_old_disk_partition() {
    let temp = TempDir::new().unwrap();

    // First deployment: warm fishlog-v1 on disk.
    {
        let store = Arc::new(DiskStore::open(temp.path()).await.unwrap());
        let config = AgentConfig::default()
            .with_version("fishlog-v1")
            .with_preload_manifest(["/index.html"])
            .with_store_dir(temp.path());
        let agent = Agent::builder(config)
            .store(Arc::clone(&store) as Arc<dyn Store>)
            .network(Arc::new(FixedNetwork { snapshot: shell() }))
            .build()
            .unwrap();
        agent.on_startup().await.unwrap();
        agent.on_activate().await;
    }

    // Second deployment with a newer version supersedes the first.
    let store = Arc::new(DiskStore::open(temp.path()).await.unwrap());
    let config = AgentConfig::default()
        .with_version("fishlog-v2")
        .with_preload_manifest(["/index.html"])
        .with_store_dir(temp.path());
    let agent = Agent::builder(config)
        .store(Arc::clone(&store) as Arc<dyn Store>)
        .network(Arc::new(FixedNetwork { snapshot: shell() }))
        .build()
        .unwrap();

    agent.on_startup().await.unwrap();
    let report = agent.on_activate().await;

    assert_eq!(report.removed, vec![CacheVersion::new("fishlog-v1")]);
    assert_eq!(
        store.list_partitions().await.unwrap(),
        vec![CacheVersion::new("fishlog-v2")]
    );
    assert_eq!(
        store
            .entry_count(&CacheVersion::new("fishlog-v2"))
            .await
            .unwrap(),
        1
    );
}

// ============================================================================
// Control channel
// ============================================================================

#[tokio::test]
async fn clear_cache_empties_partition_and_replies_success() {
    let store = Arc::new(MemoryStore::new());
    let config = AgentConfig::default()
        .with_version("fishlog-v1")
        .with_preload_manifest(["/index.html"]);
    let agent = Arc::new(
        Agent::builder(config)
            .store(Arc::clone(&store) as Arc<dyn Store>)
            .network(Arc::new(FixedNetwork { snapshot: shell() }))
            .build()
            .unwrap(),
    );

    agent.on_startup().await.unwrap();
    let version = CacheVersion::new("fishlog-v1");
    assert_eq!(store.entry_count(&version).await.unwrap(), 1);

    let (reply_tx, reply_rx) = oneshot::channel();
    agent
        .on_control(serde_json::json!({"type": "CLEAR_CACHE"}), reply_tx)
        .await;

    assert!(reply_rx.await.unwrap().success);
    assert_eq!(store.entry_count(&version).await.unwrap(), 0);
}

#[tokio::test]
async fn unknown_control_message_is_ignored_silently() {
    let store = Arc::new(MemoryStore::new());
    let agent = Arc::new(
        Agent::builder(AgentConfig::default())
            .store(Arc::clone(&store) as Arc<dyn Store>)
            .network(Arc::new(FixedNetwork { snapshot: shell() }))
            .build()
            .unwrap(),
    );

    let (reply_tx, reply_rx) = oneshot::channel();
    agent
        .on_control(serde_json::json!({"type": "DUMP_STATE"}), reply_tx)
        .await;

    // No reply is ever sent; the channel just closes.
    assert!(reply_rx.await.is_err());
}

// ============================================================================
// Event loop
// ============================================================================

#[tokio::test]
async fn event_loop_runs_full_lifecycle() {
    let store = Arc::new(MemoryStore::new());
    let config = AgentConfig::default()
        .with_version("fishlog-v1")
        .with_preload_manifest(["/index.html"])
        .with_offline_fallback("/index.html");
    let agent = Arc::new(
        Agent::builder(config)
            .store(Arc::clone(&store) as Arc<dyn Store>)
            .network(Arc::new(FixedNetwork { snapshot: shell() }))
            .build()
            .unwrap(),
    );

    let (tx, rx) = mpsc::channel(16);
    let shutdown = CancellationToken::new();
    let loop_handle = tokio::spawn(Arc::clone(&agent).run(rx, shutdown.clone()));

    tx.send(AgentEvent::Startup).await.unwrap();
    tx.send(AgentEvent::Activate).await.unwrap();

    let (reply_tx, reply_rx) = oneshot::channel();
    tx.send(AgentEvent::Intercept {
        request: InterceptedRequest::get("/index.html"),
        reply: reply_tx,
    })
    .await
    .unwrap();

    let response = reply_rx.await.unwrap().unwrap();
    assert_eq!(response, shell());

    shutdown.cancel();
    loop_handle.await.unwrap();
}
